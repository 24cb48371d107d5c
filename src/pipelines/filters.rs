// SPDX-License-Identifier: MPL-2.0

//! Video filter chains for capture and preview
//!
//! The capture tool takes filters as one filtergraph string. Operator text
//! ends up inside a `drawtext` option value inside that graph, so it passes
//! through two escaping levels:
//!
//! 1. option value: `\`, `'` and `:` are backslash escaped
//! 2. filtergraph: `\`, `'`, `[`, `]`, `,` and `;` are backslash escaped
//!
//! The text filter also runs with `expansion=none`, which makes `%` literal.

use crate::constants::overlay::{BOTTOM_MARGIN, FONT_SIZE, LINE_SPACING};

/// Ordered list of filters joined with `,` on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl Into<String>) {
        self.filters.push(filter.into());
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Value for the capture tool's `-vf` option
    pub fn to_arg(&self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Escape a string for use as a filter option value
pub fn escape_option_value(text: &str) -> String {
    escape_chars(text, &['\\', '\'', ':'])
}

/// Escape a filter description for embedding in a filtergraph
pub fn escape_filtergraph(text: &str) -> String {
    escape_chars(text, &['\\', '\'', '[', ']', ',', ';'])
}

/// Escape operator text for a `drawtext` `text=` value inside a filtergraph
pub fn escape_drawtext(text: &str) -> String {
    escape_filtergraph(&escape_option_value(text))
}

fn escape_chars(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Two-line overlay: operator text above a wall-clock timestamp
///
/// Both lines are horizontally centred near the bottom edge.
pub fn overlay_filters(text: &str) -> [String; 2] {
    let timestamp_y = FONT_SIZE + BOTTOM_MARGIN;
    let text_y = timestamp_y + FONT_SIZE + LINE_SPACING;
    let style = format!(
        "fontsize={}:fontcolor=white:box=1:boxcolor=black@0.5:boxborderw=4:x=(w-text_w)/2",
        FONT_SIZE
    );

    [
        format!(
            "drawtext=expansion=none:text={}:{}:y=h-{}",
            escape_drawtext(text),
            style,
            text_y
        ),
        format!("drawtext=text=%{{localtime}}:{}:y=h-{}", style, timestamp_y),
    ]
}

/// Preview downscale filter, or None when the factor leaves the size unchanged
pub fn scale_filter(factor: f64) -> Option<String> {
    if (factor - 1.0).abs() < f64::EPSILON {
        None
    } else {
        Some(format!("scale=iw*{}:ih*{}", factor, factor))
    }
}
