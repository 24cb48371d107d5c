// SPDX-License-Identifier: MPL-2.0

//! Invocation of external probing tools
//!
//! Discovery and capability probing only ever see the text a tool printed.
//! Keeping the invocation behind [`ToolRunner`] lets the parsers be fed
//! fixture text in tests.

use std::process::{Command, Stdio};
use tracing::debug;

/// Runs an external program and hands back what it printed
pub trait ToolRunner {
    /// Run `program` with `args` and return its stdout
    ///
    /// Returns `None` when the program is missing or exits unsuccessfully.
    fn run(&self, program: &str, args: &[&str]) -> Option<String>;

    /// Run `program` and report only whether it exited successfully
    fn succeeds(&self, program: &str, args: &[&str]) -> bool {
        self.run(program, args).is_some()
    }
}

/// Runs tools as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        let output = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                debug!(program, error = %e, "Tool not available");
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                program,
                ?args,
                code = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Tool exited unsuccessfully"
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Canned tool output keyed by program and arguments

    use super::ToolRunner;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FixtureRunner {
        responses: HashMap<String, String>,
        pub calls: RefCell<Vec<String>>,
    }

    impl FixtureRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, program: &str, args: &[&str], stdout: &str) -> Self {
            self.responses
                .insert(Self::key(program, args), stdout.to_string());
            self
        }

        fn key(program: &str, args: &[&str]) -> String {
            let mut key = program.to_string();
            for arg in args {
                key.push(' ');
                key.push_str(arg);
            }
            key
        }
    }

    impl ToolRunner for FixtureRunner {
        fn run(&self, program: &str, args: &[&str]) -> Option<String> {
            let key = Self::key(program, args);
            self.calls.borrow_mut().push(key.clone());
            self.responses.get(&key).cloned()
        }
    }
}
