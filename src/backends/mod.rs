// SPDX-License-Identifier: MPL-2.0

//! Device discovery and capability probing
//!
//! Everything in this layer talks to the machine through external listing
//! tools or read-only V4L2 queries and degrades to empty results instead of
//! failing:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            Session Controller            │
//! └─────────────────────┬────────────────────┘
//!                       │
//! ┌─────────────────────┴────────────────────┐
//! │              Backend Layer               │
//! │  ┌───────────────┐  ┌─────────────────┐  │
//! │  │     Audio     │  │     Camera      │  │
//! │  │ pactl/arecord │  │ v4l2-ctl, sysfs │  │
//! │  └───────┬───────┘  └────────┬────────┘  │
//! │          └──── ToolRunner ───┘           │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`audio`]: USB audio source discovery and pre-flight test
//! - [`camera`]: USB video device discovery and format probing
//! - [`runner`]: External tool invocation seam

pub mod audio;
pub mod camera;
pub mod runner;
