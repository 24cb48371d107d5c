// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines: from negotiated device modes to supervised processes
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌───────────────────┐
//! │ Capture      │ ──▶ │  Negotiation      │ ──▶ │  PipelineSpec     │
//! │ Device       │     │  - format probe   │     │  - codec/container│
//! │              │     │  - operator check │     │  - overlay filters│
//! └──────────────┘     └───────────────────┘     └─────────┬─────────┘
//!                                                          │
//!                      ┌───────────────────┐     ┌─────────▼─────────┐
//!                      │  Output file /    │ ◀── │  Supervisor       │
//!                      │  preview window   │     │  - spawn + check  │
//!                      └───────────────────┘     │  - SIGINT fan-out │
//!                                                └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`negotiation`]: Resolution and frame rate selection
//! - [`filters`]: Overlay and scale filter chains with text escaping
//! - [`spec`]: Immutable per-device pipeline descriptions
//! - [`command`]: Capture and preview command lines
//! - [`supervisor`]: Process lifecycle and coordinated shutdown

pub mod command;
pub mod filters;
pub mod negotiation;
pub mod spec;
pub mod supervisor;

pub use command::{LaunchOptions, ProcessCommand};
pub use negotiation::{Confirmation, Negotiator, VideoMode};
pub use spec::{PipelineSpec, ProcessRole, SpecBuilder};
pub use supervisor::{FailedLaunch, ProcessSupervisor, RunningProcess, ShutdownReport};
