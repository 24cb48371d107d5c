// SPDX-License-Identifier: MPL-2.0

//! usbrig - synchronized recording from several USB cameras and a microphone
//!
//! The crate does not touch media itself. It finds USB capture devices,
//! agrees on a capture mode per camera, turns each device into an external
//! capture process and keeps those processes in step until the session ends.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Device discovery and capability probing
//! - [`pipelines`]: Negotiation, pipeline specs and process supervision
//! - [`session`]: Session state machine and operator interaction
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! // Record until the operator types "q":
//! // usbrig record --overlay "Lab A"
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use constants::RecordingMode;
pub use errors::{AppError, AppResult};
pub use session::{SessionController, SessionReport};
