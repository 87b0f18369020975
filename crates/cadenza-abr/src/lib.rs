//! Buffer-based adaptive bitrate selection.
//!
//! This crate provides the BBA-2 controller and the manual quality pin.
//! Both are protocol-agnostic: they only see buffer lengths, seek state and
//! an ordered list of [`QualityLevel`]s.
//!
//! ## Features
//!
//! - **Zone-driven**: five buffer zones map buffer occupancy to a level
//! - **Dwell gating**: upgrades wait for a minimum time at the current level
//! - **Seek aware**: drops one level when a seek starts, restores it after
//! - **Manual pin**: viewer-selected level that falls back to auto after repeated stalls
//!
//! ## Example
//!
//! ```rust
//! use cadenza_abr::{Bba2Controller, Bba2Options, QualityLevel};
//! use web_time::Instant;
//!
//! let levels = vec![
//!     QualityLevel::new(0, 800_000, 640, 360),
//!     QualityLevel::new(1, 2_500_000, 1280, 720),
//!     QualityLevel::new(2, 6_000_000, 1920, 1080),
//! ];
//! let options = Bba2Options::default();
//! let start = Instant::now();
//! let mut controller = Bba2Controller::new_at(options.clone(), levels, start);
//!
//! // A full buffer asks for the top level, but upgrades wait for dwell.
//! let early = controller.update(45.0, false, start);
//! assert_eq!(early.target_level, 0);
//!
//! let decision = controller.update(45.0, false, start + options.min_dwell);
//! assert_eq!(decision.target_level, 2);
//! ```

#![forbid(unsafe_code)]

mod controller;
mod manual;
mod types;

pub use controller::{AbrDecision, AbrReason, Bba2Controller, Bba2State};
pub use manual::{DEFAULT_STALL_THRESHOLD, ManualOverride, StallVerdict};
pub use types::{AbrMode, Bba2Options, QualityLevel, Zone};
