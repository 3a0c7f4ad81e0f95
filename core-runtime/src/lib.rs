//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the streaming engine:
//! - Logging and tracing infrastructure
//! - Bridge configuration (transports, output device, clock)
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the playback core depends on.
//! It establishes the logging conventions and event broadcasting mechanisms
//! used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
