//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileTransport` reads local files with `tokio::fs`
//! - `HttpTransport` streams remote URLs with `reqwest`
//! - `CacheDirectory` persists acquired bytes, one file per source
//! - `CpalOutputDevice` plays through the host audio API (feature `cpal-output`)
//!
//! ## Feature Flags
//!
//! - `cpal-output`: Enable the cpal-backed output device
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{CacheDirectory, FileTransport, HttpTransport};
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .transport(Arc::new(FileTransport::new()))
//!     .transport(Arc::new(HttpTransport::new()?))
//!     .cache_store(Arc::new(CacheDirectory::new()))
//!     .output_device(device)
//!     .build()?;
//! ```

mod cache;
mod filesystem;
mod http;

#[cfg(feature = "cpal-output")]
mod output;

pub use cache::{CacheDirectory, CacheFileWriter};
pub use filesystem::FileTransport;
pub use http::HttpTransport;

#[cfg(feature = "cpal-output")]
pub use output::{CpalOutputDevice, CpalOutputStream};
