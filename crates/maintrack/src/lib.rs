//! `maintrack` - Maintenance reporting against an asset hierarchy
//!
//! This library provides the core functionality for recording problem
//! reports against physical assets, chaining follow-up reports, gating
//! access by roles and permissions, and moving report batches in and
//! out as CSV.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod access;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use access::{AccessRule, Decision};
pub use config::Config;
pub use error::{Error, Result};
pub use import::ImportSummary;
pub use logging::init_logging;
pub use model::{Asset, Priority, ProblemType, Report, ReportUpdate, Status, User};
pub use service::Service;
pub use storage::Storage;
