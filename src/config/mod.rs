//! # Configuration Module
//!
//! Configuration for the analysis endpoint and the picker.

pub mod config;

pub use config::{DEFAULT_ENDPOINT, SnapConfig};
