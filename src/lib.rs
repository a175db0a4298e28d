//! CtrlBridge firmware library.
//!
//! Exposes the framing engine and the bridge logic for integration testing.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod link;
pub mod pins;
pub mod protocol;
