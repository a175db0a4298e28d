//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against a scripted bus controller and mock adapters. All tests run on
//! the host with no real hardware required.

mod bridge_flow_tests;
mod link_tests;
mod pump_tests;
