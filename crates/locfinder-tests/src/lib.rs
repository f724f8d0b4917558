//! End-to-end tests for the live location map
//!
//! These tests run the whole client stack against the scripted `/location`
//! server from `locfinder_client::testing`:
//! - SSE transport (`locfinder-client`)
//! - Subscription coordination and marker rendering (`locfinder-map`)
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p locfinder-tests
//! ```
//!
//! # Test Structure
//!
//! - `e2e_test.rs` - Viewport rebinding, decode failures and stream completion

// This crate only contains tests, no library code
