//! Integration test crate for the Questline server.
//!
//! This crate has no library code. It only contains integration tests
//! that drive the full HTTP application in-process against an in-memory
//! database.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p questline-integration-tests
//! ```
