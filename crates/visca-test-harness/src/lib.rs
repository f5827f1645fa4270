//! visca-test-harness: Test utilities and mock transports for visca.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the session engine without requiring a real camera.

pub mod mock_serial;

pub use mock_serial::MockTransport;
