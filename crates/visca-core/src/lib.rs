//! visca-core: Core traits and error definitions for visca.
//!
//! This crate defines the link-agnostic abstractions shared by the camera
//! engine, the transports and the test harness.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;

pub use error::{Error, Result};
pub use transport::Transport;
