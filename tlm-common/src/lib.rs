//! # TLM Common Library
//!
//! Shared code for the tier list maker binaries:
//! - Search request/response types exchanged between board and gateway
//! - Common error type
//! - TOML configuration loading
//! - Tracing bootstrap

pub mod config;
pub mod error;
pub mod logging;
pub mod media;

pub use error::{Error, Result};
pub use media::{Candidate, ErrorResponse, MediaType, SearchRequest};
