//! Error handling.
//!
//! This module provides:
//! - The client error taxonomy (`ClientError`, `ErrorKind`)
//! - Initialization and submission errors
//! - Normalization of transport failures and HTTP error responses
//!
//! Callers above the repository client only ever see `ClientError`; status
//! codes and `reqwest` errors stop here.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, categorize_status, extract_detail};
pub use types::{ClientError, ErrorKind, InitializationError, SubmitError};
