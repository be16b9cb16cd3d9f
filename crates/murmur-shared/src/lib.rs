//! # Murmur Shared
//!
//! Request/response types shared between the server and its clients:
//! form payloads with explicit validation, view models, and the
//! RFC 7807 error body.

pub mod dto;
pub mod forms;
pub mod response;

pub use forms::{FieldError, FieldErrors};
pub use response::ErrorResponse;
