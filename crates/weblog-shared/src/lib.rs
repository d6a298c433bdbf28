//! # Weblog Shared
//!
//! Types shared between the API surface and its clients: request and
//! response DTOs, the page envelope, and the RFC 7807 error body.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, Paginated};
