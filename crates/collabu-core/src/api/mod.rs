//! REST API client module for the collabu server.
//!
//! This module provides the `ApiClient` for talking to the `/api` endpoints
//! and the `RequestPipeline` it runs every request through: bearer token
//! injection on the way out, failure classification on the way back.
//!
//! Authentication is a JWT bearer token issued by `/auth/login`. A 401 or
//! 422 from any endpoint ends the session.

pub mod client;
pub mod error;
pub mod pipeline;
pub mod response;

pub use client::{ApiClient, API_PREFIX, REQUEST_TIMEOUT_MS};
pub use error::{classify, ApiError, FailureKind};
pub use pipeline::{failure_message, RequestPipeline};
pub use response::ApiResponse;
