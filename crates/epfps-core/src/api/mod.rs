//! REST API client module for the EPFPS backend.
//!
//! The backend wraps payloads in JSON envelopes. They are decoded here, once,
//! into explicit result types:
//!
//! - `ApiResponse<T>` (`{code, data?, error?}`) becomes `RemoteResult<T>`
//! - `SessionVerification` (`{success, data?: {accessToken}, error?}`) becomes
//!   a token or an `ApiError`

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{ApiClient, Credentials};
pub use envelope::{ApiResponse, FetchFailure, RemoteResult, SessionVerification, SUCCESS_CODE};
pub use error::ApiError;
