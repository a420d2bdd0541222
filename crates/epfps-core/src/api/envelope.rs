use serde::{Deserialize, Serialize};

use super::ApiError;

/// `code` value of a successful envelope
pub const SUCCESS_CODE: &str = "success";

/// Generic backend envelope: `{ "code": "success", "data": ..., "error": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Success code without a payload
    EmptyPayload,
    /// Any code other than success
    Rejected { code: String, error: Option<String> },
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::EmptyPayload => write!(f, "response carried no data"),
            FetchFailure::Rejected {
                code,
                error: Some(error),
            } => write!(f, "{}: {}", code, error),
            FetchFailure::Rejected { code, error: None } => write!(f, "{}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResult<T> {
    Success(T),
    Failure(FetchFailure),
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> RemoteResult<T> {
        if self.code != SUCCESS_CODE {
            return RemoteResult::Failure(FetchFailure::Rejected {
                code: self.code,
                error: self.error,
            });
        }
        match self.data {
            Some(data) => RemoteResult::Success(data),
            None => RemoteResult::Failure(FetchFailure::EmptyPayload),
        }
    }
}

impl<T> RemoteResult<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            RemoteResult::Success(data) => Some(data),
            RemoteResult::Failure(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionTokenData {
    #[serde(default, rename = "accessToken")]
    pub access_token: Option<String>,
}

/// Body of the session verification endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionVerification {
    pub success: bool,
    #[serde(default)]
    pub data: Option<SessionTokenData>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SessionVerification {
    /// The verified access token, or the reason the session is not valid.
    pub fn into_token(self) -> Result<String, ApiError> {
        if !self.success {
            return Err(ApiError::SessionVerificationFailed(self.error));
        }
        self.data
            .and_then(|d| d.access_token)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::InvalidSessionData)
    }
}
