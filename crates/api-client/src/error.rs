// In crates/api-client/src/error.rs

use core_types::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: String, msg: String },
    #[error("Response is missing {0}")]
    MissingData(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Transport and provider failures make the source unavailable; payloads we
/// cannot read are malformed.
impl From<Error> for FetchError {
    fn from(error: Error) -> Self {
        match error {
            Error::ClientBuildError(_) | Error::RequestFailed(_) | Error::ApiError { .. } => {
                FetchError::Unavailable(error.to_string())
            }
            Error::DeserializationFailed(_) | Error::MissingData(_) => {
                FetchError::Malformed(error.to_string())
            }
        }
    }
}
