use thiserror::Error;

/// Errors raised by the catalog adapters
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode document: {0}")]
    Encode(String),

    #[error("Malformed asset reference: {0}")]
    MalformedAssetRef(String),

    #[error("Asset exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub(crate) fn request(url: &str, err: reqwest::Error) -> Self {
        CatalogError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Build a `Status` error from a non-success response, consuming its body.
    pub(crate) async fn from_response(url: &str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        CatalogError::Status {
            url: url.to_string(),
            status,
            body,
        }
    }
}
