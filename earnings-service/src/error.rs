use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        #[source]
        source: reqwest::Error,
        endpoint: &'static str,
    },
    #[error("{endpoint} answered with status {status}")]
    Status { status: u16, endpoint: &'static str },
    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl From<ServiceError> for reward_engine::SourceError {
    fn from(err: ServiceError) -> Self {
        use reward_engine::SourceError;
        match err {
            ServiceError::Status { status, .. } => SourceError::Status(status),
            ServiceError::Http { source, .. } if source.is_decode() => {
                SourceError::Parse(source.to_string())
            }
            ServiceError::Json(e) => SourceError::Parse(e.to_string()),
            other => SourceError::Request(other.to_string()),
        }
    }
}
