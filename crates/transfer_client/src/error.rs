use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint url '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("{url} returned an empty image payload")]
    EmptyBody { url: String },
}

impl ClientError {
    pub(crate) fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// HTTP status of the failed exchange, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status(),
            _ => None,
        }
    }
}
