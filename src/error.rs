use thiserror::Error;

/// Failures while loading or validating the knowledge base file.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("failed to read knowledge base '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge base: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reserved entry '{role}' points at id {id}, which is not in the knowledge base")]
    MissingReserved { role: &'static str, id: u32 },

    #[error("knowledge base has no entries")]
    Empty,
}

/// Outbound messaging channel failure.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("send request failed: {0}")]
    Transport(String),

    #[error("send API rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for SendError {
    fn from(e: reqwest::Error) -> Self {
        SendError::Transport(e.to_string())
    }
}

/// Persistence sink failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store file '{path}' is not a JSON array: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Email notification failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address '{address}': {message}")]
    Address { address: String, message: String },

    #[error("email send failed: {0}")]
    Send(String),
}
