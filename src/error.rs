use std::fmt::Display;

use alloy::{primitives::TxHash, transports};

/// Error returned by the RPC provider while reading chain data.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

impl<E: Display> From<transports::RpcError<E>> for ProviderError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else if msg.contains("timeout") || msg.contains("timed out") {
                    Self::Timeout
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

/// Chain object the decoder failed to retrieve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Missing {
    Transaction,
    Receipt,
    Block,
}

impl Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Missing::Transaction => "transaction",
            Missing::Receipt => "receipt",
            Missing::Block => "block",
        })
    }
}

/// Failure of a single transaction decode.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{what} not found for {hash}")]
    NotFound { what: Missing, hash: TxHash },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl<E: Display> From<transports::RpcError<E>> for DecodeError {
    fn from(value: transports::RpcError<E>) -> Self {
        Self::Provider(value.into())
    }
}

/// Failure of a single subgraph page request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("query returned errors: {0}")]
    Query(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// Raw subgraph record that can not be turned into a trade record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not an integer: {value}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Checkpoint read/write failure.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Tabular output failure.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("output io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use alloy::transports::{RpcError, TransportErrorKind};

    use super::*;

    #[test]
    fn test_provider_error_classification() {
        let err: ProviderError = RpcError::<TransportErrorKind>::NullResp.into();
        assert!(matches!(err, ProviderError::NullResp));

        let err: ProviderError =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::BackendGone).into();
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::NotFound {
            what: Missing::Receipt,
            hash: TxHash::ZERO,
        };
        assert_eq!(err.to_string(), format!("receipt not found for {}", TxHash::ZERO));
    }
}
