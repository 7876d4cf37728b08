use thiserror::Error;

/// Errors raised by the wire codec. A [`WireError`] occurring mid-connection
/// is always fatal to that connection (§7 "MalformedFrame ... close
/// connection").
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("unknown request-type {0:?}")]
    UnknownRequestType(String),

    #[error("unknown response-type {0:?}")]
    UnknownResponseType(String),

    #[error("missing required header field: {0}")]
    MissingField(&'static str),

    #[error("header field {field} has invalid value {value:?}")]
    InvalidField {
        field: &'static str,
        value: String,
    },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error(transparent)]
    MediaId(#[from] rubus_common::MediaIdError),

    #[error(transparent)]
    Decode(#[from] rubus_common::decode::DecodeError),

    #[error("body too short for declared content")]
    TruncatedBody,
}

pub type Result<T> = std::result::Result<T, WireError>;
