use thiserror::Error;

/// Broad classes of [`CodecError`], used by callers that only care about
/// whether a failure came from buffer sizing, input validation, parsing or the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Bounds,
    Precondition,
    Decode,
    Signing,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("write of {len} bytes at offset {offset} exceeds buffer capacity {capacity}")]
    Bounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("declared data length {declared} does not match call data length {actual}")]
    DataLengthMismatch { declared: usize, actual: usize },

    #[error("command references result {result_id} but chain only holds {chain_len} commands")]
    ForwardReference { result_id: u16, chain_len: usize },

    #[error("value does not fit in a 32-byte field: {0}")]
    FieldOverflow(String),

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("channel creation needs either a destination address or a channel id")]
    MissingChannelTarget,

    #[error("{what} of {value} does not fit in a u16 header field")]
    HeaderOverflow { what: &'static str, value: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid address: expected 20 bytes, got {0}")]
    InvalidAddress(usize),

    #[error("truncated {what}: need {needed} bytes, got {got}")]
    Truncated {
        what: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("unknown {what} tag {tag}")]
    UnknownTag { what: &'static str, tag: u8 },

    #[error("header declares total length {declared} but message is {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("reserved byte must be zero, got {0}")]
    ReservedByte(u8),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("receipt {0} does not match its settlement data")]
    ReceiptMismatch(&'static str),

    #[error("signing failed: {0:#}")]
    Signing(#[source] anyhow::Error),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Bounds { .. } => ErrorKind::Bounds,
            CodecError::DataLengthMismatch { .. }
            | CodecError::ForwardReference { .. }
            | CodecError::FieldOverflow(_)
            | CodecError::InvalidNumber(_)
            | CodecError::MissingChannelTarget
            | CodecError::HeaderOverflow { .. }
            | CodecError::InvalidAddress(_) => ErrorKind::Precondition,
            CodecError::InvalidHex(_)
            | CodecError::Truncated { .. }
            | CodecError::UnknownTag { .. }
            | CodecError::LengthMismatch { .. }
            | CodecError::ReservedByte(_)
            | CodecError::InvalidSignature(_)
            | CodecError::ReceiptMismatch(_) => ErrorKind::Decode,
            CodecError::Signing(_) => ErrorKind::Signing,
        }
    }
}
