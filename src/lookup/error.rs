use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("info hash must be exactly 20 bytes")]
    InvalidInfoHashLength,

    #[error("info hash must be 40 hex characters")]
    InvalidInfoHashEncoding,

    #[error("invalid node id length")]
    InvalidNodeId,
}
