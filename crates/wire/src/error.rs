use crate::records::Section;
use thiserror::Error;

/// Errors produced while parsing, walking or encoding DNS messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("dns message does not have the expected header size")]
    InvalidHeader,

    #[error("dns message does not have the expected question size")]
    InvalidQuestion,

    #[error("dns message does not have the expected answer size")]
    InvalidAnswer,

    #[error("dns message has a truncated {0} section")]
    InvalidSection(Section),

    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    #[error("Failed to decode name: {0}")]
    NameDecode(#[from] NameError),
}

/// Failures of the label/pointer walk over a (possibly compressed) name.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    #[error("compression pointer loop at offset {offset}")]
    PointerLoop { offset: usize },

    #[error("compression pointer to offset {offset} is outside the message")]
    PointerOutOfRange { offset: usize },

    #[error("name runs past the end of the message")]
    Truncated,

    #[error("decoded name exceeds 255 bytes")]
    TooLong,

    #[error("reserved label type 0x{0:02x}")]
    ReservedLabelType(u8),
}
