//! quickdns wire codec
//!
//! Parses DNS payloads into zero-copy [`Message`] views, walks resource
//! records, decompresses names and serializes messages back to bytes.
//! Nothing in this crate performs I/O or logs.
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod pool;
pub mod records;
pub mod types;
pub mod writer;

pub use error::{NameError, WireError};
pub use header::{Flags, Header, HEADER_LEN};
pub use message::{parse_message, Message, Question, QUESTION_OFFSET};
pub use name::{decode_name, encode_domain, skip_name, MAX_LABEL_LEN, MAX_NAME_LEN};
pub use pool::{MessagePool, PoolStats};
pub use records::{Records, ResourceRecord, Section};
pub use types::{Class, Opcode, Rcode, Type};
pub use writer::{append_message, append_question, append_record, RecordName};
