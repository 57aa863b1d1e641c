//! Serialization of messages and records into caller-owned buffers.
//!
//! Everything here appends to a `Vec<u8>`; callers that care about
//! allocations keep one capacity-primed buffer around and `clear()` it
//! between messages.

use crate::error::WireError;
use crate::message::{Message, QUESTION_OFFSET};
use crate::name::{encode_domain, encoded_len};
use crate::types::{Class, Type};

const MAX_POINTER_OFFSET: u16 = 0x3FFF;

/// Owner name of a record being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordName<'n> {
    /// Compression pointer to an earlier name in the same message.
    Pointer(u16),
    /// Dotted domain, encoded uncompressed.
    Domain(&'n str),
    /// Name already in wire form, copied verbatim.
    Wire(&'n [u8]),
}

impl RecordName<'_> {
    /// Pointer to the question name right after the header.
    pub const QUESTION: RecordName<'static> = RecordName::Pointer(QUESTION_OFFSET as u16);
}

/// Appends `msg` (header and, when QDCOUNT is non-zero, the question) to `dst`.
/// Nothing is written on error.
pub fn append_message(dst: &mut Vec<u8>, msg: &Message<'_>) -> Result<(), WireError> {
    let start = dst.len();
    msg.header.append_to(dst);

    if msg.header.qdcount != 0 {
        if let Err(e) = append_question(dst, msg) {
            dst.truncate(start);
            return Err(e);
        }
    }
    Ok(())
}

/// Appends the question entry of `msg` (name, QTYPE, QCLASS) to `dst`.
///
/// The name is copied from the message's raw bytes when it has one;
/// otherwise the cached domain is encoded in place.
pub fn append_question(dst: &mut Vec<u8>, msg: &Message<'_>) -> Result<(), WireError> {
    let name = msg.question_name();
    if !name.is_empty() {
        dst.extend_from_slice(name);
    } else {
        append_domain_backfill(dst, msg.domain_bytes())?;
    }
    dst.extend_from_slice(&msg.question.qtype.to_u16().to_be_bytes());
    dst.extend_from_slice(&msg.question.qclass.to_u16().to_be_bytes());
    Ok(())
}

impl Message<'_> {
    /// Method form of [`append_message`].
    #[inline]
    pub fn append_to(&self, dst: &mut Vec<u8>) -> Result<(), WireError> {
        append_message(dst, self)
    }
}

/// Writes a leading placeholder and the domain bytes, then walks backwards
/// turning every `.` (and the placeholder) into the length of the label
/// that follows it.
fn append_domain_backfill(dst: &mut Vec<u8>, domain: &[u8]) -> Result<(), WireError> {
    let text = std::str::from_utf8(domain)
        .map_err(|_| WireError::InvalidDomain("non UTF-8 domain".to_string()))?;
    encoded_len(text)?;

    let i = dst.len();
    dst.push(b'.');
    dst.extend_from_slice(domain);

    let mut n: u8 = 0;
    for k in (i..dst.len()).rev() {
        if dst[k] == b'.' {
            dst[k] = n;
            n = 0;
        } else {
            n += 1;
        }
    }
    dst.push(0);
    Ok(())
}

/// Appends one resource record. Nothing is written on error.
pub fn append_record(
    dst: &mut Vec<u8>,
    name: RecordName<'_>,
    rtype: Type,
    class: Class,
    ttl: u32,
    rdata: &[u8],
) -> Result<(), WireError> {
    let rdlength = u16::try_from(rdata.len()).map_err(|_| {
        WireError::InvalidDomain(format!("rdata of {} bytes exceeds 65535", rdata.len()))
    })?;

    match name {
        RecordName::Pointer(offset) => {
            if offset > MAX_POINTER_OFFSET {
                return Err(WireError::InvalidDomain(format!(
                    "pointer offset {} out of range",
                    offset
                )));
            }
            dst.extend_from_slice(&(0xC000 | offset).to_be_bytes());
        }
        RecordName::Domain(domain) => encode_domain(dst, domain)?,
        RecordName::Wire(wire) => dst.extend_from_slice(wire),
    }

    dst.reserve(10 + rdata.len());
    dst.extend_from_slice(&rtype.to_u16().to_be_bytes());
    dst.extend_from_slice(&class.to_u16().to_be_bytes());
    dst.extend_from_slice(&ttl.to_be_bytes());
    dst.extend_from_slice(&rdlength.to_be_bytes());
    dst.extend_from_slice(rdata);
    Ok(())
}
