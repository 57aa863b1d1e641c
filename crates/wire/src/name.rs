//! Domain name encoding and (de)compression, RFC 1035 §3.1 and §4.1.4.
//!
//! Names arriving from the network are attacker-controlled: compression
//! pointers may point anywhere, including at themselves. Every walk here is
//! bounded by the 255-byte name limit, a visited set of pointer targets and
//! a hop cap, so a hostile packet costs at most a few hundred steps.

use crate::error::{NameError, WireError};
use smallvec::SmallVec;

/// Maximum encoded length of a name, terminator included.
pub const MAX_NAME_LEN: usize = 255;
/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;
/// A name of 255 bytes holds at most 127 labels, so no legitimate name
/// needs more pointer hops than that.
const MAX_POINTER_HOPS: usize = 127;

const LABEL_TYPE_MASK: u8 = 0b1100_0000;
const POINTER_TAG: u8 = 0b1100_0000;

#[inline]
fn pointer_offset(hi: u8, lo: u8) -> usize {
    (((hi & !LABEL_TYPE_MASK) as usize) << 8) | lo as usize
}

/// Length in bytes of `domain` once label-encoded, validating it on the way.
///
/// Rejects empty names, empty labels (leading, trailing or doubled dots),
/// labels over 63 bytes and names over 255 bytes.
pub fn encoded_len(domain: &str) -> Result<usize, WireError> {
    if domain.is_empty() {
        return Err(WireError::InvalidDomain("empty domain".to_string()));
    }

    let mut len = 1;
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(WireError::InvalidDomain(format!(
                "empty label in '{}'",
                domain
            )));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(WireError::InvalidDomain(format!(
                "label '{}' exceeds {} bytes",
                label, MAX_LABEL_LEN
            )));
        }
        len += label.len() + 1;
    }

    if len > MAX_NAME_LEN {
        return Err(WireError::InvalidDomain(format!(
            "'{}' exceeds {} bytes when encoded",
            domain, MAX_NAME_LEN
        )));
    }
    Ok(len)
}

/// Appends the label encoding of `domain` (e.g. `example.com` →
/// `\x07example\x03com\x00`) to `dst`. Nothing is written on error.
pub fn encode_domain(dst: &mut Vec<u8>, domain: &str) -> Result<(), WireError> {
    let len = encoded_len(domain)?;
    dst.reserve(len);
    for label in domain.split('.') {
        dst.push(label.len() as u8);
        dst.extend_from_slice(label.as_bytes());
    }
    dst.push(0);
    Ok(())
}

/// Decodes `name` into dotted text appended to `dst`, following compression
/// pointers into `raw` (the whole message).
///
/// `name` is usually a slice of `raw` itself (a record or question name) but
/// any label sequence ending in a zero byte or a pointer is accepted.
/// `dst` is left untouched on error.
pub fn decode_name(raw: &[u8], name: &[u8], dst: &mut Vec<u8>) -> Result<(), WireError> {
    let start = dst.len();
    walk_name(raw, name, start, dst).map_err(|e| {
        dst.truncate(start);
        WireError::from(e)
    })
}

fn walk_name(raw: &[u8], name: &[u8], start: usize, dst: &mut Vec<u8>) -> Result<(), NameError> {
    let mut visited: SmallVec<[usize; 8]> = SmallVec::new();
    let mut buf = name;
    let mut pos = 0usize;
    let mut wire_len = 0usize;

    loop {
        let len = *buf.get(pos).ok_or(NameError::Truncated)?;
        match len & LABEL_TYPE_MASK {
            0 if len == 0 => return Ok(()),
            0 => {
                let len = len as usize;
                let label = buf
                    .get(pos + 1..pos + 1 + len)
                    .ok_or(NameError::Truncated)?;
                // one more byte is still owed for the terminator
                wire_len += len + 1;
                if wire_len >= MAX_NAME_LEN {
                    return Err(NameError::TooLong);
                }
                if dst.len() > start {
                    dst.push(b'.');
                }
                dst.extend_from_slice(label);
                pos += 1 + len;
            }
            POINTER_TAG => {
                let lo = *buf.get(pos + 1).ok_or(NameError::Truncated)?;
                let offset = pointer_offset(len, lo);
                if offset >= raw.len() {
                    return Err(NameError::PointerOutOfRange { offset });
                }
                if visited.contains(&offset) || visited.len() >= MAX_POINTER_HOPS {
                    return Err(NameError::PointerLoop { offset });
                }
                visited.push(offset);
                buf = raw;
                pos = offset;
            }
            _ => return Err(NameError::ReservedLabelType(len)),
        }
    }
}

/// Returns the offset just past the name starting at `buf[pos]`, without
/// decoding it. A name ends either at its zero terminator or right after
/// the first compression pointer.
pub fn skip_name(buf: &[u8], mut pos: usize) -> Result<usize, NameError> {
    let mut wire_len = 0usize;
    loop {
        let len = *buf.get(pos).ok_or(NameError::Truncated)?;
        match len & LABEL_TYPE_MASK {
            0 if len == 0 => return Ok(pos + 1),
            0 => {
                let len = len as usize;
                wire_len += len + 1;
                if wire_len >= MAX_NAME_LEN {
                    return Err(NameError::TooLong);
                }
                pos += 1 + len;
            }
            POINTER_TAG => {
                if pos + 2 > buf.len() {
                    return Err(NameError::Truncated);
                }
                return Ok(pos + 2);
            }
            _ => return Err(NameError::ReservedLabelType(len)),
        }
    }
}

/// Converts an uncompressed label sequence that ends exactly at its zero
/// terminator into dotted text. Used for the question name, which cannot
/// contain pointers. Returns `None` if the labels do not line up with the
/// terminator.
pub(crate) fn labels_to_dotted(name: &[u8], dst: &mut Vec<u8>) -> Option<()> {
    let (&last, labels) = name.split_last()?;
    if last != 0 || labels.is_empty() || name.len() > MAX_NAME_LEN {
        return None;
    }

    dst.reserve(labels.len());
    let mut pos = 0usize;
    while pos < labels.len() {
        let len = labels[pos] as usize;
        if len == 0 || len > MAX_LABEL_LEN {
            return None;
        }
        let label = labels.get(pos + 1..pos + 1 + len)?;
        if pos > 0 {
            dst.push(b'.');
        }
        dst.extend_from_slice(label);
        pos += 1 + len;
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_example_com() {
        let mut buf = Vec::new();
        encode_domain(&mut buf, "example.com").unwrap();
        assert_eq!(buf, b"\x07example\x03com\x00");
    }

    #[test]
    fn test_encode_rejects_empty_labels() {
        for bad in ["", ".", "a..b", ".a", "a."] {
            let mut buf = vec![0xAA];
            assert!(
                matches!(encode_domain(&mut buf, bad), Err(WireError::InvalidDomain(_))),
                "{:?} should be rejected",
                bad
            );
            assert_eq!(buf, vec![0xAA]);
        }
    }

    #[test]
    fn test_encode_label_limit() {
        let ok = "a".repeat(63);
        let too_long = "a".repeat(64);
        assert!(encoded_len(&ok).is_ok());
        assert!(encoded_len(&too_long).is_err());
    }

    #[test]
    fn test_decode_follows_pointer_chain() {
        // offset 0: \x03com\x00, offset 5: \x07example + ptr(0)
        let raw = b"\x03com\x00\x07example\xC0\x00";
        let mut out = Vec::new();
        decode_name(raw, b"\x03www\xC0\x05", &mut out).unwrap();
        assert_eq!(out, b"www.example.com");
    }

    #[test]
    fn test_decode_self_pointer_is_loop() {
        let raw = b"\xC0\x00";
        let mut out = Vec::new();
        let err = decode_name(raw, raw, &mut out).unwrap_err();
        assert_eq!(
            err,
            WireError::NameDecode(NameError::PointerLoop { offset: 0 })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_skip_name_variants() {
        let buf = b"\x01a\x00\x01b\xC0\x00\xC0\x03";
        assert_eq!(skip_name(buf, 0), Ok(3));
        assert_eq!(skip_name(buf, 3), Ok(7));
        assert_eq!(skip_name(buf, 7), Ok(9));
        assert_eq!(skip_name(buf, 8), Err(NameError::Truncated));
        assert_eq!(skip_name(b"\x41", 0), Err(NameError::ReservedLabelType(0x41)));
    }

    #[test]
    fn test_labels_to_dotted_rejects_misaligned() {
        let mut out = Vec::new();
        assert!(labels_to_dotted(b"\x05abc\x00", &mut out).is_none());
        assert!(labels_to_dotted(b"\xC0\x0C\x00", &mut out).is_none());
        out.clear();
        assert!(labels_to_dotted(b"\x01a\x02bc\x00", &mut out).is_some());
        assert_eq!(out, b"a.bc");
    }
}
