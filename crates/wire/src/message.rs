use crate::error::WireError;
use crate::header::{Header, HEADER_LEN};
use crate::name::{self, encode_domain};
use crate::types::{Class, Opcode, Rcode, Type};

/// Offset of the first question name: right after the fixed header.
pub const QUESTION_OFFSET: usize = HEADER_LEN;

/// The compression pointer every well-behaved server uses to refer back to
/// the question name (`0xC00C`).
const QUESTION_POINTER: [u8; 2] = [0xC0, QUESTION_OFFSET as u8];

pub(crate) const DEFAULT_RAW_CAPACITY: usize = 1024;
pub(crate) const DEFAULT_DOMAIN_CAPACITY: usize = 256;

/// Question section entry. The name is kept as a range into the message's
/// raw bytes, never as separate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Question {
    name_start: usize,
    name_len: usize,
    end: usize,
    pub qtype: Type,
    pub qclass: Class,
}

/// A DNS message either parsed from the network or built for sending.
///
/// The raw bytes are either borrowed from the caller (zero-copy parse) or
/// held in an owned buffer (copying parse, outgoing queries). The owned
/// buffers keep their capacity across [`crate::MessagePool`] recycles.
#[derive(Debug, Clone)]
pub struct Message<'a> {
    buf: Vec<u8>,
    borrowed: Option<&'a [u8]>,
    domain: Vec<u8>,
    pub header: Header,
    pub question: Question,
}

impl Default for Message<'_> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RAW_CAPACITY, DEFAULT_DOMAIN_CAPACITY)
    }
}

impl<'a> Message<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(raw: usize, domain: usize) -> Self {
        Self {
            buf: Vec::with_capacity(raw),
            borrowed: None,
            domain: Vec::with_capacity(domain),
            header: Header::default(),
            question: Question::default(),
        }
    }

    /// Clears lengths but keeps the allocated capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.borrowed = None;
        self.domain.clear();
        self.header = Header::default();
        self.question = Question::default();
    }

    /// Drops the borrowed view (if any) so the message no longer depends on
    /// the caller's buffer. Owned buffers and their capacity are kept.
    pub fn detach(mut self) -> Message<'static> {
        if self.borrowed.take().is_some() {
            self.question = Question::default();
        }
        Message {
            buf: self.buf,
            borrowed: None,
            domain: self.domain,
            header: self.header,
            question: self.question,
        }
    }

    /// The packet bytes this message was parsed from or built into.
    #[inline]
    pub fn raw(&self) -> &[u8] {
        match self.borrowed {
            Some(raw) => raw,
            None => &self.buf,
        }
    }

    #[inline]
    pub fn is_borrowed(&self) -> bool {
        self.borrowed.is_some()
    }

    /// Label-encoded question name as it appears in [`Message::raw`].
    #[inline]
    pub fn question_name(&self) -> &[u8] {
        let start = self.question.name_start;
        self.raw()
            .get(start..start + self.question.name_len)
            .unwrap_or_default()
    }

    /// Normalized question domain, e.g. `"example.com"`. Empty if the name
    /// is not valid UTF-8; use [`Message::domain_bytes`] for the raw form.
    #[inline]
    pub fn domain(&self) -> &str {
        std::str::from_utf8(&self.domain).unwrap_or_default()
    }

    #[inline]
    pub fn domain_bytes(&self) -> &[u8] {
        &self.domain
    }

    /// Replaces the question domain.
    ///
    /// The view into the raw question name is dropped, so
    /// [`Message::question_name`] comes back empty and serializing encodes
    /// this domain on the fly. The raw bytes and [`Message::question_end`]
    /// are unchanged.
    pub fn set_domain(&mut self, domain: &str) {
        self.domain.clear();
        self.domain.extend_from_slice(domain.as_bytes());
        self.question.name_start = 0;
        self.question.name_len = 0;
    }

    /// Offset just past the question section (or the header if there is none).
    #[inline]
    pub fn question_end(&self) -> usize {
        if self.header.qdcount == 0 || self.question.end == 0 {
            return HEADER_LEN;
        }
        self.question.end
    }

    /// Parses `payload` into `self`.
    ///
    /// With `copy` set the payload is first copied into the message's own
    /// buffer and every view refers to that copy; otherwise the message
    /// borrows `payload` directly and must not outlive it.
    ///
    /// `payload` stays borrowed for `'a` in both modes. Callers that want to
    /// reuse the buffer while the message lives should call
    /// [`Message::parse_copied`] instead.
    pub fn parse(&mut self, payload: &'a [u8], copy: bool) -> Result<(), WireError> {
        if copy {
            self.parse_copied(payload)
        } else {
            self.parse_borrowed(payload)
        }
    }

    /// Zero-copy parse: views alias `payload`.
    pub fn parse_borrowed(&mut self, payload: &'a [u8]) -> Result<(), WireError> {
        self.buf.clear();
        self.borrowed = Some(payload);
        self.parse_raw()
    }

    /// Copying parse: `payload` may be reused as soon as this returns.
    pub fn parse_copied(&mut self, payload: &[u8]) -> Result<(), WireError> {
        self.borrowed = None;
        self.buf.clear();
        self.buf.extend_from_slice(payload);
        self.parse_raw()
    }

    fn parse_raw(&mut self) -> Result<(), WireError> {
        self.domain.clear();
        self.question = Question::default();

        let raw = match self.borrowed {
            Some(raw) => raw,
            None => self.buf.as_slice(),
        };

        self.header = Header::decode(raw)?;
        if self.header.qdcount != 1 {
            return Err(WireError::InvalidHeader);
        }

        // QNAME: up to and including the first zero byte
        let rest = &raw[HEADER_LEN..];
        let terminator = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(WireError::InvalidQuestion)?;
        if terminator == 0 || terminator + 5 > rest.len() {
            return Err(WireError::InvalidQuestion);
        }
        let name = &rest[..=terminator];

        // QTYPE, QCLASS
        let tail = &rest[terminator + 1..terminator + 5];
        let qtype = Type(u16::from_be_bytes([tail[0], tail[1]]));
        let qclass = Class(u16::from_be_bytes([tail[2], tail[3]]));

        if name::labels_to_dotted(name, &mut self.domain).is_none() {
            self.domain.clear();
            return Err(WireError::InvalidQuestion);
        }

        self.question = Question {
            name_start: QUESTION_OFFSET,
            name_len: name.len(),
            end: HEADER_LEN + terminator + 5,
            qtype,
            qclass,
        };
        Ok(())
    }

    /// Decodes a (possibly compressed) name found in this message, appending
    /// the dotted text to `dst`.
    ///
    /// A bare pointer to the question name is answered from the cached
    /// domain instead of walking the packet again.
    pub fn decode_name(&self, dst: &mut Vec<u8>, name: &[u8]) -> Result<(), WireError> {
        if name == QUESTION_POINTER && self.question.name_len != 0 {
            dst.extend_from_slice(&self.domain);
            return Ok(());
        }
        name::decode_name(self.raw(), name, dst)
    }

    /// Convenience wrapper around [`Message::decode_name`] returning a `String`.
    pub fn decode_name_to_string(&self, name: &[u8]) -> Result<String, WireError> {
        let mut out = Vec::with_capacity(DEFAULT_DOMAIN_CAPACITY);
        self.decode_name(&mut out, name)?;
        String::from_utf8(out)
            .map_err(|e| WireError::InvalidDomain(format!("non UTF-8 name: {}", e)))
    }

    /// Turns this message into a fresh recursive query for `domain`.
    ///
    /// The transaction id is drawn from `rng`; QR, Opcode, AA, TC, RA, Z and
    /// RCODE are cleared and RD is set. On error the message is left reset.
    pub fn set_question(
        &mut self,
        domain: &str,
        qtype: Type,
        qclass: Class,
        rng: &mut fastrand::Rng,
    ) -> Result<(), WireError> {
        let mut flags = self.header.flags;
        flags.set_qr(false);
        flags.set_opcode(Opcode::Query);
        flags.set_aa(false);
        flags.set_tc(false);
        flags.set_rd(true);
        flags.set_ra(false);
        flags.set_z(0);
        flags.set_rcode(Rcode::NoError);

        self.reset();
        self.header = Header {
            id: rng.u16(..),
            flags,
            qdcount: 1,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        };

        self.header.append_to(&mut self.buf);
        if let Err(e) = encode_domain(&mut self.buf, domain) {
            self.reset();
            return Err(e);
        }
        let name_len = self.buf.len() - HEADER_LEN;
        self.buf.extend_from_slice(&qtype.to_u16().to_be_bytes());
        self.buf.extend_from_slice(&qclass.to_u16().to_be_bytes());

        self.question = Question {
            name_start: QUESTION_OFFSET,
            name_len,
            end: self.buf.len(),
            qtype,
            qclass,
        };
        self.domain.extend_from_slice(domain.as_bytes());
        Ok(())
    }
}

/// Free-function form of [`Message::parse`]; copy-mode callers that reuse
/// `payload` want [`Message::parse_copied`].
#[inline]
pub fn parse_message<'a>(
    dst: &mut Message<'a>,
    payload: &'a [u8],
    copy: bool,
) -> Result<(), WireError> {
    dst.parse(payload, copy)
}
