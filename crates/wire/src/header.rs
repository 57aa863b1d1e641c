//! Fixed 12-byte DNS header (RFC 1035 §4.1.1).
//!
//! ```text
//!   0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      ID                       |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |            QDCOUNT / ANCOUNT / NSCOUNT / ARCOUNT
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```

use crate::error::WireError;
use crate::types::{Opcode, Rcode};

pub const HEADER_LEN: usize = 12;

const QR: u16 = 0x8000;
const OPCODE_SHIFT: u16 = 11;
const OPCODE_MASK: u16 = 0x7800;
const AA: u16 = 0x0400;
const TC: u16 = 0x0200;
const RD: u16 = 0x0100;
const RA: u16 = 0x0080;
const Z_SHIFT: u16 = 4;
const Z_MASK: u16 = 0x0070;
const RCODE_MASK: u16 = 0x000F;

/// The packed flag word (header bytes 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u16);

impl Flags {
    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Flags(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    fn set_bit(&mut self, mask: u16, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// `true` for responses, `false` for queries.
    #[inline]
    pub fn qr(self) -> bool {
        self.0 & QR != 0
    }

    #[inline]
    pub fn set_qr(&mut self, on: bool) {
        self.set_bit(QR, on);
    }

    #[inline]
    pub fn opcode(self) -> Opcode {
        Opcode::from_u8(((self.0 & OPCODE_MASK) >> OPCODE_SHIFT) as u8)
    }

    #[inline]
    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.0 = (self.0 & !OPCODE_MASK) | ((opcode.to_u8() as u16) << OPCODE_SHIFT);
    }

    #[inline]
    pub fn aa(self) -> bool {
        self.0 & AA != 0
    }

    #[inline]
    pub fn set_aa(&mut self, on: bool) {
        self.set_bit(AA, on);
    }

    #[inline]
    pub fn tc(self) -> bool {
        self.0 & TC != 0
    }

    #[inline]
    pub fn set_tc(&mut self, on: bool) {
        self.set_bit(TC, on);
    }

    #[inline]
    pub fn rd(self) -> bool {
        self.0 & RD != 0
    }

    #[inline]
    pub fn set_rd(&mut self, on: bool) {
        self.set_bit(RD, on);
    }

    #[inline]
    pub fn ra(self) -> bool {
        self.0 & RA != 0
    }

    #[inline]
    pub fn set_ra(&mut self, on: bool) {
        self.set_bit(RA, on);
    }

    /// Reserved 3-bit field, must be zero in conforming messages.
    #[inline]
    pub fn z(self) -> u8 {
        ((self.0 & Z_MASK) >> Z_SHIFT) as u8
    }

    #[inline]
    pub fn set_z(&mut self, z: u8) {
        self.0 = (self.0 & !Z_MASK) | (((z & 0x07) as u16) << Z_SHIFT);
    }

    #[inline]
    pub fn rcode(self) -> Rcode {
        Rcode::from_u8((self.0 & RCODE_MASK) as u8)
    }

    #[inline]
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.0 = (self.0 & !RCODE_MASK) | rcode.to_u8() as u16;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    pub fn decode(buf: &[u8]) -> Result<Header, WireError> {
        let b: &[u8; HEADER_LEN] = buf
            .get(..HEADER_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or(WireError::InvalidHeader)?;

        Ok(Header {
            id: u16::from_be_bytes([b[0], b[1]]),
            flags: Flags(u16::from_be_bytes([b[2], b[3]])),
            qdcount: u16::from_be_bytes([b[4], b[5]]),
            ancount: u16::from_be_bytes([b[6], b[7]]),
            nscount: u16::from_be_bytes([b[8], b[9]]),
            arcount: u16::from_be_bytes([b[10], b[11]]),
        })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut b = [0u8; HEADER_LEN];
        b[0..2].copy_from_slice(&self.id.to_be_bytes());
        b[2..4].copy_from_slice(&self.flags.bits().to_be_bytes());
        b[4..6].copy_from_slice(&self.qdcount.to_be_bytes());
        b[6..8].copy_from_slice(&self.ancount.to_be_bytes());
        b[8..10].copy_from_slice(&self.nscount.to_be_bytes());
        b[10..12].copy_from_slice(&self.arcount.to_be_bytes());
        b
    }

    #[inline]
    pub fn append_to(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.encode());
    }
}
