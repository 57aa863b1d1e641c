//! Reply builders writing straight into the worker's response buffer.
//!
//! Every builder echoes the request id, opcode, RD bit and question, and
//! leaves `dst` as it found it when it returns an error.

use quickdns_wire::{
    append_question, append_record, encode_domain, Class, Header, Message, Rcode, RecordName,
    Type, WireError, HEADER_LEN,
};
use std::net::IpAddr;

const ANCOUNT_OFFSET: usize = 6;

/// Incrementally appends answer records after a reply header, keeping
/// ANCOUNT in the already written header up to date.
pub struct ResponseBuilder<'d> {
    dst: &'d mut Vec<u8>,
    start: usize,
    ancount: u16,
}

impl<'d> ResponseBuilder<'d> {
    /// Writes the reply header and the echoed question.
    pub fn new(
        dst: &'d mut Vec<u8>,
        request: &Message<'_>,
        rcode: Rcode,
        authoritative: bool,
    ) -> Result<Self, WireError> {
        let start = dst.len();
        let mut header = reply_header(&request.header, rcode);
        header.flags.set_aa(authoritative);
        header.qdcount = request.header.qdcount.min(1);
        header.append_to(dst);

        if header.qdcount != 0 {
            if let Err(e) = append_question(dst, request) {
                dst.truncate(start);
                return Err(e);
            }
        }

        Ok(Self {
            dst,
            start,
            ancount: 0,
        })
    }

    pub fn answer(
        &mut self,
        name: RecordName<'_>,
        rtype: Type,
        ttl: u32,
        rdata: &[u8],
    ) -> Result<(), WireError> {
        let ancount = self.ancount.checked_add(1).ok_or(WireError::InvalidAnswer)?;
        append_record(self.dst, name, rtype, Class::IN, ttl, rdata)?;
        self.ancount = ancount;
        let at = self.start + ANCOUNT_OFFSET;
        self.dst[at..at + 2].copy_from_slice(&ancount.to_be_bytes());
        Ok(())
    }

    /// A record for IPv4 addresses, AAAA for IPv6.
    pub fn address(&mut self, name: RecordName<'_>, addr: IpAddr, ttl: u32) -> Result<(), WireError> {
        match addr {
            IpAddr::V4(v4) => self.answer(name, Type::A, ttl, &v4.octets()),
            IpAddr::V6(v6) => self.answer(name, Type::AAAA, ttl, &v6.octets()),
        }
    }

    pub fn cname(&mut self, name: RecordName<'_>, target: &str, ttl: u32) -> Result<(), WireError> {
        let mut rdata = Vec::with_capacity(target.len() + 2);
        encode_domain(&mut rdata, target)?;
        self.answer(name, Type::CNAME, ttl, &rdata)
    }

    /// Drops everything this builder wrote.
    pub fn abort(self) {
        self.dst.truncate(self.start);
    }
}

fn reply_header(request: &Header, rcode: Rcode) -> Header {
    let mut flags = request.flags;
    flags.set_qr(true);
    flags.set_aa(false);
    flags.set_tc(false);
    flags.set_ra(false);
    flags.set_z(0);
    flags.set_rcode(rcode);
    Header {
        id: request.id,
        flags,
        qdcount: 0,
        ancount: 0,
        nscount: 0,
        arcount: 0,
    }
}

fn build<F>(
    dst: &mut Vec<u8>,
    request: &Message<'_>,
    rcode: Rcode,
    authoritative: bool,
    f: F,
) -> Result<(), WireError>
where
    F: FnOnce(&mut ResponseBuilder<'_>) -> Result<(), WireError>,
{
    let mut builder = ResponseBuilder::new(dst, request, rcode, authoritative)?;
    match f(&mut builder) {
        Ok(()) => Ok(()),
        Err(e) => {
            builder.abort();
            Err(e)
        }
    }
}

/// Header plus echoed question with `rcode` and no records.
pub fn error(dst: &mut Vec<u8>, request: &Message<'_>, rcode: Rcode) -> Result<(), WireError> {
    build(dst, request, rcode, false, |_| Ok(()))
}

/// Header-only error reply for packets whose question could not be parsed.
pub fn error_from_header(dst: &mut Vec<u8>, request: &Header, rcode: Rcode) {
    dst.reserve(HEADER_LEN);
    reply_header(request, rcode).append_to(dst);
}

/// Empty NOERROR reply with TC set, telling the client to retry over TCP.
pub fn truncated(dst: &mut Vec<u8>, request: &Message<'_>) -> Result<(), WireError> {
    let start = dst.len();
    error(dst, request, Rcode::NoError)?;
    let mut header = Header::decode(&dst[start..])?;
    header.flags.set_tc(true);
    dst[start..start + HEADER_LEN].copy_from_slice(&header.encode());
    Ok(())
}

/// Authoritative answer with one A/AAAA record per address, owned by the
/// question name.
pub fn host(
    dst: &mut Vec<u8>,
    request: &Message<'_>,
    addrs: &[IpAddr],
    ttl: u32,
) -> Result<(), WireError> {
    build(dst, request, Rcode::NoError, true, |b| {
        for addr in addrs {
            b.address(RecordName::QUESTION, *addr, ttl)?;
        }
        Ok(())
    })
}

/// Authoritative CNAME chain: the question name points at `targets[0]`,
/// which points at `targets[1]`, and so on.
pub fn cname(
    dst: &mut Vec<u8>,
    request: &Message<'_>,
    targets: &[&str],
    ttl: u32,
) -> Result<(), WireError> {
    build(dst, request, Rcode::NoError, true, |b| {
        let mut owner = RecordName::QUESTION;
        for target in targets {
            b.cname(owner, target, ttl)?;
            owner = RecordName::Domain(target);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickdns_wire::{Flags, Opcode};

    fn query(domain: &str) -> Message<'static> {
        let mut rng = fastrand::Rng::with_seed(5);
        let mut msg = Message::new();
        msg.set_question(domain, Type::A, Class::IN, &mut rng).unwrap();
        msg
    }

    #[test]
    fn test_reply_header_echoes_request_bits() {
        let request = Header {
            id: 0xCAFE,
            flags: Flags::from_bits(0x2900), // opcode 5, RD
            qdcount: 1,
            ..Header::default()
        };
        let reply = reply_header(&request, Rcode::Refused);
        assert_eq!(reply.id, 0xCAFE);
        assert!(reply.flags.qr());
        assert!(reply.flags.rd());
        assert_eq!(reply.flags.opcode(), Opcode::Update);
        assert_eq!(reply.flags.rcode(), Rcode::Refused);
        assert_eq!(reply.qdcount, 0);
    }

    #[test]
    fn test_cname_error_restores_dst() {
        let request = query("alias.example");
        let mut dst = vec![1, 2, 3];
        assert!(cname(&mut dst, &request, &["ok.example", "bad..target"], 60).is_err());
        assert_eq!(dst, vec![1, 2, 3]);
    }

    #[test]
    fn test_truncated_sets_tc_only() {
        let request = query("big.example");
        let mut dst = Vec::new();
        truncated(&mut dst, &request).unwrap();
        let header = Header::decode(&dst).unwrap();
        assert!(header.flags.tc());
        assert!(header.flags.qr());
        assert_eq!(header.flags.rcode(), Rcode::NoError);
        assert_eq!((header.qdcount, header.ancount), (1, 0));
    }
}
