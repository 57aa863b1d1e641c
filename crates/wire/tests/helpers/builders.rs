/// Assembles raw DNS packets for tests. Section counts are derived from the
/// records added unless overridden.
pub struct PacketBuilder {
    id: u16,
    flags: u16,
    qdcount: Option<u16>,
    ancount: Option<u16>,
    question: Vec<u8>,
    answers: Vec<Vec<u8>>,
    authorities: Vec<Vec<u8>>,
    additionals: Vec<Vec<u8>>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self {
            id: 0x1234,
            flags: 0x0100,
            qdcount: None,
            ancount: None,
            question: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn qdcount(mut self, qdcount: u16) -> Self {
        self.qdcount = Some(qdcount);
        self
    }

    pub fn ancount(mut self, ancount: u16) -> Self {
        self.ancount = Some(ancount);
        self
    }

    pub fn question(mut self, domain: &str, qtype: u16, qclass: u16) -> Self {
        self.question = encode_name(domain);
        self.question.extend_from_slice(&qtype.to_be_bytes());
        self.question.extend_from_slice(&qclass.to_be_bytes());
        self
    }

    /// Question bytes taken verbatim (name + type + class).
    pub fn raw_question(mut self, bytes: &[u8]) -> Self {
        self.question = bytes.to_vec();
        self
    }

    pub fn answer(mut self, name: &[u8], rtype: u16, class: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.answers.push(record(name, rtype, class, ttl, rdata));
        self
    }

    pub fn authority(mut self, name: &[u8], rtype: u16, class: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.authorities.push(record(name, rtype, class, ttl, rdata));
        self
    }

    pub fn additional(mut self, name: &[u8], rtype: u16, class: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.additionals.push(record(name, rtype, class, ttl, rdata));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let qdcount = self
            .qdcount
            .unwrap_or(if self.question.is_empty() { 0 } else { 1 });
        let ancount = self.ancount.unwrap_or(self.answers.len() as u16);

        let mut buf = Vec::with_capacity(512);
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&qdcount.to_be_bytes());
        buf.extend_from_slice(&ancount.to_be_bytes());
        buf.extend_from_slice(&(self.authorities.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(self.additionals.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.question);
        for rr in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            buf.extend_from_slice(rr);
        }
        buf
    }
}

pub fn encode_name(domain: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in domain.split('.') {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

fn record(name: &[u8], rtype: u16, class: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
    let mut rr = name.to_vec();
    rr.extend_from_slice(&rtype.to_be_bytes());
    rr.extend_from_slice(&class.to_be_bytes());
    rr.extend_from_slice(&ttl.to_be_bytes());
    rr.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    rr.extend_from_slice(rdata);
    rr
}
