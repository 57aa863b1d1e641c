//! Resource record walks over the answer, authority and additional sections.

use crate::error::WireError;
use crate::message::Message;
use crate::name::skip_name;
use crate::types::{Class, Type};
use std::fmt;
use std::ops::ControlFlow;

/// Fixed part of a resource record after its name: TYPE, CLASS, TTL, RDLENGTH.
const RR_FIXED_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Answer => "answer",
            Section::Authority => "authority",
            Section::Additional => "additional",
        }
    }

    fn error(self) -> WireError {
        match self {
            Section::Answer => WireError::InvalidAnswer,
            other => WireError::InvalidSection(other),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource record borrowed from a message. `name` is in wire form and
/// may be (or end in) a compression pointer; decode it with
/// [`Message::decode_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRecord<'m> {
    pub name: &'m [u8],
    pub rtype: Type,
    pub class: Class,
    pub ttl: u32,
    pub rdata: &'m [u8],
}

/// Iterator over the records of one section.
///
/// Yields `Err` once on the first malformed record and then stops.
pub struct Records<'m> {
    raw: &'m [u8],
    pos: usize,
    remaining: u16,
    section: Section,
}

impl<'m> Records<'m> {
    /// Offset of the next unread record; after exhausting the iterator this
    /// is the start of the following section.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_record(&mut self) -> Result<ResourceRecord<'m>, WireError> {
        let raw = self.raw;
        let name_end = skip_name(raw, self.pos).map_err(|_| self.section.error())?;

        let fixed = raw
            .get(name_end..name_end + RR_FIXED_LEN)
            .ok_or_else(|| self.section.error())?;
        let rtype = Type(u16::from_be_bytes([fixed[0], fixed[1]]));
        let class = Class(u16::from_be_bytes([fixed[2], fixed[3]]));
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;

        let rdata_start = name_end + RR_FIXED_LEN;
        let rdata = raw
            .get(rdata_start..rdata_start + rdlength)
            .ok_or_else(|| self.section.error())?;

        let record = ResourceRecord {
            name: &raw[self.pos..name_end],
            rtype,
            class,
            ttl,
            rdata,
        };
        self.pos = rdata_start + rdlength;
        Ok(record)
    }
}

impl<'m> Iterator for Records<'m> {
    type Item = Result<ResourceRecord<'m>, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.read_record() {
            Ok(record) => {
                self.remaining -= 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

impl<'a> Message<'a> {
    /// Iterates the records of `section`.
    ///
    /// The start of the authority and additional sections is found by
    /// skipping every record of the sections before them, so a truncated
    /// earlier section surfaces as an error for the later one.
    pub fn records(&self, section: Section) -> Result<Records<'_>, WireError> {
        let header = &self.header;
        let mut records = Records {
            raw: self.raw(),
            pos: self.question_end(),
            remaining: header.ancount,
            section: Section::Answer,
        };

        let preceding = [
            (Section::Answer, header.ancount),
            (Section::Authority, header.nscount),
        ];
        let skip = match section {
            Section::Answer => 0,
            Section::Authority => 1,
            Section::Additional => 2,
        };
        for &(skipped, count) in &preceding[..skip] {
            records.section = skipped;
            records.remaining = count;
            for record in records.by_ref() {
                record.map_err(|_| section.error())?;
            }
        }

        records.section = section;
        records.remaining = match section {
            Section::Answer => header.ancount,
            Section::Authority => header.nscount,
            Section::Additional => header.arcount,
        };
        Ok(records)
    }

    /// Calls `f` for each answer record in packet order until it returns
    /// `ControlFlow::Break`.
    ///
    /// A message without answers is an error here (`InvalidAnswer`), not an
    /// empty walk; check `header.ancount` first if zero answers is fine.
    pub fn visit_answers<F>(&self, f: F) -> Result<(), WireError>
    where
        F: FnMut(ResourceRecord<'_>) -> ControlFlow<()>,
    {
        if self.header.ancount == 0 {
            return Err(WireError::InvalidAnswer);
        }
        self.visit_section(Section::Answer, f)
    }

    /// Like [`Message::visit_answers`] for the authority section. An empty
    /// section visits nothing.
    pub fn visit_authorities<F>(&self, f: F) -> Result<(), WireError>
    where
        F: FnMut(ResourceRecord<'_>) -> ControlFlow<()>,
    {
        self.visit_section(Section::Authority, f)
    }

    /// Like [`Message::visit_answers`] for the additional section. An empty
    /// section visits nothing.
    pub fn visit_additionals<F>(&self, f: F) -> Result<(), WireError>
    where
        F: FnMut(ResourceRecord<'_>) -> ControlFlow<()>,
    {
        self.visit_section(Section::Additional, f)
    }

    fn visit_section<F>(&self, section: Section, mut f: F) -> Result<(), WireError>
    where
        F: FnMut(ResourceRecord<'_>) -> ControlFlow<()>,
    {
        for record in self.records(section)? {
            if f(record?).is_break() {
                break;
            }
        }
        Ok(())
    }
}
