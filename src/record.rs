use std::fmt;
use std::io::{self, Write};

pub const MAX_DATA_LEN: usize = 16;

pub mod types {
    pub const DATA: u8 = 0x00;
    pub const END_OF_FILE: u8 = 0x01;
    pub const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;
    pub const START_LINEAR_ADDRESS: u8 = 0x05;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    Data { offset: u16, bytes: &'a [u8] },
    ExtendedLinearAddress(u16),
    StartLinearAddress(u32),
    EndOfFile,
}

impl Record<'_> {
    pub fn record_type(&self) -> u8 {
        match self {
            Record::Data { .. } => types::DATA,
            Record::ExtendedLinearAddress(_) => types::EXTENDED_LINEAR_ADDRESS,
            Record::StartLinearAddress(_) => types::START_LINEAR_ADDRESS,
            Record::EndOfFile => types::END_OF_FILE,
        }
    }

    pub fn address(&self) -> u16 {
        match self {
            Record::Data { offset, .. } => *offset,
            _ => 0,
        }
    }

    /// Payload bytes in wire order (integers are big-endian).
    pub fn payload(&self) -> Payload<'_> {
        match self {
            Record::Data { bytes, .. } => Payload::Borrowed(bytes),
            Record::ExtendedLinearAddress(high) => Payload::Inline(high.to_be_bytes().into()),
            Record::StartLinearAddress(entry) => Payload::Inline(entry.to_be_bytes().into()),
            Record::EndOfFile => Payload::Borrowed(&[]),
        }
    }

    pub fn checksum(&self) -> u8 {
        let payload = self.payload();
        let [hi, lo] = self.address().to_be_bytes();
        let sum = payload
            .iter()
            .fold(
                (payload.len() as u8)
                    .wrapping_add(hi)
                    .wrapping_add(lo)
                    .wrapping_add(self.record_type()),
                |acc, b| acc.wrapping_add(*b),
            );
        (sum ^ 0xFF).wrapping_add(1)
    }

    pub fn write_line<W: Write + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
        writeln!(sink, "{}", self)
    }
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = self.payload();
        write!(
            f,
            ":{:02X}{:04X}{:02X}",
            payload.len(),
            self.address(),
            self.record_type()
        )?;
        for b in payload.iter() {
            write!(f, "{:02X}", b)?;
        }
        write!(f, "{:02X}", self.checksum())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Borrowed(&'a [u8]),
    Inline(InlineBytes),
}

impl std::ops::Deref for Payload<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Payload::Borrowed(b) => *b,
            Payload::Inline(b) => &b.buf[..b.len],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InlineBytes {
    buf: [u8; 4],
    len: usize,
}

impl From<[u8; 2]> for InlineBytes {
    fn from(b: [u8; 2]) -> Self {
        Self {
            buf: [b[0], b[1], 0, 0],
            len: 2,
        }
    }
}

impl From<[u8; 4]> for InlineBytes {
    fn from(buf: [u8; 4]) -> Self {
        Self { buf, len: 4 }
    }
}
