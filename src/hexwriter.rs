use std::io::{self, Read, Write};

use tracing::{debug, trace};

use crate::error::Result;
use crate::record::{Record, MAX_DATA_LEN};

/// Something that hands out a section's bytes at most one record at a time.
pub trait ChunkSource {
    // Only the last chunk of a source may be short; 0 means exhausted.
    fn read_chunk(&mut self, buf: &mut [u8; MAX_DATA_LEN]) -> io::Result<usize>;
}

impl<R: Read> ChunkSource for R {
    fn read_chunk(&mut self, buf: &mut [u8; MAX_DATA_LEN]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPoint {
    #[default]
    None,
    Initial,
    At(u32),
}

impl From<bool> for EntryPoint {
    fn from(v: bool) -> Self {
        if v {
            EntryPoint::Initial
        } else {
            EntryPoint::None
        }
    }
}

impl From<u32> for EntryPoint {
    fn from(v: u32) -> Self {
        EntryPoint::At(v)
    }
}

impl From<Option<u32>> for EntryPoint {
    fn from(v: Option<u32>) -> Self {
        v.map_or(EntryPoint::None, EntryPoint::At)
    }
}

struct Section<'a> {
    address: u32,
    bytes: Box<dyn ChunkSource + 'a>,
}

/// Serializes sections of binary data as Intel HEX.
///
/// Sections are emitted in the order they were added; they are neither sorted
/// nor checked for overlap. Each byte source is drained exactly once.
#[derive(Default)]
pub struct HexWriter<'a> {
    sections: Vec<Section<'a>>,
    start_address: Option<u32>,
}

impl<'a> HexWriter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `EntryPoint::Initial` (or `true`) makes `address` the entry point.
    pub fn with_initial<S>(address: u32, bytes: Option<S>, start: impl Into<EntryPoint>) -> Self
    where
        S: ChunkSource + 'a,
    {
        let mut writer = Self::new();
        writer.start_address = match start.into() {
            EntryPoint::None => None,
            EntryPoint::Initial => Some(address),
            EntryPoint::At(v) => Some(v),
        };
        if let Some(bytes) = bytes {
            writer.add_section(address, bytes);
        }
        writer
    }

    pub fn add_section<S: ChunkSource + 'a>(&mut self, address: u32, bytes: S) -> &mut Self {
        self.sections.push(Section {
            address,
            bytes: Box::new(bytes),
        });
        self
    }

    pub fn set_start_address(&mut self, start: Option<u32>) -> &mut Self {
        self.start_address = start;
        self
    }

    pub fn start_address(&self) -> Option<u32> {
        self.start_address
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Output is not transactional: on error, lines already written stay in
    /// the sink.
    pub fn write<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<()> {
        self.write_with(sink, |_| {})
    }

    /// Like [`HexWriter::write`], also passing each record to `observe` right
    /// after it has been written.
    pub fn write_with<W, F>(&mut self, sink: &mut W, mut observe: F) -> Result<()>
    where
        W: Write + ?Sized,
        F: FnMut(&Record<'_>),
    {
        // High word of the last emitted address, shared across sections.
        let mut previous_address = 0u32;
        let mut buf = [0u8; MAX_DATA_LEN];
        for section in self.sections.iter_mut() {
            let mut address = section.address;
            let mut records = 0usize;
            loop {
                let n = section.bytes.read_chunk(&mut buf)?;
                if n == 0 {
                    break;
                }
                if address >> 16 != previous_address >> 16 {
                    trace!("page switch to {:#06x}", address >> 16);
                    emit(
                        sink,
                        &mut observe,
                        Record::ExtendedLinearAddress((address >> 16) as u16),
                    )?;
                }
                previous_address = address;
                emit(
                    sink,
                    &mut observe,
                    Record::Data {
                        offset: (address & 0xFFFF) as u16,
                        bytes: &buf[..n],
                    },
                )?;
                records += 1;
                address = address.wrapping_add(n as u32);
            }
            debug!(
                "section {:#010x}: {} bytes in {} records",
                section.address,
                address.wrapping_sub(section.address),
                records
            );
        }

        if let Some(start) = self.start_address {
            debug!("entry point {:#010x}", start);
            emit(sink, &mut observe, Record::StartLinearAddress(start))?;
        }
        emit(sink, &mut observe, Record::EndOfFile)?;
        sink.flush()?;
        Ok(())
    }
}

fn emit<W, F>(sink: &mut W, observe: &mut F, record: Record<'_>) -> io::Result<()>
where
    W: Write + ?Sized,
    F: FnMut(&Record<'_>),
{
    record.write_line(sink)?;
    observe(&record);
    Ok(())
}
