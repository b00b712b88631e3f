use elf::abi::{PT_LOAD, SHF_ALLOC, SHT_NOBITS};
use elf::endian::AnyEndian;
use elf::ElfBytes;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub struct Block<'a> {
    pub addr: u32,
    pub name: String,
    pub body: &'a [u8],
}

fn narrow(what: &str, addr: u64) -> Result<u32> {
    u32::try_from(addr).map_err(|_| Error::AddressOutOfRange {
        what: what.to_string(),
        addr,
    })
}

pub fn parse(content: &[u8]) -> Result<ElfBytes<'_, AnyEndian>> {
    Ok(ElfBytes::<AnyEndian>::minimal_parse(content)?)
}

/// Loadable segments at their physical (load) address unless `use_vaddr`.
pub fn load_segments<'a>(elf: &ElfBytes<'a, AnyEndian>, use_vaddr: bool) -> Result<Vec<Block<'a>>> {
    let Some(segments) = elf.segments() else {
        return Ok(Vec::new());
    };
    let mut blocks = Vec::new();
    for (i, phdr) in segments.iter().enumerate() {
        if phdr.p_type != PT_LOAD || phdr.p_filesz == 0 {
            continue;
        }
        let addr = if use_vaddr { phdr.p_vaddr } else { phdr.p_paddr };
        let name = format!("segment{}", i);
        let addr = narrow(&name, addr)?;
        let body = elf.segment_data(&phdr)?;
        debug!("{}: {:#010x}+{:#x}", name, addr, body.len());
        blocks.push(Block { addr, name, body });
    }
    blocks.sort_by_key(|b| (b.addr, b.body.len()));
    Ok(blocks)
}

pub fn load_sections<'a>(elf: &ElfBytes<'a, AnyEndian>) -> Result<Vec<Block<'a>>> {
    let (sections, strtab) = elf.section_headers_with_strtab()?;
    let (Some(sections), Some(strtab)) = (sections, strtab) else {
        return Ok(Vec::new());
    };
    let mut blocks = Vec::new();
    for shdr in sections.iter() {
        if shdr.sh_flags & SHF_ALLOC as u64 == 0
            || shdr.sh_type == SHT_NOBITS
            || shdr.sh_size == 0
        {
            continue;
        }
        let name = strtab.get(shdr.sh_name as usize)?.to_string();
        let addr = narrow(&name, shdr.sh_addr)?;
        let (body, _) = elf.section_data(&shdr)?;
        debug!("{}: {:#010x}+{:#x}", name, addr, body.len());
        blocks.push(Block { addr, name, body });
    }
    blocks.sort_by_key(|b| (b.addr, b.body.len()));
    Ok(blocks)
}

/// Segments if the image has any loadable ones, allocatable sections otherwise.
pub fn load<'a>(elf: &ElfBytes<'a, AnyEndian>, use_vaddr: bool) -> Result<Vec<Block<'a>>> {
    let blocks = load_segments(elf, use_vaddr)?;
    if !blocks.is_empty() {
        return Ok(blocks);
    }
    info!("no loadable segments, falling back to sections");
    load_sections(elf)
}

pub fn header_entry(elf: &ElfBytes<'_, AnyEndian>) -> Result<u32> {
    narrow("entry", elf.ehdr.e_entry)
}

/// Address of the symbol called `name`, matched against both the raw and the
/// demangled (hash-less) symbol name.
pub fn resolve_symbol(elf: &ElfBytes<'_, AnyEndian>, name: &str) -> Result<u32> {
    let (symbols, strtab) = elf.symbol_table()?.ok_or(Error::NoSymbolTable)?;
    for sym in symbols.iter() {
        if sym.is_undefined() {
            continue;
        }
        let raw = strtab.get(sym.st_name as usize)?;
        if raw.is_empty() {
            continue;
        }
        if raw == name || format!("{:#}", rustc_demangle::demangle(raw)) == name {
            return narrow(raw, sym.st_value);
        }
    }
    Err(Error::SymbolNotFound(name.to_string()))
}
