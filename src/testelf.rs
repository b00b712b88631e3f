//! Builds small little-endian ELF64 images for tests.
#![allow(dead_code)]

const EHDR_SIZE: usize = 64;
const PHDR_SIZE: usize = 56;
const SHDR_SIZE: usize = 64;
const SYM_SIZE: usize = 24;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;
const SHF_ALLOC: u64 = 2;

struct SectionSpec {
    name: String,
    kind: u32,
    flags: u64,
    addr: u64,
    data: Vec<u8>,
    link: u32,
    info: u32,
    entsize: u64,
}

#[derive(Default)]
pub struct ElfImage {
    entry: u64,
    segments: Vec<(u64, u64, Vec<u8>)>,
    sections: Vec<SectionSpec>,
    symbols: Vec<(String, u64)>,
}

impl ElfImage {
    pub fn new(entry: u64) -> Self {
        Self {
            entry,
            ..Default::default()
        }
    }

    /// A `PT_LOAD` segment with the given virtual and physical address.
    pub fn segment(mut self, vaddr: u64, paddr: u64, data: &[u8]) -> Self {
        self.segments.push((vaddr, paddr, data.to_vec()));
        self
    }

    /// An allocatable `SHT_PROGBITS` section.
    pub fn section(mut self, name: &str, addr: u64, data: &[u8]) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            kind: SHT_PROGBITS,
            flags: SHF_ALLOC,
            addr,
            data: data.to_vec(),
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    /// An allocatable `SHT_NOBITS` section of `size` bytes.
    pub fn bss(mut self, name: &str, addr: u64, size: usize) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            kind: SHT_NOBITS,
            flags: SHF_ALLOC,
            addr,
            data: vec![0; size],
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    /// A non-allocated section, e.g. debug info.
    pub fn note(mut self, name: &str, data: &[u8]) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            kind: SHT_PROGBITS,
            flags: 0,
            addr: 0,
            data: data.to_vec(),
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    pub fn symbol(mut self, name: &str, value: u64) -> Self {
        self.symbols.push((name.to_string(), value));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.symbols.is_empty() {
            let mut strtab = vec![0u8];
            let mut symtab = vec![0u8; SYM_SIZE];
            for (name, value) in &self.symbols {
                let st_name = strtab.len() as u32;
                strtab.extend_from_slice(name.as_bytes());
                strtab.push(0);
                symtab.extend_from_slice(&st_name.to_le_bytes());
                symtab.push(0x12); // global function
                symtab.push(0);
                symtab.extend_from_slice(&1u16.to_le_bytes());
                symtab.extend_from_slice(&value.to_le_bytes());
                symtab.extend_from_slice(&0u64.to_le_bytes());
            }
            // Indices are 1-based because of the null section header.
            let strtab_index = self.sections.len() as u32 + 2;
            self.sections.push(SectionSpec {
                name: ".symtab".to_string(),
                kind: SHT_SYMTAB,
                flags: 0,
                addr: 0,
                data: symtab,
                link: strtab_index,
                info: 1,
                entsize: SYM_SIZE as u64,
            });
            self.sections.push(SectionSpec {
                name: ".strtab".to_string(),
                kind: SHT_STRTAB,
                flags: 0,
                addr: 0,
                data: strtab,
                link: 0,
                info: 0,
                entsize: 0,
            });
        }

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        if !self.sections.is_empty() {
            for s in &self.sections {
                name_offsets.push(shstrtab.len() as u32);
                shstrtab.extend_from_slice(s.name.as_bytes());
                shstrtab.push(0);
            }
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(b".shstrtab\0");
        }

        let phoff = EHDR_SIZE;
        let mut out = vec![0u8; phoff + self.segments.len() * PHDR_SIZE];

        let mut phdrs = Vec::new();
        for (vaddr, paddr, data) in &self.segments {
            let offset = out.len() as u64;
            out.extend_from_slice(data);
            let mut ph = Vec::with_capacity(PHDR_SIZE);
            ph.extend_from_slice(&1u32.to_le_bytes()); // PT_LOAD
            ph.extend_from_slice(&5u32.to_le_bytes()); // R+X
            ph.extend_from_slice(&offset.to_le_bytes());
            ph.extend_from_slice(&vaddr.to_le_bytes());
            ph.extend_from_slice(&paddr.to_le_bytes());
            ph.extend_from_slice(&(data.len() as u64).to_le_bytes());
            ph.extend_from_slice(&(data.len() as u64).to_le_bytes());
            ph.extend_from_slice(&4u64.to_le_bytes());
            phdrs.push(ph);
        }
        for (i, ph) in phdrs.iter().enumerate() {
            let at = phoff + i * PHDR_SIZE;
            out[at..at + PHDR_SIZE].copy_from_slice(ph);
        }

        let mut shdrs = Vec::new();
        let shnum;
        let shstrndx;
        if self.sections.is_empty() {
            shnum = 0u16;
            shstrndx = 0u16;
        } else {
            shdrs.extend_from_slice(&[0u8; SHDR_SIZE]);
            for (s, name) in self.sections.iter().zip(&name_offsets) {
                let offset = out.len() as u64;
                if s.kind != SHT_NOBITS {
                    out.extend_from_slice(&s.data);
                }
                push_shdr(
                    &mut shdrs,
                    *name,
                    s.kind,
                    s.flags,
                    s.addr,
                    offset,
                    s.data.len() as u64,
                    s.link,
                    s.info,
                    s.entsize,
                );
            }
            let offset = out.len() as u64;
            out.extend_from_slice(&shstrtab);
            push_shdr(
                &mut shdrs,
                name_offsets[self.sections.len()],
                SHT_STRTAB,
                0,
                0,
                offset,
                shstrtab.len() as u64,
                0,
                0,
                0,
            );
            shnum = self.sections.len() as u16 + 2;
            shstrndx = shnum - 1;
        }
        while out.len() % 8 != 0 {
            out.push(0);
        }
        let shoff = if shdrs.is_empty() { 0 } else { out.len() as u64 };
        out.extend_from_slice(&shdrs);

        let mut ehdr = Vec::with_capacity(EHDR_SIZE);
        ehdr.extend_from_slice(&[0x7F, b'E', b'L', b'F', 2, 1, 1, 0]);
        ehdr.extend_from_slice(&[0; 8]);
        ehdr.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        ehdr.extend_from_slice(&0xF3u16.to_le_bytes()); // EM_RISCV
        ehdr.extend_from_slice(&1u32.to_le_bytes());
        ehdr.extend_from_slice(&self.entry.to_le_bytes());
        let phoff = if self.segments.is_empty() { 0 } else { phoff as u64 };
        ehdr.extend_from_slice(&phoff.to_le_bytes());
        ehdr.extend_from_slice(&shoff.to_le_bytes());
        ehdr.extend_from_slice(&0u32.to_le_bytes());
        ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(self.segments.len() as u16).to_le_bytes());
        ehdr.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&shnum.to_le_bytes());
        ehdr.extend_from_slice(&shstrndx.to_le_bytes());
        out[..EHDR_SIZE].copy_from_slice(&ehdr);
        out
    }
}

#[allow(clippy::too_many_arguments)]
fn push_shdr(
    out: &mut Vec<u8>,
    name: u32,
    kind: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    entsize: u64,
) {
    out.extend_from_slice(&name.to_le_bytes());
    out.extend_from_slice(&kind.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&addr.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&link.to_le_bytes());
    out.extend_from_slice(&info.to_le_bytes());
    out.extend_from_slice(&1u64.to_le_bytes());
    out.extend_from_slice(&entsize.to_le_bytes());
}
