use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use elfhex::blocks::{self, Block};
use elfhex::listing::Listing;
use elfhex::{EntryPoint, HexWriter};
use tracing::{info, warn};

pub enum Input {
    Elf { use_vaddr: bool, sections_only: bool },
    Binary { base: u32 },
}

pub enum EntrySelect {
    None,
    Address(u32),
    Symbol(String),
    ElfHeader,
    FirstSection,
}

pub struct Options {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub input: Input,
    pub entry: EntrySelect,
    pub list: bool,
}

pub fn run(opts: &Options) -> Result<()> {
    // Input must be fully loaded and checked before the output file is created.
    let content = std::fs::read(&opts.path)
        .with_context(|| format!("reading {}", opts.path.display()))?;
    let writer = prepare(opts, &content)?;

    let mut sink: Box<dyn Write> = match &opts.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    run_inner(writer, &mut sink, opts.list)
        .with_context(|| format!("converting {}", opts.path.display()))
}

fn prepare<'a>(opts: &Options, content: &'a [u8]) -> Result<HexWriter<'a>> {
    match opts.input {
        Input::Binary { base } => {
            let entry = match &opts.entry {
                EntrySelect::None => EntryPoint::None,
                EntrySelect::Address(addr) => EntryPoint::At(*addr),
                EntrySelect::FirstSection => EntryPoint::Initial,
                EntrySelect::Symbol(_) | EntrySelect::ElfHeader => {
                    bail!("raw binaries carry no entry point information")
                }
            };
            Ok(HexWriter::with_initial(base, Some(content), entry))
        }
        Input::Elf {
            use_vaddr,
            sections_only,
        } => {
            let elf = blocks::parse(content)?;
            let sections = if sections_only {
                blocks::load_sections(&elf)?
            } else {
                blocks::load(&elf, use_vaddr)?
            };
            if sections.is_empty() {
                warn!("{} has no loadable contents", opts.path.display());
            }
            let entry = match &opts.entry {
                EntrySelect::None => EntryPoint::None,
                EntrySelect::Address(addr) => EntryPoint::At(*addr),
                EntrySelect::Symbol(name) => EntryPoint::At(blocks::resolve_symbol(&elf, name)?),
                EntrySelect::ElfHeader => EntryPoint::At(blocks::header_entry(&elf)?),
                EntrySelect::FirstSection => EntryPoint::Initial,
            };
            Ok(build_writer(sections, entry))
        }
    }
}

fn build_writer<'a>(sections: Vec<Block<'a>>, entry: EntryPoint) -> HexWriter<'a> {
    let mut iter = sections.into_iter();
    let mut writer = match iter.next() {
        Some(first) => {
            info!("{} at {:#010x}", first.name, first.addr);
            HexWriter::with_initial(first.addr, Some(first.body), entry)
        }
        None => HexWriter::with_initial(0, None::<&[u8]>, entry),
    };
    for block in iter {
        info!("{} at {:#010x}", block.name, block.addr);
        writer.add_section(block.addr, block.body);
    }
    writer
}

pub fn run_inner(
    mut writer: HexWriter<'_>,
    sink: &mut dyn Write,
    list: bool,
) -> elfhex::Result<()> {
    let sections = writer.section_count();
    let mut listing = list.then(|| Listing::new(io::stderr().lock()));
    let mut lines = 0usize;
    writer.write_with(sink, |record| {
        lines += 1;
        if let Some(listing) = listing.as_mut() {
            if let Err(e) = listing.push(record) {
                warn!("listing: {}", e);
            }
        }
    })?;
    info!("{} sections, {} records", sections, lines);
    if let Some(entry) = writer.start_address() {
        info!("entry point {:#010x}", entry);
    }
    Ok(())
}
