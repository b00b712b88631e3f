use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{run, EntrySelect, Input, Options};

mod app;

#[derive(Parser, Debug)]
#[command(version, about = "Convert ELF images or raw binaries to Intel HEX")]
pub struct Args {
    /// ELF image, or raw binary with --binary
    filename: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat the input as a raw binary loaded at ADDR
    #[arg(short, long, value_name = "ADDR", value_parser = parse_address)]
    binary: Option<u32>,

    /// Place ELF segments at their virtual instead of physical address
    #[arg(long, conflicts_with = "binary")]
    vaddr: bool,

    /// Use allocatable ELF sections instead of loadable segments
    #[arg(long, conflicts_with_all = ["binary", "vaddr"])]
    sections: bool,

    /// Entry point address
    #[arg(short, long, value_name = "ADDR", value_parser = parse_address)]
    entry: Option<u32>,

    /// Entry point from a symbol (raw or demangled name)
    #[arg(long, value_name = "NAME", conflicts_with_all = ["entry", "binary"])]
    entry_symbol: Option<String>,

    /// Entry point from the ELF header
    #[arg(long, conflicts_with_all = ["entry", "entry_symbol", "binary"])]
    elf_entry: bool,

    /// Entry point at the first section's address
    #[arg(long, conflicts_with_all = ["entry", "entry_symbol", "elf_entry"])]
    start_at_first: bool,

    /// Print an annotated record listing to stderr
    #[arg(short, long)]
    list: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_address(s: &str) -> Result<u32, String> {
    let s = s.replace('_', "");
    let (digits, radix) = if let Some(v) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (v, 16)
    } else if let Some(v) = s.strip_prefix("0o") {
        (v, 8)
    } else if let Some(v) = s.strip_prefix("0b") {
        (v, 2)
    } else {
        (s.as_str(), 10)
    };
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid address `{}`: {}", s, e))
}

impl From<Args> for Options {
    fn from(args: Args) -> Self {
        let input = match args.binary {
            Some(base) => Input::Binary { base },
            None => Input::Elf {
                use_vaddr: args.vaddr,
                sections_only: args.sections,
            },
        };
        let entry = if let Some(addr) = args.entry {
            EntrySelect::Address(addr)
        } else if let Some(name) = args.entry_symbol {
            EntrySelect::Symbol(name)
        } else if args.elf_entry {
            EntrySelect::ElfHeader
        } else if args.start_at_first {
            EntrySelect::FirstSection
        } else {
            EntrySelect::None
        };
        Options {
            path: args.filename,
            output: args.output,
            input,
            entry,
            list: args.list,
        }
    }
}

fn main() {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&args.into()) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
