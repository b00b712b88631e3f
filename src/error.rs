use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ELF image: {0}")]
    Elf(#[from] elf::ParseError),
    #[error("{what} address {addr:#x} does not fit in 32 bits")]
    AddressOutOfRange { what: String, addr: u64 },
    #[error("symbol `{0}` not found")]
    SymbolNotFound(String),
    #[error("image has no symbol table")]
    NoSymbolTable,
}

pub type Result<T> = std::result::Result<T, Error>;
