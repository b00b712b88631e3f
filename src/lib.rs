//! Intel HEX output for firmware images.
//!
//! [`HexWriter`] turns addressed byte streams into Intel HEX records; the
//! [`blocks`] module pulls those streams out of ELF images.

pub mod blocks;
mod error;
pub mod hexwriter;
pub mod listing;
pub mod record;

#[cfg(test)]
mod testelf;

pub use error::{Error, Result};
pub use hexwriter::{ChunkSource, EntryPoint, HexWriter};
pub use record::Record;
