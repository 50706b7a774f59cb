//! Template container (LTM) reading and writing.
//!
//! A container is a ustar archive: a sequence of 512-byte headers, each
//! followed by its body padded to the next 512-byte boundary. `.pcd` entries
//! hold template geometry and `.sqmmt` entries hold serialized signatures.
//! Parsing stops at the first header that is not a non-empty regular ustar
//! file, which also covers the zero blocks that terminate an archive.
//!
//! `ContainerReader` threads an explicit byte cursor through the stream: each
//! header read advances it past the header and the padded body, and bodies
//! are read by seeking to their recorded offset.

use crate::util::{LinemodError, LinemodResult};
use std::io::{Read, Seek, SeekFrom};

mod load;
mod writer;

pub use load::{load_templates, LoadReport, LoadStatus};
pub use writer::ContainerWriter;

/// Size of an archive header and the padding unit of bodies.
pub const BLOCK_SIZE: u64 = 512;

/// Suffix of geometry entries.
pub const GEOMETRY_SUFFIX: &str = ".pcd";
/// Suffix of signature entries.
pub const SIGNATURE_SUFFIX: &str = ".sqmmt";

/// Leading bytes of the magic field; accepts both POSIX and GNU headers.
const MAGIC_RANGE: std::ops::Range<usize> = 257..262;

/// Classification of an entry by its file name suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Geometry,
    Signature,
    Other,
}

impl EntryKind {
    /// Classifies `name` by case-insensitive suffix.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(GEOMETRY_SUFFIX) {
            EntryKind::Geometry
        } else if lower.ends_with(SIGNATURE_SUFFIX) {
            EntryKind::Signature
        } else {
            EntryKind::Other
        }
    }
}

/// A validated entry header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Body length in bytes.
    pub size: u64,
    /// Absolute offset of the body.
    pub offset: u64,
}

/// Rounds `size` up to a whole number of blocks, saturating at `u64::MAX`.
pub fn padded_size(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE).saturating_mul(BLOCK_SIZE)
}

/// Validates a header block; `None` means end of stream.
fn parse_header(block: &[u8; BLOCK_SIZE as usize]) -> Option<(String, u64)> {
    if &block[MAGIC_RANGE] != b"ustar" {
        return None;
    }
    let header = tar::Header::from_byte_slice(block);
    if !header.entry_type().is_file() {
        return None;
    }
    let size = header.entry_size().ok()?;
    if size == 0 {
        return None;
    }
    let name = String::from_utf8_lossy(&header.path_bytes()).into_owned();
    Some((name, size))
}

/// Sequential reader over container entries.
pub struct ContainerReader<R> {
    reader: R,
    cursor: u64,
}

impl<R: Read + Seek> ContainerReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, cursor: 0 }
    }

    /// Offset of the next header.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Reads the next valid header, or `None` at the end of the stream.
    ///
    /// A short read, an I/O error or an invalid header all end the stream.
    pub fn next_entry(&mut self) -> Option<ContainerEntry> {
        self.reader.seek(SeekFrom::Start(self.cursor)).ok()?;
        let mut block = [0u8; BLOCK_SIZE as usize];
        self.reader.read_exact(&mut block).ok()?;
        let (name, size) = parse_header(&block)?;

        let offset = self.cursor.saturating_add(BLOCK_SIZE);
        self.cursor = offset.saturating_add(padded_size(size));
        Some(ContainerEntry {
            kind: EntryKind::from_name(&name),
            name,
            size,
            offset,
        })
    }

    /// Reads the full body of `entry`.
    ///
    /// The buffer grows with the bytes actually present, so a header that
    /// claims more data than the stream holds fails with `Io`.
    pub fn read_body(&mut self, entry: &ContainerEntry) -> LinemodResult<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut body = Vec::new();
        (&mut self.reader).take(entry.size).read_to_end(&mut body)?;
        if body.len() as u64 != entry.size {
            return Err(LinemodError::Io {
                reason: format!(
                    "entry '{}' holds {} of {} bytes",
                    entry.name,
                    body.len(),
                    entry.size
                ),
            });
        }
        Ok(body)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
