//! Authoring template containers with the `tar` crate.

use crate::cloud::pcd::write_pcd_binary;
use crate::cloud::{PointCloud, PointXyz};
use crate::util::{LinemodError, LinemodResult};
use std::io::Write;

/// Writes geometry and signature entries as a ustar archive.
pub struct ContainerWriter<W: Write> {
    builder: tar::Builder<W>,
}

impl<W: Write> ContainerWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            builder: tar::Builder::new(writer),
        }
    }

    /// Appends a geometry entry encoded as binary PCD.
    pub fn append_geometry(&mut self, name: &str, cloud: &PointCloud<PointXyz>) -> LinemodResult<()> {
        self.append_raw(name, &write_pcd_binary(cloud))
    }

    /// Appends a serialized signature entry.
    pub fn append_signature(&mut self, name: &str, bytes: &[u8]) -> LinemodResult<()> {
        self.append_raw(name, bytes)
    }

    /// Appends an arbitrary regular-file entry.
    pub fn append_raw(&mut self, name: &str, bytes: &[u8]) -> LinemodResult<()> {
        if bytes.is_empty() {
            return Err(LinemodError::InvalidInput("container entries must not be empty"));
        }
        let mut header = tar::Header::new_ustar();
        header.set_path(name)?;
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        self.builder.append(&header, bytes)?;
        Ok(())
    }

    /// Writes the end-of-archive marker and returns the inner writer.
    pub fn finish(self) -> LinemodResult<W> {
        Ok(self.builder.into_inner()?)
    }
}
