//! # PDB 2.00 reader
//!
//! This crate reads Microsoft Program Database (PDB) files written in the version 2.00
//! container format. That format was used by VisualC++ releases from the mid 1990s and was
//! replaced by the MSF 7.00 container. The files still turn up when working with old
//! binaries, and this crate decodes what is in them.
//!
//! Reading happens in two layers. The `ms-pdb2-msf` crate handles the container: the file
//! header, the page-indexed stream directory, and stream contents. This crate interprets
//! the streams themselves: which VisualC++ release wrote the file, what the type and debug
//! information streams declare, and which streams hold symbols. See [`Pdb2`] and
//! [`Pdb2::classify_streams`].
//!
//! # References
//! * <https://llvm.org/docs/PDB/index.html>
//! * <https://github.com/microsoft/microsoft-pdb>

#![forbid(unused_must_use)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod dbi;
pub mod diag;
pub mod guid;
pub mod pdbi;
mod stream_index;
pub mod tpi;

#[cfg(test)]
mod tests;

pub use self::classify::{ClassifiedStream, StreamKind, SymbolStreamRole};
pub use self::diag::{Diag, Diags};
pub use self::stream_index::{Stream, StreamIndexU16, NIL_STREAM_INDEX};
pub use ::uuid::Uuid;
pub use ms_pdb2_msf as msf;
pub use ms_pdb2_msf::Msf2;
pub use sync_file::{RandomAccessFile, ReadAt};

use std::path::Path;

/// Allows reading the contents of a version 2.00 PDB file.
///
/// This type provides read-only access. It does not provide any means to modify a PDB file
/// or to create a new one.
pub struct Pdb2<F = RandomAccessFile> {
    msf: Msf2<F>,
}

impl Pdb2<RandomAccessFile> {
    /// Opens a PDB file and reads its stream directory.
    pub fn open(file_name: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            msf: Msf2::open(file_name)?,
        })
    }
}

impl<F: ReadAt> Pdb2<F> {
    /// Reads a PDB file from `file`, which does not need to be an actual disk file.
    ///
    /// `file_size` gives the total size of `file` in bytes.
    pub fn open_with_file(file: F, file_size: u64) -> anyhow::Result<Self> {
        Ok(Self {
            msf: Msf2::open_with_file(file, file_size)?,
        })
    }

    /// Provides access to the underlying container.
    pub fn msf(&self) -> &Msf2<F> {
        &self.msf
    }

    /// The number of streams in the stream directory.
    pub fn num_streams(&self) -> u32 {
        self.msf.num_streams()
    }
}
