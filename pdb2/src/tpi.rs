//! Type Information Stream (TPI)
//!
//! Layout of a Type Stream:
//!
//! * `TypeStreamHeader` - specifies lots of important parameters
//! * Type Record Data
//!
//! # References
//! * <https://llvm.org/docs/PDB/TpiStream.html>

use std::mem::size_of;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, LE, U32};

/// The header of the TPI stream, as written by version 2.00 PDB files.
#[allow(missing_docs)]
#[derive(Clone, Eq, PartialEq, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Debug)]
#[repr(C)]
pub struct TypeStreamHeader {
    pub version: U32<LE>,
    pub header_size: U32<LE>,
    /// The first type index defined by this stream.
    pub type_index_begin: U32<LE>,
    /// One past the last type index defined by this stream.
    pub type_index_end: U32<LE>,
    /// The number of bytes of type record data following the `TypeStreamHeader`.
    pub type_record_bytes: U32<LE>,
}

static_assertions::const_assert_eq!(size_of::<TypeStreamHeader>(), TPI_STREAM_HEADER_LEN);
const TPI_STREAM_HEADER_LEN: usize = 20;

/// MSVC version 6.0
pub const TPI_STREAM_VERSION_V60: u32 = 19961031;

/// Maps a TPI stream version number to the VisualC++ release that wrote it.
///
/// Returns `None` for version numbers that no known release wrote.
pub fn tpi_version_release(version: u32) -> Option<&'static str> {
    match version {
        TPI_STREAM_VERSION_V60 => Some("6.0"),
        _ => None,
    }
}

#[test]
fn test_tpi_version_release() {
    assert_eq!(tpi_version_release(TPI_STREAM_VERSION_V60), Some("6.0"));
    assert_eq!(tpi_version_release(0), None);
    assert_eq!(tpi_version_release(19990903), None);
}
