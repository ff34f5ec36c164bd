//! Debug Information (DBI) Stream
//!
//! # References
//! * <https://llvm.org/docs/PDB/DbiStream.html>

use crate::stream_index::StreamIndexU16;
use std::mem::size_of;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, LE, U16, U32};

/// The header of the DBI stream, as written by VisualC++ 4.1 and later.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Debug, Clone)]
#[repr(C)]
pub struct DbiStreamHeader {
    /// Always [`DBI_STREAM_SIGNATURE`].
    pub signature: U32<LE>,

    /// One of the `DBI_STREAM_VERSION_*` values.
    pub version: U32<LE>,

    /// The number of times this PDB has been modified. This value must match the same field
    /// within the PDB Information Stream.
    pub age: U32<LE>,

    /// The stream containing global symbols.
    pub global_symbols_stream: StreamIndexU16,

    /// The version of the tool which produced this DBI stream.
    pub dll_version: U16<LE>,

    /// The stream containing private symbols.
    pub private_symbols_stream: StreamIndexU16,

    /// The build number of the tool which produced this DBI stream.
    pub dll_build_number: U16<LE>,

    /// The stream containing symbol records.
    pub symbols_stream: StreamIndexU16,
}

static_assertions::const_assert_eq!(size_of::<DbiStreamHeader>(), DBI_STREAM_HEADER_LEN);
const DBI_STREAM_HEADER_LEN: usize = 22;

/// The header of the DBI stream, as written before VisualC++ 4.1. It holds nothing besides
/// the three symbol stream indexes.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Debug, Clone)]
#[repr(C)]
#[allow(missing_docs)]
pub struct OldDbiStreamHeader {
    pub global_symbols_stream: StreamIndexU16,
    pub private_symbols_stream: StreamIndexU16,
    pub symbols_stream: StreamIndexU16,
}

static_assertions::const_assert_eq!(size_of::<OldDbiStreamHeader>(), OLD_DBI_STREAM_HEADER_LEN);
const OLD_DBI_STREAM_HEADER_LEN: usize = 6;

/// Value of the `signature` field of a well-formed [`DbiStreamHeader`].
pub const DBI_STREAM_SIGNATURE: u32 = 0xffff_ffff;

/// MSVC version 4.1
pub const DBI_STREAM_VERSION_VC41: u32 = 930803;
/// MSVC version 5.0
pub const DBI_STREAM_VERSION_V50: u32 = 19960307;
/// MSVC version 6.0
pub const DBI_STREAM_VERSION_V60: u32 = 19970606;
/// MSVC version 7.0
pub const DBI_STREAM_VERSION_V70: u32 = 19990903;

/// Maps a DBI stream version number to the VisualC++ release that wrote it.
///
/// Returns `None` for version numbers that no known release wrote.
pub fn dbi_version_release(version: u32) -> Option<&'static str> {
    match version {
        DBI_STREAM_VERSION_VC41 => Some("4.0"),
        DBI_STREAM_VERSION_V50 => Some("5.0"),
        DBI_STREAM_VERSION_V60 => Some("6.0"),
        DBI_STREAM_VERSION_V70 => Some("7.0"),
        _ => None,
    }
}

/// What was decoded from the DBI stream.
///
/// Both header layouts carry the symbol stream indexes. Only the newer layout carries a
/// version and an age.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct DbiStreamInfo {
    pub version: Option<u32>,
    pub age: Option<u32>,
    pub global_symbols_stream: Option<u32>,
    pub private_symbols_stream: Option<u32>,
    pub symbols_stream: Option<u32>,
}

#[test]
fn test_dbi_version_release() {
    assert_eq!(dbi_version_release(DBI_STREAM_VERSION_VC41), Some("4.0"));
    assert_eq!(dbi_version_release(DBI_STREAM_VERSION_V50), Some("5.0"));
    assert_eq!(dbi_version_release(DBI_STREAM_VERSION_V60), Some("6.0"));
    assert_eq!(dbi_version_release(DBI_STREAM_VERSION_V70), Some("7.0"));
    assert_eq!(dbi_version_release(0), None);
    assert_eq!(dbi_version_release(20091201), None);
}

#[test]
fn test_parse_dbi_stream_header() {
    let bytes: [u8; DBI_STREAM_HEADER_LEN] = [
        0xff, 0xff, 0xff, 0xff, // signature
        0x77, 0x09, 0x31, 0x01, // version
        0x01, 0x00, 0x00, 0x00, // age
        0x06, 0x00, // global_symbols_stream
        0x00, 0x00, // dll_version
        0xff, 0xff, // private_symbols_stream
        0x00, 0x00, // dll_build_number
        0x07, 0x00, // symbols_stream
    ];
    let (h, _) = DbiStreamHeader::ref_from_prefix(bytes.as_slice()).unwrap();
    assert_eq!(h.signature.get(), DBI_STREAM_SIGNATURE);
    assert_eq!(h.version.get(), DBI_STREAM_VERSION_V70);
    assert_eq!(h.age.get(), 1);
    assert_eq!(h.global_symbols_stream.get(), Some(6));
    assert_eq!(h.private_symbols_stream.get(), None);
    assert_eq!(h.symbols_stream.get(), Some(7));
}
