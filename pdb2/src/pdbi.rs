//! PDB Information Stream (aka the PDB Stream)
//!
//! # References
//! * <https://llvm.org/docs/PDB/PdbStream.html>

use std::mem::size_of;
use uuid::Uuid;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, LE, U32};

/// Contains the decoded PDB Information Stream.
///
/// Version 2.00 PDB files store only the header fields here. The unique ID is present only
/// in files written after the first VC7 implementation; older files bind to their
/// executable through the signature and age alone.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct PdbiStream {
    pub version: u32,
    pub signature: u32,
    pub age: u32,
    pub unique_id: Option<Uuid>,
}

#[allow(missing_docs)]
pub const PDBI_VERSION_VC2: u32 = 19941610;
#[allow(missing_docs)]
pub const PDBI_VERSION_VC4: u32 = 19950623;
#[allow(missing_docs)]
pub const PDBI_VERSION_VC41: u32 = 19950814;
#[allow(missing_docs)]
pub const PDBI_VERSION_VC50: u32 = 19960307;
#[allow(missing_docs)]
pub const PDBI_VERSION_VC98: u32 = 19970604;
#[allow(missing_docs)]
pub const PDBI_VERSION_VC70_DEPRECATED: u32 = 19990604; // deprecated vc70 implementation version
#[allow(missing_docs)]
pub const PDBI_VERSION_VC70: u32 = 20000404; // <-- first version that has unique id

pub(crate) fn pdbi_has_unique_id(version: u32) -> bool {
    version > PDBI_VERSION_VC70_DEPRECATED
}

/// Maps a PDBI version number to the VisualC++ release that wrote it.
///
/// Returns `None` for version numbers that no known release wrote.
pub fn pdbi_version_release(version: u32) -> Option<&'static str> {
    match version {
        PDBI_VERSION_VC2 => Some("2.0"),
        PDBI_VERSION_VC4 | PDBI_VERSION_VC41 => Some("4.0"),
        PDBI_VERSION_VC50 => Some("5.0"),
        PDBI_VERSION_VC98 => Some("6.0"),
        PDBI_VERSION_VC70_DEPRECATED | PDBI_VERSION_VC70 => Some("7.0"),
        _ => None,
    }
}

/// The header of the PDB Info stream.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Debug, Clone)]
#[repr(C)]
#[allow(missing_docs)]
pub struct PdbiStreamHeader {
    pub version: U32<LE>,
    pub signature: U32<LE>,
    pub age: U32<LE>,
    // This is only present if the version number is higher than impvVC70Dep.
    // pub unique_id: GuidLe,
}

static_assertions::const_assert_eq!(size_of::<PdbiStreamHeader>(), PDBI_STREAM_HEADER_LEN);
const PDBI_STREAM_HEADER_LEN: usize = 12;

#[test]
fn test_pdbi_version_release() {
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC2), Some("2.0"));
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC4), Some("4.0"));
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC41), Some("4.0"));
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC50), Some("5.0"));
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC98), Some("6.0"));
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC70_DEPRECATED), Some("7.0"));
    assert_eq!(pdbi_version_release(PDBI_VERSION_VC70), Some("7.0"));
    assert_eq!(pdbi_version_release(0), None);
    assert_eq!(pdbi_version_release(20250101), None);
}
