//! Reads the page-indexed container used by version 2.00 Microsoft Program
//! Database (PDB) files.
//!
//! A 2.00 PDB file contains a set of numbered _streams_. Each stream is a
//! sequence of bytes. Stream data is not stored sequentially in the file;
//! instead, the file is divided into fixed-size _pages_ and each stream owns
//! an ordered list of 16-bit page numbers. Concatenating those pages, up to
//! the stream's declared size, reconstructs the stream.
//!
//! The stream sizes and the page lists are described by the _root directory_,
//! which is itself stored in pages. The root directory is the one stream
//! whose page list is not stored in the directory; its page numbers are a
//! flat run of `u16` values immediately after the file header.
//!
//! The 2.00 format predates the "big" MSF container used by modern PDB files.
//! This crate only reads 2.00 files; it does not write them, and it does not
//! interpret the contents of any stream. The `ms-pdb2` crate builds on this
//! crate and understands the well-known streams.
//!
//! # References
//! * <https://llvm.org/docs/PDB/MsfFile.html>
//! * <https://github.com/microsoft/microsoft-pdb>

#![forbid(unused_must_use)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod open;
mod pages;
mod read;


use anyhow::bail;
use pow2::Pow2;
use std::mem::size_of;
use sync_file::RandomAccessFile;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, LE, U16, U32};

use self::pages::num_pages_for_stream_size;

/// Identifies a 2.00 PDB file. This is at file offset 0.
pub const MSF2_MAGIC: [u8; 0x2c] =
    *b"Microsoft C/C++ program database 2.00\r\n\x1a\x4a\x47\0\0";

#[test]
fn show_magic() {
    use pretty_hex::PrettyHex;
    println!("MSF2_MAGIC:");
    println!("{:?}", MSF2_MAGIC.hex_dump());
}

/// Returns `true` if the given file header (the beginning of a file) appears
/// to be a 2.00 PDB file.
///
/// `header` does not need to contain the entire file header. If the slice is
/// too short then this function returns `false`.
pub fn is_file_header_msf2(header: &[u8]) -> bool {
    header.starts_with(&MSF2_MAGIC)
}

/// The fixed-size header of a 2.00 PDB file. It is stored immediately after
/// [`MSF2_MAGIC`].
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct Msf2Header {
    /// The size of each page, in bytes. The value is required to be one of
    /// [`PAGE_SIZES`].
    page_size: U32<LE>,

    /// A format revision marker; 2.00 writers emitted 2, 5, or 9. Readers
    /// validate that the value is one of [`START_PAGES`] and nothing else;
    /// the value is not used to locate any data.
    start_page: U16<LE>,

    /// The number of pages in the file. The value is required to be equal to
    /// the file size divided by the page size, truncated to 16 bits.
    num_pages: U16<LE>,

    /// The directory entry for the root directory stream. Of this entry, only
    /// the stream size is meaningful; the root directory's page numbers are
    /// stored immediately after this header, not in the entry.
    root_stream: StreamDirEntry,
    // root directory page numbers: [U16<LE>]
}

/// An entry in the root directory. Entries are stored in one contiguous array
/// directly after [`StreamDirHeader`], one per stream.
///
/// [`StreamDirHeader`]: crate::open::StreamDirHeader
#[derive(Clone, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct StreamDirEntry {
    /// The size of the stream in bytes, or [`NIL_STREAM_SIZE`] for a nil
    /// stream.
    stream_size: U32<LE>,

    /// When a 2.00 writer saved the directory, this field held a pointer into
    /// its own address space. The value is garbage on disk; readers must
    /// ignore it.
    stream_pages: [U16<LE>; 2],
}

/// The file offset of [`Msf2Header`].
const MSF2_HEADER_FILE_OFFSET: u64 = MSF2_MAGIC.len() as u64;

/// The file offset of the root directory's page numbers. They are stored as a
/// flat run of `u16` values, immediately after the file header; this is the
/// one page list that is not stored in the directory itself.
const ROOT_PAGE_LIST_FILE_OFFSET: u64 = MSF2_HEADER_FILE_OFFSET + size_of::<Msf2Header>() as u64;

static_assertions::const_assert_eq!(size_of::<Msf2Header>(), 16);
static_assertions::const_assert_eq!(size_of::<StreamDirEntry>(), 8);
static_assertions::const_assert_eq!(ROOT_PAGE_LIST_FILE_OFFSET, 60);

/// Identifies a page within a 2.00 PDB file. Page numbers are 16 bits in this
/// format, so no file can have more than 65,535 pages.
type Page = u16;

/// Specifies the size of a page. The 2.00 format requires this to be a power
/// of 2.
pub type PageSize = Pow2;

/// The page sizes that may appear in a valid file: 1 KiB, 2 KiB, or 4 KiB.
pub const PAGE_SIZES: [PageSize; 3] = [
    PageSize::from_exponent(10),
    PageSize::from_exponent(11),
    PageSize::from_exponent(12),
];

/// The `start_page` values that 2.00 writers emitted, one per format
/// revision.
pub const START_PAGES: [u16; 3] = [2, 5, 9];

/// This stream size marks a stream as "nil" (free). A nil stream is different
/// from a stream with a length of zero bytes.
pub const NIL_STREAM_SIZE: u32 = 0xffff_ffff;

/// Converts a page number to a file offset.
fn page_to_offset(page: Page, page_size: PageSize) -> u64 {
    u64::from(page) << page_size.exponent()
}

/// Reads the streams contained in a 2.00 PDB file.
///
/// The [`Msf2::open`] function opens a file on disk, given its path.
/// [`Msf2::open_with_file`] reads from any [`ReadAt`][sync_file::ReadAt]
/// implementation. Both validate the file header and read the entire root
/// directory before returning.
#[derive(Debug)]
pub struct Msf2<F = RandomAccessFile> {
    /// The data source for this PDB file.
    file: F,

    page_size: PageSize,

    /// The number of pages in the file, according to the file header.
    num_pages: Page,

    /// The size in bytes of the root directory stream, according to the file
    /// header. Stream 0 is expected to be a copy of the root directory with
    /// this same size.
    root_stream_size: u32,

    /// The sizes of all streams. The length of this vector defines the number
    /// of streams.
    ///
    /// Values in this vector may be [`NIL_STREAM_SIZE`], indicating that the
    /// stream is nil.
    stream_sizes: Vec<u32>,

    /// The page numbers of all streams, in directory order, with no
    /// separation between streams.
    stream_pages: Vec<Page>,

    /// For each stream, the index within `stream_pages` where its page
    /// numbers begin.
    stream_page_starts: Vec<u32>,
}

impl<F> Msf2<F> {
    /// The page size used by this file.
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// The number of pages in this file, according to the file header.
    pub fn num_pages(&self) -> u16 {
        self.num_pages
    }

    /// The size in bytes of the root directory stream, according to the file
    /// header.
    pub fn root_stream_size(&self) -> u32 {
        self.root_stream_size
    }

    /// The total number of streams in this file. This count includes nil
    /// streams.
    pub fn num_streams(&self) -> u32 {
        self.stream_sizes.len() as u32
    }

    /// Indicates whether `stream` is a valid stream index for this file.
    /// Nil streams are considered valid.
    pub fn is_valid_stream_index(&self, stream: u32) -> bool {
        (stream as usize) < self.stream_sizes.len()
    }

    /// Indicates whether `stream` is a valid stream index and is not a nil
    /// stream.
    pub fn is_stream_valid(&self, stream: u32) -> bool {
        if let Some(&size) = self.stream_sizes.get(stream as usize) {
            size != NIL_STREAM_SIZE
        } else {
            false
        }
    }

    /// Gets the size in bytes of a given stream.
    ///
    /// If `stream` is a nil stream, this returns 0.
    ///
    /// # Panics
    ///
    /// Panics if `stream` is out of range.
    pub fn stream_size(&self, stream: u32) -> u32 {
        let size = self.stream_sizes[stream as usize];
        if size == NIL_STREAM_SIZE {
            0
        } else {
            size
        }
    }

    /// Gets the declared size of a stream and its page list.
    ///
    /// The returned size is the raw value from the directory; for a nil
    /// stream it is [`NIL_STREAM_SIZE`]. Nil streams and zero-length streams
    /// own no pages, so their page list is empty. All other streams own
    /// `size / page_size + 1` pages; the read loop never reads beyond the
    /// declared size, so the last page may contribute zero bytes.
    pub fn stream_size_and_pages(&self, stream: u32) -> anyhow::Result<(u32, &[u16])> {
        let Some(&stream_size) = self.stream_sizes.get(stream as usize) else {
            bail!("Stream index is out of range.  Index: {stream}");
        };

        let num_stream_pages = num_pages_for_stream_size(stream_size, self.page_size);
        if num_stream_pages == 0 {
            return Ok((stream_size, &[]));
        }

        let start = self.stream_page_starts[stream as usize] as usize;
        Ok((
            stream_size,
            &self.stream_pages[start..start + num_stream_pages as usize],
        ))
    }

    /// Gets access to the file that this [`Msf2`] is reading.
    pub fn file(&self) -> &F {
        &self.file
    }

    /// Gets mutable access to the file that this [`Msf2`] is reading.
    pub fn file_mut(&mut self) -> &mut F {
        &mut self.file
    }

    /// Consumes this [`Msf2`] and returns the underlying file.
    pub fn into_file(self) -> F {
        self.file
    }
}
