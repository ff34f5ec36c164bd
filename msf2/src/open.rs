//! Code for opening 2.00 PDB files and reading the root directory.

use super::*;
use crate::pages::read_page_span;
use std::fs::File;
use std::path::Path;
use sync_file::{RandomAccessFile, ReadAt};
use tracing::{debug, trace_span};
use zerocopy::FromZeros;

impl Msf2<RandomAccessFile> {
    /// Opens a 2.00 PDB file for read access, given a file name.
    pub fn open(file_name: &Path) -> anyhow::Result<Self> {
        let file = File::open(file_name)?;
        let file_size = file.metadata()?.len();
        let random_file = RandomAccessFile::from(file);
        Self::open_with_file(random_file, file_size)
    }
}

impl<F: ReadAt> Msf2<F> {
    /// Reads the header of a 2.00 PDB file and provides access to the streams
    /// contained within it, given a file that has already been opened.
    ///
    /// `file_size` is the total size of `file` in bytes. The file header
    /// encodes the page count of the file, and this function validates that
    /// count against `file_size`.
    ///
    /// This function reads and validates the file header, then reads the
    /// entire root directory, so it knows how to find each of the streams and
    /// the pages of the streams.
    pub fn open_with_file(file: F, file_size: u64) -> anyhow::Result<Self> {
        let _span = trace_span!("Msf2::open_with_file").entered();

        let mut magic = [0u8; MSF2_MAGIC.len()];
        file.read_exact_at(&mut magic, 0)?;
        if magic != MSF2_MAGIC {
            bail!("File does not have the correct header (magic is wrong).");
        }

        let mut header = Msf2Header::new_zeroed();
        file.read_exact_at(header.as_mut_bytes(), MSF2_HEADER_FILE_OFFSET)?;

        let header_page_size = header.page_size.get();
        let Some(page_size) = PAGE_SIZES
            .iter()
            .copied()
            .find(|&s| u32::from(s) == header_page_size)
        else {
            bail!(
                "Invalid page size in PDB header. The page size is required to be 1 KiB, 2 KiB, or 4 KiB, but is 0x{header_page_size:x}."
            );
        };

        let start_page = header.start_page.get();
        if !START_PAGES.contains(&start_page) {
            bail!("Invalid start page in PDB header: {start_page}");
        }

        // The page count stored in the header is only 16 bits, so the
        // comparison value computed from the file size is truncated the same
        // way before comparing.
        let num_pages = header.num_pages.get();
        let expected_num_pages = (file_size >> page_size.exponent()) as u16;
        if num_pages != expected_num_pages {
            bail!(
                "Invalid number of pages in PDB header. The header says {num_pages}, but the file size says {expected_num_pages}."
            );
        }

        let root_stream_size = header.root_stream.stream_size.get();
        if root_stream_size == NIL_STREAM_SIZE {
            bail!("The root stream is marked nil (free).");
        }

        debug!(
            page_size = u32::from(page_size),
            start_page,
            num_pages,
            root_stream_size,
            "validated 2.00 file header"
        );

        let root_data = read_root_stream(&file, page_size, num_pages, root_stream_size)?;

        let Ok((dir_header, dir_rest)) = StreamDirHeader::ref_from_prefix(root_data.as_slice())
        else {
            bail!("Invalid stream directory (too small).");
        };

        let num_streams = dir_header.num_streams.get();

        let Ok((entries, page_table_bytes)) =
            <[StreamDirEntry]>::ref_from_prefix_with_elems(dir_rest, num_streams as usize)
        else {
            bail!(
                "Inconsistent root stream size; the stream directory declares {num_streams} streams, which do not fit in {root_stream_size} bytes."
            );
        };

        let mut stream_sizes: Vec<u32> = Vec::with_capacity(num_streams as usize);
        let mut stream_page_starts: Vec<u32> = Vec::with_capacity(num_streams as usize);
        let mut num_page_slots: usize = 0;

        for entry in entries.iter() {
            let stream_size = entry.stream_size.get();
            stream_sizes.push(stream_size);
            stream_page_starts.push(num_page_slots as u32);
            num_page_slots += num_pages_for_stream_size(stream_size, page_size) as usize;
        }

        // The page table is stored immediately after the directory entries,
        // with each stream's pages following the previous stream's, with no
        // separation. Bytes past the end of the page table (if any) are
        // ignored.
        let Ok((page_table, _)) =
            <[U16<LE>]>::ref_from_prefix_with_elems(page_table_bytes, num_page_slots)
        else {
            bail!(
                "Invalid stream directory; the page table ends before the last stream's page list."
            );
        };

        let stream_pages: Vec<Page> = page_table.iter().map(|page| page.get()).collect();

        debug!(num_streams, num_page_slots, "read stream directory");

        Ok(Self {
            file,
            page_size,
            num_pages,
            root_stream_size,
            stream_sizes,
            stream_pages,
            stream_page_starts,
        })
    }
}

/// Reads the root directory stream.
///
/// The root directory's page numbers are stored as a flat run of `u16` values
/// immediately after the file header, not in the directory. Each page number
/// is read and validated, and then that page's contribution to the root
/// directory is read, before moving to the next page number.
fn read_root_stream<F: ReadAt>(
    file: &F,
    page_size: PageSize,
    num_pages: Page,
    root_stream_size: u32,
) -> anyhow::Result<Vec<u8>> {
    let num_root_pages = num_pages_for_stream_size(root_stream_size, page_size);
    if num_root_pages == 0 {
        bail!("Invalid number of root pages; the root stream size is {root_stream_size}.");
    }

    let mut root_data: Vec<u8> = vec![0; root_stream_size as usize];
    let mut chunks = root_data.chunks_mut(usize::from(page_size));

    for i in 0..num_root_pages {
        let mut page = U16::<LE>::new(0);
        file.read_exact_at(
            page.as_mut_bytes(),
            ROOT_PAGE_LIST_FILE_OFFSET + u64::from(i) * 2,
        )?;

        // The last page of a stream whose size is an exact multiple of the
        // page size contributes no bytes, but its page number must still be
        // in range.
        let chunk = chunks.next().unwrap_or_default();
        read_page_span(file, page_size, num_pages, page.get(), 0, chunk)?;
    }

    let not_read: usize = chunks.map(|chunk| chunk.len()).sum();
    if not_read != 0 {
        bail!(
            "Inconsistent root stream read; {not_read} bytes of the root stream were not covered by its page list."
        );
    }

    Ok(root_data)
}

/// The header of the root directory. The directory entries immediately follow
/// this header, and the flattened page table follows the entries.
#[derive(Clone, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct StreamDirHeader {
    /// The number of streams described by the directory.
    num_streams: U16<LE>,

    /// Alignment padding. The value is not meaningful.
    reserved: U16<LE>,
}
