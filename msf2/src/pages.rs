//! Page arithmetic and page-level reads.

use super::*;
use sync_file::ReadAt;

/// Given the size of a stream in bytes, returns the number of page slots that
/// the directory assigns to the stream.
///
/// The 2.00 format always reserves one page slot beyond the whole pages that
/// a stream fills, even when the stream size is an exact multiple of the page
/// size. The read loop never reads past the declared stream size, so the
/// extra page contributes no bytes. Nil streams and zero-length streams are
/// assigned no page slots at all.
///
/// This rule determines the layout of the directory's page table, so every
/// reader of the page table must use it, quirk included.
pub(crate) fn num_pages_for_stream_size(stream_size: u32, page_size: PageSize) -> u32 {
    if stream_size == 0 || stream_size == NIL_STREAM_SIZE {
        0
    } else {
        (stream_size >> page_size.exponent()) + 1
    }
}

/// Reads a span of bytes that lies within a single page.
///
/// The caller chooses how much of the page to read; `buf` must not extend
/// past the end of the page. An empty `buf` reads nothing, but `page` is
/// still required to be in range.
pub(crate) fn read_page_span<F: ReadAt>(
    file: &F,
    page_size: PageSize,
    num_pages: Page,
    page: Page,
    offset_within_page: u32,
    buf: &mut [u8],
) -> anyhow::Result<()> {
    debug_assert!(offset_within_page as usize + buf.len() <= usize::from(page_size));

    if page >= num_pages {
        bail!("Page number {page} is out of range; the file has {num_pages} pages.");
    }

    file.read_exact_at(
        buf,
        page_to_offset(page, page_size) + u64::from(offset_within_page),
    )?;
    Ok(())
}

#[test]
fn test_num_pages_for_stream_size() {
    const PAGE_SIZE: PageSize = PageSize::from_exponent(10);

    assert_eq!(num_pages_for_stream_size(0, PAGE_SIZE), 0);
    assert_eq!(num_pages_for_stream_size(NIL_STREAM_SIZE, PAGE_SIZE), 0);
    assert_eq!(num_pages_for_stream_size(1, PAGE_SIZE), 1);
    assert_eq!(num_pages_for_stream_size(0x3ff, PAGE_SIZE), 1);
    // An exact multiple of the page size still reserves one extra slot.
    assert_eq!(num_pages_for_stream_size(0x400, PAGE_SIZE), 2);
    assert_eq!(num_pages_for_stream_size(0x401, PAGE_SIZE), 2);
    assert_eq!(num_pages_for_stream_size(0x1000, PAGE_SIZE), 5);

    const BIG_PAGE_SIZE: PageSize = PageSize::from_exponent(12);
    assert_eq!(num_pages_for_stream_size(0x1000, BIG_PAGE_SIZE), 2);
    assert_eq!(num_pages_for_stream_size(0x1001, BIG_PAGE_SIZE), 2);
}
