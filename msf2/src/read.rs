//! Code for reading (materializing) whole streams.

use super::*;
use crate::pages::read_page_span;
use sync_file::ReadAt;

impl<F: ReadAt> Msf2<F> {
    /// Reads an entire stream to a vector, by following the stream's page
    /// list.
    ///
    /// Reading a nil stream or a zero-length stream returns an empty vector
    /// without touching the file.
    pub fn read_stream_to_vec(&self, stream: u32) -> anyhow::Result<Vec<u8>> {
        let (stream_size, stream_pages) = self.stream_size_and_pages(stream)?;
        read_stream_core(
            &self.file,
            self.page_size,
            self.num_pages,
            stream_size,
            stream_pages,
        )
    }
}

/// Reconstructs a stream's contents by concatenating the contents of its
/// pages, in page list order.
///
/// Each page contributes at most `page_size` bytes, and never more than the
/// declared stream size still calls for; the extra page slot that the
/// directory reserves for an exact-multiple stream size contributes nothing.
/// Every page number in `pages` is validated, including one that contributes
/// nothing.
pub(crate) fn read_stream_core<F: ReadAt>(
    file: &F,
    page_size: PageSize,
    num_pages: Page,
    stream_size: u32,
    pages: &[Page],
) -> anyhow::Result<Vec<u8>> {
    if pages.is_empty() {
        // Nil streams and zero-length streams. The declared size of a nil
        // stream is a sentinel, not a byte count, so it must not be used to
        // size the buffer.
        return Ok(Vec::new());
    }

    let mut stream_data: Vec<u8> = vec![0; stream_size as usize];
    let mut chunks = stream_data.chunks_mut(usize::from(page_size));

    for &page in pages {
        let chunk = chunks.next().unwrap_or_default();
        read_page_span(file, page_size, num_pages, page, 0, chunk)?;
    }

    let not_read: usize = chunks.map(|chunk| chunk.len()).sum();
    if not_read != 0 {
        bail!(
            "Stream is incomplete; its page list covers {not_read} fewer bytes than its size of {stream_size}."
        );
    }

    Ok(stream_data)
}
