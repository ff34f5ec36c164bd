use crate::classify::{StreamKind, SymbolStreamRole};
use crate::dbi::{
    DbiStreamHeader, OldDbiStreamHeader, DBI_STREAM_SIGNATURE, DBI_STREAM_VERSION_V60,
    DBI_STREAM_VERSION_V70,
};
use crate::diag::Diags;
use crate::guid::GuidLe;
use crate::pdbi::{PdbiStreamHeader, PDBI_VERSION_VC2, PDBI_VERSION_VC70, PDBI_VERSION_VC98};
use crate::stream_index::StreamIndexU16;
use crate::tpi::{TypeStreamHeader, TPI_STREAM_VERSION_V60};
use crate::Pdb2;
use ms_pdb2_msf::MSF2_MAGIC;
use std::mem::size_of;
use std::sync::Mutex;
use sync_file::ReadAt;
use tracing::{debug, trace_span};
use uuid::Uuid;
use zerocopy::{IntoBytes, U16, U32};

#[static_init::dynamic]
static INIT_LOGGER: () = {
    use tracing_subscriber::fmt::format::FmtSpan;

    tracing_subscriber::fmt::fmt()
        .compact()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_level(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_test_writer()
        .without_time()
        .with_ansi(false)
        .init();
};

struct TestFile {
    data: Mutex<Vec<u8>>,
}

impl ReadAt for TestFile {
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
        let _span = trace_span!("TestFile::read_exact_at").entered();
        debug!(offset, buf_len = buf.len(), "TestFile::read_exact_at");
        let lock = self.data.lock().unwrap();
        lock.read_exact_at(buf, offset)?;
        Ok(())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        let lock = self.data.lock().unwrap();
        lock.read_at(buf, offset)
    }
}

fn open_image(image: Vec<u8>) -> anyhow::Result<Pdb2<TestFile>> {
    let file_size = image.len() as u64;
    Pdb2::open_with_file(
        TestFile {
            data: Mutex::new(image),
        },
        file_size,
    )
}

const PAGE_SIZE: usize = 1024;
const START_PAGE: u16 = 2;

/// Builds a 2.00 PDB file image around a set of stream contents.
///
/// Page 0 holds the file header and the root directory's page list. Stream pages are
/// allocated in stream order, then the root directory's own page comes last. Stream 0 is
/// filled in automatically so that its size matches the root directory, unless
/// `root_copy_size` overrides it.
struct PdbBuilder {
    /// Contents of each stream. Index 0 is a placeholder; its content is generated.
    streams: Vec<Vec<u8>>,
    /// Overrides the size of stream 0.
    root_copy_size: Option<u32>,
    /// Overwrites one slot of the directory's flattened page table.
    page_slot_override: Option<(usize, u16)>,
}

impl PdbBuilder {
    fn new() -> Self {
        println!();
        PdbBuilder {
            streams: vec![Vec::new()],
            root_copy_size: None,
            page_slot_override: None,
        }
    }

    fn empty_directory() -> Self {
        println!();
        PdbBuilder {
            streams: Vec::new(),
            root_copy_size: None,
            page_slot_override: None,
        }
    }

    /// Places `data` at stream index `index`, padding the directory with empty streams
    /// as needed. Indexes must be used in increasing order.
    fn stream_at(&mut self, index: u32, data: &[u8]) {
        while (self.streams.len() as u32) < index {
            self.streams.push(Vec::new());
        }
        assert_eq!(self.streams.len() as u32, index, "stream {index} already placed");
        self.streams.push(data.to_vec());
    }

    fn build(self) -> Vec<u8> {
        let num_streams = self.streams.len();

        // Page slots per stream, using the directory's page count rule.
        let slots_for = |size: usize| -> usize {
            if size == 0 {
                0
            } else {
                size / PAGE_SIZE + 1
            }
        };

        // The tests here keep every stream and the directory itself within one page, so
        // the root copy always occupies exactly one page slot and the directory size can
        // be computed directly.
        let mut sizes: Vec<usize> = self.streams.iter().map(|s| s.len()).collect();
        if num_streams != 0 {
            let content_slots: usize = sizes[1..].iter().map(|&n| slots_for(n)).sum();
            let base = 4 + 8 * num_streams + 2 * content_slots;
            let root_copy_size = match self.root_copy_size {
                Some(n) => n as usize,
                None => base + 2,
            };
            assert!(root_copy_size < PAGE_SIZE);
            sizes[0] = root_copy_size;
        }

        // Allocate pages. Page 0 is filled last.
        let mut pages: Vec<Vec<u8>> = vec![Vec::new()];
        let mut page_table: Vec<u16> = Vec::new();
        for (index, &size) in sizes.iter().enumerate() {
            let content: Vec<u8> = if index == 0 {
                vec![0xbb; size]
            } else {
                self.streams[index].clone()
            };

            for chunk in content.chunks(PAGE_SIZE) {
                let page = pages.len() as u16;
                pages.push(chunk.to_vec());
                page_table.push(page);
            }
            if size != 0 && size % PAGE_SIZE == 0 {
                // The reserved extra slot.
                let page = pages.len() as u16;
                pages.push(Vec::new());
                page_table.push(page);
            }
        }

        if let Some((slot, page)) = self.page_slot_override {
            page_table[slot] = page;
        }

        // The root directory: header, stream descriptors, flattened page table.
        let mut root = Vec::new();
        root.extend_from_slice(&(num_streams as u16).to_le_bytes());
        root.extend_from_slice(&0u16.to_le_bytes());
        for &size in sizes.iter() {
            root.extend_from_slice(&(size as u32).to_le_bytes());
            root.extend_from_slice(&[0xee; 4]);
        }
        for &page in page_table.iter() {
            root.extend_from_slice(&page.to_le_bytes());
        }
        if self.root_copy_size.is_none() && num_streams != 0 {
            assert_eq!(root.len(), sizes[0]);
        }

        assert!(root.len() <= PAGE_SIZE, "root directory must fit in one page");
        let root_size = root.len() as u32;
        let root_page = pages.len() as u16;
        pages.push(root);

        let num_pages = pages.len() as u16;
        let mut page0 = Vec::new();
        page0.extend_from_slice(&MSF2_MAGIC);
        page0.extend_from_slice(&(PAGE_SIZE as u32).to_le_bytes());
        page0.extend_from_slice(&START_PAGE.to_le_bytes());
        page0.extend_from_slice(&num_pages.to_le_bytes());
        page0.extend_from_slice(&root_size.to_le_bytes());
        page0.extend_from_slice(&[0xee; 4]);
        page0.extend_from_slice(&root_page.to_le_bytes());
        assert!(page0.len() <= PAGE_SIZE);
        pages[0] = page0;

        let mut image = Vec::new();
        for page in pages.iter() {
            let mut p = page.clone();
            p.resize(PAGE_SIZE, 0);
            image.extend_from_slice(&p);
        }
        image
    }
}

fn classify_image(image: Vec<u8>) -> (Vec<crate::ClassifiedStream>, Diags) {
    let pdb = open_image(image).unwrap();
    let mut diags = Diags::new();
    let streams = pdb.classify_streams(&mut diags);
    (streams, diags)
}

fn infos(diags: &Diags) -> Vec<&str> {
    diags
        .diags
        .iter()
        .filter(|d| !d.is_error)
        .map(|d| d.message.as_str())
        .collect()
}

fn errors(diags: &Diags) -> Vec<&str> {
    diags
        .diags
        .iter()
        .filter(|d| d.is_error)
        .map(|d| d.message.as_str())
        .collect()
}

fn sidx(index: u16) -> StreamIndexU16 {
    StreamIndexU16(U16::new(index))
}

fn pdbi_stream(version: u32, signature: u32, age: u32) -> Vec<u8> {
    PdbiStreamHeader {
        version: U32::new(version),
        signature: U32::new(signature),
        age: U32::new(age),
    }
    .as_bytes()
    .to_vec()
}

fn pdbi_stream_with_id(version: u32, signature: u32, age: u32, unique_id: &Uuid) -> Vec<u8> {
    let mut data = pdbi_stream(version, signature, age);
    data.extend_from_slice(GuidLe::from(unique_id).as_bytes());
    data
}

fn tpi_stream(
    type_index_begin: u32,
    type_index_end: u32,
    type_record_bytes: u32,
    payload_len: usize,
) -> Vec<u8> {
    let mut data = TypeStreamHeader {
        version: U32::new(TPI_STREAM_VERSION_V60),
        header_size: U32::new(size_of::<TypeStreamHeader>() as u32),
        type_index_begin: U32::new(type_index_begin),
        type_index_end: U32::new(type_index_end),
        type_record_bytes: U32::new(type_record_bytes),
    }
    .as_bytes()
    .to_vec();
    data.extend_from_slice(&vec![0u8; payload_len]);
    data
}

fn dbi_stream(
    signature: u32,
    version: u32,
    global_symbols_stream: StreamIndexU16,
    private_symbols_stream: StreamIndexU16,
    symbols_stream: StreamIndexU16,
) -> Vec<u8> {
    DbiStreamHeader {
        signature: U32::new(signature),
        version: U32::new(version),
        age: U32::new(1),
        global_symbols_stream,
        dll_version: U16::new(0),
        private_symbols_stream,
        dll_build_number: U16::new(0),
        symbols_stream,
    }
    .as_bytes()
    .to_vec()
}

fn old_dbi_stream(
    global_symbols_stream: StreamIndexU16,
    private_symbols_stream: StreamIndexU16,
    symbols_stream: StreamIndexU16,
) -> Vec<u8> {
    OldDbiStreamHeader {
        global_symbols_stream,
        private_symbols_stream,
        symbols_stream,
    }
    .as_bytes()
    .to_vec()
}

#[test]
fn test_classify_v7_pdb() {
    let unique_id = Uuid::from_fields(
        0x12345678,
        0x9abc,
        0xdef0,
        &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
    );

    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream_with_id(PDBI_VERSION_VC70, 0x11223344, 25, &unique_id));
    b.stream_at(2, &tpi_stream(4096, 4099, 64, 64));
    b.stream_at(
        3,
        &dbi_stream(DBI_STREAM_SIGNATURE, DBI_STREAM_VERSION_V70, sidx(6), sidx(7), sidx(8)),
    );
    b.stream_at(5, b"fpo data");
    b.stream_at(6, b"global symbols");
    b.stream_at(7, b"private symbols");
    b.stream_at(8, b"symbol records");

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), Vec::<&str>::new());
    assert_eq!(
        infos(&diags),
        vec![
            "PDB file from VisualC++ 7.0",
            "PDB ID: 123456789ABCDEF0112233445566778825",
            "TPI stream from VisualC++ 6.0",
            "Min Type Info: 4096",
            "Max Type Info: 4099",
            "DBI stream from VisualC++ 7.0",
            "Frame pointer omission stream found",
            "Global symbols stream found",
            "Private symbols stream found",
            "Symbols stream found",
        ]
    );

    assert_eq!(streams.len(), 9);
    assert!(matches!(streams[0].kind, StreamKind::RootCopy));

    let StreamKind::PdbInfo(pdbi) = &streams[1].kind else {
        panic!("expected PDB info stream");
    };
    assert_eq!(pdbi.version, PDBI_VERSION_VC70);
    assert_eq!(pdbi.signature, 0x11223344);
    assert_eq!(pdbi.age, 25);
    assert_eq!(pdbi.unique_id, Some(unique_id));

    let StreamKind::TypeInfo(tpi) = &streams[2].kind else {
        panic!("expected type info stream");
    };
    assert_eq!(tpi.type_record_bytes.get(), 64);

    let StreamKind::DebugInfo(dbi) = &streams[3].kind else {
        panic!("expected debug info stream");
    };
    assert_eq!(dbi.version, Some(DBI_STREAM_VERSION_V70));
    assert_eq!(dbi.age, Some(1));
    assert_eq!(dbi.global_symbols_stream, Some(6));
    assert_eq!(dbi.private_symbols_stream, Some(7));
    assert_eq!(dbi.symbols_stream, Some(8));

    assert!(matches!(streams[4].kind, StreamKind::Unclassified));
    assert!(matches!(streams[5].kind, StreamKind::Fpo));
    assert!(matches!(
        streams[6].kind,
        StreamKind::Symbols(SymbolStreamRole::Global)
    ));
    assert!(matches!(
        streams[7].kind,
        StreamKind::Symbols(SymbolStreamRole::Private)
    ));
    assert!(matches!(
        streams[8].kind,
        StreamKind::Symbols(SymbolStreamRole::Symbols)
    ));
}

#[test]
fn test_classify_v2_pdb_old_dbi() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC2, 1, 1));
    b.stream_at(
        3,
        &old_dbi_stream(sidx(6), StreamIndexU16::NIL, StreamIndexU16::NIL),
    );
    b.stream_at(6, b"global symbols");

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), Vec::<&str>::new());
    assert_eq!(
        infos(&diags),
        vec!["PDB file from VisualC++ 2.0", "Global symbols stream found"]
    );

    let StreamKind::DebugInfo(dbi) = &streams[3].kind else {
        panic!("expected debug info stream");
    };
    assert_eq!(dbi.version, None);
    assert_eq!(dbi.age, None);
    assert_eq!(dbi.global_symbols_stream, Some(6));
    assert_eq!(dbi.private_symbols_stream, None);
    assert_eq!(dbi.symbols_stream, None);

    assert!(matches!(
        streams[6].kind,
        StreamKind::Symbols(SymbolStreamRole::Global)
    ));
}

#[test]
fn test_classify_empty_directory() {
    let pdb = open_image(PdbBuilder::empty_directory().build()).unwrap();
    assert_eq!(pdb.num_streams(), 0);
    assert_eq!(pdb.msf().root_stream_size(), 4);

    let mut diags = Diags::new();
    let streams = pdb.classify_streams(&mut diags);
    assert!(streams.is_empty());
    assert!(diags.diags.is_empty());
}

#[test]
fn test_pdb_info_too_small() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC70, 0, 0)[..8]);
    b.stream_at(
        3,
        &old_dbi_stream(sidx(6), StreamIndexU16::NIL, StreamIndexU16::NIL),
    );
    b.stream_at(6, b"global symbols");

    let (streams, diags) = classify_image(b.build());

    // The PDB version was never captured, so the DBI stream is read with the old
    // header layout and the symbol stream match still works.
    assert_eq!(
        errors(&diags),
        vec!["PDB header stream too small to contain its header"]
    );
    assert_eq!(infos(&diags), vec!["Global symbols stream found"]);
    assert!(matches!(streams[1].kind, StreamKind::Unclassified));
    assert!(matches!(streams[3].kind, StreamKind::DebugInfo(_)));
}

#[test]
fn test_pdb_info_no_room_for_unique_id() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC70, 7, 42));
    b.stream_at(
        3,
        &dbi_stream(
            DBI_STREAM_SIGNATURE,
            DBI_STREAM_VERSION_V60,
            StreamIndexU16::NIL,
            StreamIndexU16::NIL,
            StreamIndexU16::NIL,
        ),
    );

    let (streams, diags) = classify_image(b.build());

    // The version label is reported and the version is captured before the missing
    // unique ID is noticed: the DBI stream is read with the new header layout.
    assert_eq!(
        infos(&diags),
        vec![
            "PDB file from VisualC++ 7.0",
            "DBI stream from VisualC++ 6.0",
        ]
    );
    assert_eq!(
        errors(&diags),
        vec!["PDB header stream too small to contain its extended header"]
    );
    assert!(matches!(streams[1].kind, StreamKind::Unclassified));
}

#[test]
fn test_pdb_info_unknown_release() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(12345678, 7, 3));

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), Vec::<&str>::new());
    assert_eq!(infos(&diags), vec!["Unknown VisualC++ release: 12345678"]);

    let StreamKind::PdbInfo(pdbi) = &streams[1].kind else {
        panic!("expected PDB info stream");
    };
    assert_eq!(pdbi.version, 12345678);
    assert_eq!(pdbi.unique_id, None);
}

#[test]
fn test_tpi_no_types() {
    let mut b = PdbBuilder::new();
    b.stream_at(2, &tpi_stream(4096, 4096, 0, 0));

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), Vec::<&str>::new());
    assert_eq!(
        infos(&diags),
        vec!["TPI stream from VisualC++ 6.0", "No types information stored"]
    );
    assert!(matches!(streams[2].kind, StreamKind::TypeInfo(_)));
}

#[test]
fn test_tpi_corrupted_header() {
    let mut b = PdbBuilder::new();
    b.stream_at(2, &tpi_stream(4096, 4200, 0, 0));

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), Vec::<&str>::new());
    assert_eq!(
        infos(&diags),
        vec![
            "TPI stream from VisualC++ 6.0",
            "Corrupted header. No types information space whereas there are entries",
        ]
    );
    assert!(matches!(streams[2].kind, StreamKind::Unclassified));
}

#[test]
fn test_tpi_too_small() {
    let mut b = PdbBuilder::new();
    b.stream_at(2, &tpi_stream(4096, 4096, 0, 0)[..10]);

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), vec!["TPI stream too small to contain its header"]);
    assert_eq!(infos(&diags), Vec::<&str>::new());
    assert!(matches!(streams[2].kind, StreamKind::Unclassified));
}

#[test]
fn test_tpi_types_do_not_fit() {
    let mut b = PdbBuilder::new();
    // Declares 512 bytes of type records but carries only 256.
    b.stream_at(2, &tpi_stream(4096, 4100, 512, 256));

    let (streams, diags) = classify_image(b.build());

    assert_eq!(
        infos(&diags),
        vec![
            "TPI stream from VisualC++ 6.0",
            "Min Type Info: 4096",
            "Max Type Info: 4100",
        ]
    );
    assert_eq!(
        errors(&diags),
        vec!["TPI stream isn't big enough to store types information"]
    );
    assert!(matches!(streams[2].kind, StreamKind::Unclassified));
}

#[test]
fn test_dbi_bad_signature() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC98, 7, 3));
    b.stream_at(
        3,
        &dbi_stream(0, DBI_STREAM_VERSION_V60, sidx(6), sidx(6), sidx(6)),
    );
    b.stream_at(6, b"would-be symbols");

    let (streams, diags) = classify_image(b.build());

    // The symbol stream indexes are not captured from a rejected DBI stream, so
    // stream 6 stays unmatched.
    assert_eq!(infos(&diags), vec!["PDB file from VisualC++ 6.0"]);
    assert_eq!(errors(&diags), vec!["Invalid signature for DBI stream: 0"]);
    assert!(matches!(streams[3].kind, StreamKind::Unclassified));
    assert!(matches!(streams[6].kind, StreamKind::Unclassified));
}

#[test]
fn test_dbi_new_layout_too_small() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC98, 7, 3));
    b.stream_at(
        3,
        &dbi_stream(
            DBI_STREAM_SIGNATURE,
            DBI_STREAM_VERSION_V60,
            StreamIndexU16::NIL,
            StreamIndexU16::NIL,
            StreamIndexU16::NIL,
        )[..12],
    );

    let (streams, diags) = classify_image(b.build());

    assert_eq!(infos(&diags), vec!["PDB file from VisualC++ 6.0"]);
    assert_eq!(errors(&diags), vec!["DBI stream too small to contain its header"]);
    assert!(matches!(streams[3].kind, StreamKind::Unclassified));
}

#[test]
fn test_dbi_old_layout_too_small() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC2, 1, 1));
    b.stream_at(
        3,
        &old_dbi_stream(sidx(6), StreamIndexU16::NIL, StreamIndexU16::NIL)[..4],
    );

    let (streams, diags) = classify_image(b.build());

    assert_eq!(infos(&diags), vec!["PDB file from VisualC++ 2.0"]);
    assert_eq!(errors(&diags), vec!["DBI stream too small to contain its header"]);
    assert!(matches!(streams[3].kind, StreamKind::Unclassified));
}

#[test]
fn test_dbi_unknown_version_still_captures() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC98, 7, 3));
    b.stream_at(
        3,
        &dbi_stream(
            DBI_STREAM_SIGNATURE,
            11111111,
            sidx(6),
            StreamIndexU16::NIL,
            StreamIndexU16::NIL,
        ),
    );
    b.stream_at(6, b"global symbols");

    let (streams, diags) = classify_image(b.build());

    assert_eq!(errors(&diags), Vec::<&str>::new());
    assert_eq!(
        infos(&diags),
        vec![
            "PDB file from VisualC++ 6.0",
            "Unknown VisualC++ release: 11111111",
            "Global symbols stream found",
        ]
    );

    let StreamKind::DebugInfo(dbi) = &streams[3].kind else {
        panic!("expected debug info stream");
    };
    assert_eq!(dbi.version, Some(11111111));
}

#[test]
fn test_root_copy_size_mismatch() {
    let mut b = PdbBuilder::new();
    b.root_copy_size = Some(16);
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC2, 1, 1));

    let (streams, diags) = classify_image(b.build());

    assert_eq!(
        errors(&diags),
        vec!["Mismatching root stream and copy root stream sizes"]
    );
    assert_eq!(infos(&diags), vec!["PDB file from VisualC++ 2.0"]);
    assert!(matches!(streams[0].kind, StreamKind::RootCopy));
}

#[test]
fn test_symbol_stream_in_fixed_range_ignored() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC98, 7, 3));
    b.stream_at(
        3,
        &dbi_stream(
            DBI_STREAM_SIGNATURE,
            DBI_STREAM_VERSION_V60,
            sidx(4),
            StreamIndexU16::NIL,
            StreamIndexU16::NIL,
        ),
    );
    b.stream_at(4, b"not symbols");

    let (streams, diags) = classify_image(b.build());

    // Stream 4 is inside the fixed range, so the declared index does not count.
    assert_eq!(
        infos(&diags),
        vec![
            "PDB file from VisualC++ 6.0",
            "DBI stream from VisualC++ 6.0",
        ]
    );
    assert!(matches!(streams[4].kind, StreamKind::Unclassified));
}

#[test]
fn test_symbol_roles_first_match_wins() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC98, 7, 3));
    b.stream_at(
        3,
        &dbi_stream(DBI_STREAM_SIGNATURE, DBI_STREAM_VERSION_V60, sidx(6), sidx(6), sidx(6)),
    );
    b.stream_at(6, b"symbols");

    let (streams, diags) = classify_image(b.build());

    assert_eq!(
        infos(&diags),
        vec![
            "PDB file from VisualC++ 6.0",
            "DBI stream from VisualC++ 6.0",
            "Global symbols stream found",
        ]
    );
    assert!(matches!(
        streams[6].kind,
        StreamKind::Symbols(SymbolStreamRole::Global)
    ));
}

#[test]
fn test_unreadable_stream_reported_and_walk_continues() {
    let mut b = PdbBuilder::new();
    b.stream_at(1, &pdbi_stream(PDBI_VERSION_VC2, 1, 1));
    b.stream_at(2, &tpi_stream(4096, 4096, 0, 0));
    b.stream_at(
        3,
        &old_dbi_stream(StreamIndexU16::NIL, StreamIndexU16::NIL, StreamIndexU16::NIL),
    );
    // Stream 2's only page slot is the third in the flattened table (one slot each
    // for streams 0 and 1).
    b.page_slot_override = Some((2, 0xff));

    let (streams, diags) = classify_image(b.build());

    assert_eq!(
        errors(&diags),
        vec!["Failed to read stream: Page number 255 is out of range; the file has 6 pages."]
    );
    let bad = diags.diags.iter().find(|d| d.is_error).unwrap();
    assert_eq!(bad.stream, Some(2));

    assert_eq!(infos(&diags), vec!["PDB file from VisualC++ 2.0"]);
    assert!(matches!(streams[2].kind, StreamKind::Unclassified));
    assert!(matches!(streams[3].kind, StreamKind::DebugInfo(_)));
}

#[test]
fn test_empty_fixed_streams_are_silent() {
    let mut b = PdbBuilder::new();
    b.stream_at(5, b"");

    let (streams, diags) = classify_image(b.build());

    assert!(diags.diags.is_empty());
    assert!(matches!(streams[5].kind, StreamKind::Unclassified));
}

#[test]
fn test_fpo_stream_found() {
    let mut b = PdbBuilder::new();
    b.stream_at(5, b"fpo data");

    let (streams, diags) = classify_image(b.build());

    assert_eq!(infos(&diags), vec!["Frame pointer omission stream found"]);
    assert!(matches!(streams[5].kind, StreamKind::Fpo));
}

#[test]
fn test_diag_display() {
    let mut diags = Diags::new();
    diags.info("PDB file from VisualC++ 6.0");
    diags.error("Failed to read stream: boom").stream(7);

    assert!(diags.has_errors());
    assert_eq!(diags.num_errors, 1);
    assert_eq!(
        format!("{diags}"),
        "PDB file from VisualC++ 6.0\nerror: Failed to read stream: boom\n  stream: 7\n"
    );
}
