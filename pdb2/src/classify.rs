//! Classifies the streams of a PDB 2.00 file
//!
//! Stream indexes 0 through 5 have fixed roles in version 2.00 files: the stream directory
//! copy, the PDB Information Stream, the TPI, the DBI, and the FPO data stream. Streams past
//! the fixed range have no fixed meaning; they are recognized by matching their index
//! against the symbol stream indexes found in the DBI stream header.
//!
//! Because of that, classification is ordered and stateful. The PDB Information Stream
//! decides which DBI header layout is in use, and the DBI stream decides which of the later
//! streams hold symbols. Walking the directory in index order satisfies both dependencies.

use crate::dbi::{self, DbiStreamHeader, DbiStreamInfo, OldDbiStreamHeader, DBI_STREAM_SIGNATURE};
use crate::diag::Diags;
use crate::guid::GuidLe;
use crate::pdbi::{self, PdbiStream, PdbiStreamHeader};
use crate::stream_index::Stream;
use crate::tpi::{self, TypeStreamHeader};
use crate::Pdb2;
use ms_pdb2_msf::Msf2;
use sync_file::ReadAt;
use tracing::{debug, trace_span};
use zerocopy::FromBytes;

/// The role a symbol stream fills, as declared by the DBI stream header.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SymbolStreamRole {
    /// The stream holds global symbols.
    Global,
    /// The stream holds private symbols.
    Private,
    /// The stream holds symbol records.
    Symbols,
}

/// What a stream turned out to contain.
#[derive(Clone, Debug)]
pub enum StreamKind {
    /// Stream 0: a copy of the stream directory.
    RootCopy,
    /// Stream 1: the PDB Information Stream.
    PdbInfo(PdbiStream),
    /// Stream 2: the Type Information Stream.
    TypeInfo(TypeStreamHeader),
    /// Stream 3: the Debug Information Stream.
    DebugInfo(DbiStreamInfo),
    /// Stream 5: the frame pointer omission data stream.
    Fpo,
    /// A stream whose index matches one of the symbol stream indexes declared by the DBI
    /// stream header.
    Symbols(SymbolStreamRole),
    /// Everything else: empty streams, streams with no recognized role, and streams whose
    /// contents failed validation.
    Unclassified,
}

/// A directory entry together with what classification found in it.
#[derive(Clone, Debug)]
pub struct ClassifiedStream {
    /// Index of the stream in the stream directory.
    pub stream: u32,
    /// What the stream contains.
    pub kind: StreamKind,
}

/// State carried from one classification step to the next.
///
/// The PDB version comes from stream 1 and selects the DBI header layout used by stream 3.
/// The symbol stream indexes come from stream 3 and are matched against the indexes of
/// later streams.
#[derive(Clone, Debug)]
struct ClassifierState {
    pdb_version: u32,
    global_symbols_stream: Option<u32>,
    private_symbols_stream: Option<u32>,
    symbols_stream: Option<u32>,
}

impl ClassifierState {
    fn new() -> Self {
        ClassifierState {
            // Until stream 1 says otherwise, assume the oldest release.
            pdb_version: pdbi::PDBI_VERSION_VC2,
            global_symbols_stream: None,
            private_symbols_stream: None,
            symbols_stream: None,
        }
    }
}

impl<F: ReadAt> Pdb2<F> {
    /// Walks the stream directory in index order, reads each stream, and reports what it
    /// contains.
    ///
    /// Findings go to `diags`: recognized contents on the informational channel, contents
    /// that failed validation on the error channel. A stream that fails validation stops
    /// being interpreted, but never stops the walk; every directory entry gets a
    /// [`ClassifiedStream`] in the returned list.
    ///
    /// Streams with no pages (empty or nil directory entries) are not read and produce no
    /// findings.
    pub fn classify_streams(&self, diags: &mut Diags) -> Vec<ClassifiedStream> {
        let _span = trace_span!("classify_streams").entered();

        let num_streams = self.num_streams();
        let mut state = ClassifierState::new();
        let mut classified = Vec::with_capacity(num_streams as usize);

        for stream in 0..num_streams {
            let (next_state, kind) = classify_stream(self.msf(), stream, state, diags);
            state = next_state;
            classified.push(ClassifiedStream { stream, kind });
        }

        classified
    }
}

fn classify_stream<F: ReadAt>(
    msf: &Msf2<F>,
    stream: u32,
    state: ClassifierState,
    diags: &mut Diags,
) -> (ClassifierState, StreamKind) {
    // The walk only visits indexes the directory defines.
    let Ok((stream_size, stream_pages)) = msf.stream_size_and_pages(stream) else {
        return (state, StreamKind::Unclassified);
    };

    debug!(
        stream,
        stream_size,
        num_pages = stream_pages.len(),
        pages = ?stream_pages,
        "directory entry"
    );

    // A stream with no pages has nothing to look at. This covers both empty streams and
    // nil (free) directory entries.
    if stream_pages.is_empty() {
        return (state, StreamKind::Unclassified);
    }

    let stream_data = match msf.read_stream_to_vec(stream) {
        Ok(data) => data,
        Err(e) => {
            diags.error(format!("Failed to read stream: {e:#}")).stream(stream);
            return (state, StreamKind::Unclassified);
        }
    };

    match Stream::new(stream as u16) {
        Some(Stream::ROOT) => (state, classify_root_copy(msf, &stream_data, diags)),
        Some(Stream::PDB) => classify_pdb_info(state, &stream_data, diags),
        Some(Stream::TPI) => (state, classify_type_info(&stream_data, diags)),
        Some(Stream::DBI) => classify_debug_info(state, &stream_data, diags),
        Some(Stream::FPO) => {
            diags.info("Frame pointer omission stream found");
            (state, StreamKind::Fpo)
        }
        _ => {
            let kind = classify_other(&state, stream, msf.num_streams(), diags);
            (state, kind)
        }
    }
}

/// Stream 0 duplicates the stream directory. Only its size is checked.
fn classify_root_copy<F: ReadAt>(
    msf: &Msf2<F>,
    stream_data: &[u8],
    diags: &mut Diags,
) -> StreamKind {
    if stream_data.len() != msf.root_stream_size() as usize {
        diags.error("Mismatching root stream and copy root stream sizes");
    }
    StreamKind::RootCopy
}

fn classify_pdb_info(
    state: ClassifierState,
    stream_data: &[u8],
    diags: &mut Diags,
) -> (ClassifierState, StreamKind) {
    let Ok((header, rest)) = PdbiStreamHeader::ref_from_prefix(stream_data) else {
        diags.error("PDB header stream too small to contain its header");
        return (state, StreamKind::Unclassified);
    };

    let version = header.version.get();
    match pdbi::pdbi_version_release(version) {
        Some(release) => {
            diags.info(format!("PDB file from VisualC++ {release}"));
        }
        None => {
            diags.info(format!("Unknown VisualC++ release: {version}"));
        }
    }

    let state = ClassifierState {
        pdb_version: version,
        ..state
    };

    let unique_id = if pdbi::pdbi_has_unique_id(version) {
        let Ok((guid, _)) = GuidLe::ref_from_prefix(rest) else {
            diags.error("PDB header stream too small to contain its extended header");
            return (state, StreamKind::Unclassified);
        };

        let uuid = guid.get();
        diags.info(format!("PDB ID: {:X}{}", uuid.simple(), header.age.get()));
        Some(uuid)
    } else {
        None
    };

    let info = PdbiStream {
        version,
        signature: header.signature.get(),
        age: header.age.get(),
        unique_id,
    };
    (state, StreamKind::PdbInfo(info))
}

fn classify_type_info(stream_data: &[u8], diags: &mut Diags) -> StreamKind {
    let Ok((header, _)) = TypeStreamHeader::ref_from_prefix(stream_data) else {
        diags.error("TPI stream too small to contain its header");
        return StreamKind::Unclassified;
    };

    let version = header.version.get();
    match tpi::tpi_version_release(version) {
        Some(release) => {
            diags.info(format!("TPI stream from VisualC++ {release}"));
        }
        None => {
            diags.info(format!("Unknown VisualC++ release: {version}"));
        }
    }

    if header.type_record_bytes.get() == 0 {
        if header.type_index_begin.get() != header.type_index_end.get() {
            diags.info("Corrupted header. No types information space whereas there are entries");
            return StreamKind::Unclassified;
        }
        diags.info("No types information stored");
        return StreamKind::TypeInfo(header.clone());
    }

    diags.info(format!("Min Type Info: {}", header.type_index_begin.get()));
    diags.info(format!("Max Type Info: {}", header.type_index_end.get()));

    // The type records follow the header, so both have to fit in the stream.
    if u64::from(header.header_size.get()) + u64::from(header.type_record_bytes.get())
        > stream_data.len() as u64
    {
        diags.error("TPI stream isn't big enough to store types information");
        return StreamKind::Unclassified;
    }

    StreamKind::TypeInfo(header.clone())
}

fn classify_debug_info(
    state: ClassifierState,
    stream_data: &[u8],
    diags: &mut Diags,
) -> (ClassifierState, StreamKind) {
    if state.pdb_version > pdbi::PDBI_VERSION_VC4 {
        let Ok((header, _)) = DbiStreamHeader::ref_from_prefix(stream_data) else {
            diags.error("DBI stream too small to contain its header");
            return (state, StreamKind::Unclassified);
        };

        let signature = header.signature.get();
        if signature != DBI_STREAM_SIGNATURE {
            diags.error(format!("Invalid signature for DBI stream: {signature}"));
            return (state, StreamKind::Unclassified);
        }

        let version = header.version.get();
        match dbi::dbi_version_release(version) {
            Some(release) => {
                diags.info(format!("DBI stream from VisualC++ {release}"));
            }
            None => {
                diags.info(format!("Unknown VisualC++ release: {version}"));
            }
        }

        let info = DbiStreamInfo {
            version: Some(version),
            age: Some(header.age.get()),
            global_symbols_stream: header.global_symbols_stream.get(),
            private_symbols_stream: header.private_symbols_stream.get(),
            symbols_stream: header.symbols_stream.get(),
        };
        let state = ClassifierState {
            global_symbols_stream: info.global_symbols_stream,
            private_symbols_stream: info.private_symbols_stream,
            symbols_stream: info.symbols_stream,
            ..state
        };
        (state, StreamKind::DebugInfo(info))
    } else {
        let Ok((header, _)) = OldDbiStreamHeader::ref_from_prefix(stream_data) else {
            diags.error("DBI stream too small to contain its header");
            return (state, StreamKind::Unclassified);
        };

        let info = DbiStreamInfo {
            version: None,
            age: None,
            global_symbols_stream: header.global_symbols_stream.get(),
            private_symbols_stream: header.private_symbols_stream.get(),
            symbols_stream: header.symbols_stream.get(),
        };
        let state = ClassifierState {
            global_symbols_stream: info.global_symbols_stream,
            private_symbols_stream: info.private_symbols_stream,
            symbols_stream: info.symbols_stream,
            ..state
        };
        (state, StreamKind::DebugInfo(info))
    }
}

fn classify_other(
    state: &ClassifierState,
    stream: u32,
    num_streams: u32,
    diags: &mut Diags,
) -> StreamKind {
    if is_symbol_stream(state.global_symbols_stream, stream, num_streams) {
        diags.info("Global symbols stream found");
        StreamKind::Symbols(SymbolStreamRole::Global)
    } else if is_symbol_stream(state.private_symbols_stream, stream, num_streams) {
        diags.info("Private symbols stream found");
        StreamKind::Symbols(SymbolStreamRole::Private)
    } else if is_symbol_stream(state.symbols_stream, stream, num_streams) {
        diags.info("Symbols stream found");
        StreamKind::Symbols(SymbolStreamRole::Symbols)
    } else {
        StreamKind::Unclassified
    }
}

/// A symbol stream index declared by the DBI header only counts if it refers to a real
/// directory entry past the fixed streams.
fn is_symbol_stream(declared: Option<u32>, stream: u32, num_streams: u32) -> bool {
    match declared {
        Some(index) => index == stream && index < num_streams && index > u32::from(Stream::FPO),
        None => false,
    }
}
