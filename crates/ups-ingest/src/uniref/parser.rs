//! Streaming UniRef100 XML parser
//!
//! Pulls `<entry>` elements one at a time out of a (usually gzipped) UniRef
//! document. Nothing is kept between entries except a reusable event buffer
//! and a small element stack, so memory stays flat however large the input.
//!
//! # Document Shape
//! ```xml
//! <UniRef100 xmlns="http://uniprot.org/uniref">
//!   <entry id="UniRef100_Q6GZX4">
//!     <name>Cluster: Putative transcription factor 001R</name>
//!     <property type="common taxon ID" value="10493"/>
//!     <representativeMember>
//!       <dbReference type="UniProtKB ID" id="001R_FRG3G">
//!         <property type="UniProtKB accession" value="Q6GZX4"/>
//!         <property type="UniParc ID" value="UPI00003B0FD4"/>
//!         <property type="UniRef90 ID" value="UniRef90_Q6GZX4"/>
//!         <property type="protein name" value="Putative transcription factor 001R"/>
//!         <property type="NCBI taxonomy" value="654924"/>
//!       </dbReference>
//!       <sequence length="256" checksum="B4840739BF7D4121">MAFSAEDVLK...</sequence>
//!     </representativeMember>
//!     <member>...</member>
//!   </entry>
//! </UniRef100>
//! ```
//!
//! Properties are only read directly under `<entry>` or under the
//! representative member's first `<dbReference>`; `<member>` subtrees are
//! skipped.

use flate2::read::MultiGzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use super::models::ClusterEntry;
use crate::error::ParseError;
use crate::taxonomy::ROOT_SENTINEL;

/// Namespace of UniRef XML documents
pub const UNIREF_NAMESPACE: &str = "http://uniprot.org/uniref";

const ENTRY_TAG: &[u8] = b"entry";
const FRAGMENT_MARKER: &str = "Fragment";

const UNIREF100_PREFIX: &str = "UniRef100_";
const UNIREF90_PREFIX: &str = "UniRef90_";
const UNIPARC_PREFIX: &str = "UPI";

/// Decompressed read buffer
const READ_BUFFER_CAPACITY: usize = 1 << 20;

/// Event buffer capacity kept between entries; anything larger is released
const RETAINED_BUFFER_CAPACITY: usize = 64 * 1024;

/// Where the reader currently is inside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Entry,
    Name,
    RepresentativeMember,
    RepresentativeReference,
    RepresentativeSequence,
    Other,
}

/// Lazy, single-pass sequence of cluster entries.
///
/// Yields `Err` at most once; the stream is finished afterwards.
pub struct ClusterEntryStream<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    stack: Vec<Scope>,
    entries_read: u64,
    finished: bool,
}

impl ClusterEntryStream<Box<dyn BufRead + Send>> {
    /// Open a UniRef XML file, decompressing `.gz` transparently
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening UniRef XML");

        let file = File::open(path)?;
        let reader: Box<dyn BufRead + Send> =
            if path.extension().and_then(|s| s.to_str()) == Some("gz") {
                Box::new(BufReader::with_capacity(READ_BUFFER_CAPACITY, MultiGzDecoder::new(file)))
            } else {
                Box::new(BufReader::with_capacity(READ_BUFFER_CAPACITY, file))
            };

        Ok(Self::new(reader))
    }
}

impl<T: Read> ClusterEntryStream<BufReader<MultiGzDecoder<T>>> {
    /// Wrap a gzip-compressed byte source
    pub fn from_gzip(source: T) -> Self {
        Self::new(BufReader::with_capacity(READ_BUFFER_CAPACITY, MultiGzDecoder::new(source)))
    }
}

impl<R: BufRead> ClusterEntryStream<R> {
    /// Wrap an uncompressed XML source
    pub fn new(source: R) -> Self {
        let mut reader = NsReader::from_reader(source);
        reader.config_mut().trim_text(true);

        Self {
            reader,
            buf: Vec::with_capacity(RETAINED_BUFFER_CAPACITY),
            stack: Vec::with_capacity(8),
            entries_read: 0,
            finished: false,
        }
    }

    /// Entries produced so far
    pub fn entries_read(&self) -> u64 {
        self.entries_read
    }

    fn byte_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Advance to the next `<entry>` and parse it
    fn next_entry(&mut self) -> Result<Option<ClusterEntry>, ParseError> {
        loop {
            self.buf.clear();
            let position = self.byte_position();

            let found = {
                let (ns, event) = self
                    .reader
                    .read_resolved_event_into(&mut self.buf)
                    .map_err(|e| xml_error(position, e))?;
                match event {
                    Event::Start(ref e) if is_entry(&ns, e) => Found::Entry(attribute(e, b"id")),
                    Event::Empty(ref e) if is_entry(&ns, e) => Found::EmptyEntry(attribute(e, b"id")),
                    Event::Eof => Found::Eof,
                    _ => Found::Skip,
                }
            };

            match found {
                Found::Entry(id) => {
                    let entry = self.read_entry(id)?;
                    self.entries_read += 1;
                    self.release_buffer();
                    return Ok(Some(entry));
                },
                Found::EmptyEntry(id) => {
                    let cluster = self.cluster_id(id)?;
                    return Err(ParseError::MissingField {
                        field: "representative sequence",
                        cluster,
                    });
                },
                Found::Eof => {
                    debug!(entries = self.entries_read, "Reached end of UniRef XML");
                    return Ok(None);
                },
                Found::Skip => {},
            }
        }
    }

    /// Consume one entry subtree; the start tag has already been read
    fn read_entry(&mut self, raw_id: Option<String>) -> Result<ClusterEntry, ParseError> {
        let cluster_id = self.cluster_id(raw_id)?;
        let mut builder = EntryBuilder::default();

        self.stack.clear();
        self.stack.push(Scope::Entry);

        while let Some(&parent) = self.stack.last() {
            self.buf.clear();
            let position = self.byte_position();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| xml_error(position, e))?;

            match event {
                Event::Start(ref e) => {
                    let scope = builder.enter(parent, e);
                    self.stack.push(scope);
                },
                Event::Empty(ref e) => {
                    builder.enter(parent, e);
                },
                Event::Text(ref t) if matches!(parent, Scope::Name | Scope::RepresentativeSequence) => {
                    let text = t.unescape().map_err(|e| xml_error(position, e))?;
                    builder.push_text(parent, &text);
                },
                Event::End(_) => {
                    self.stack.pop();
                },
                Event::Eof => return Err(ParseError::Truncated { cluster: cluster_id }),
                _ => {},
            }
        }

        builder.build(cluster_id)
    }

    fn cluster_id(&self, raw_id: Option<String>) -> Result<String, ParseError> {
        match raw_id {
            Some(id) => Ok(strip_prefix(id, UNIREF100_PREFIX)),
            None => Err(ParseError::MissingField {
                field: "cluster id",
                cluster: format!("#{}", self.entries_read + 1),
            }),
        }
    }

    /// Drop whatever an unusually large entry made the buffer grow to
    fn release_buffer(&mut self) {
        self.buf.clear();
        self.buf.shrink_to(RETAINED_BUFFER_CAPACITY);
    }
}

impl<R: BufRead> Iterator for ClusterEntryStream<R> {
    type Item = Result<ClusterEntry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            },
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            },
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for ClusterEntryStream<R> {}

enum Found {
    Entry(Option<String>),
    EmptyEntry(Option<String>),
    Eof,
    Skip,
}

/// Fields collected while walking one entry
#[derive(Default)]
struct EntryBuilder {
    name: String,
    sequence: String,
    declared_length: Option<String>,
    common_taxon_id: Option<String>,
    representative_taxon_id: Option<String>,
    uniref90_id: Option<String>,
    uniparc_id: Option<String>,
    uniprotkb_acc: Option<String>,
    product: Option<String>,
    seen_reference: bool,
    seen_sequence: bool,
}

impl EntryBuilder {
    /// Handle an opening or empty tag under `parent`; returns the child scope
    fn enter(&mut self, parent: Scope, e: &BytesStart) -> Scope {
        let local = e.local_name();
        match (parent, local.as_ref()) {
            (_, b"property") => {
                self.apply_property(parent, e);
                Scope::Other
            },
            (Scope::Entry, b"name") => Scope::Name,
            (Scope::Entry, b"representativeMember") => Scope::RepresentativeMember,
            (Scope::RepresentativeMember, b"dbReference") if !self.seen_reference => {
                self.seen_reference = true;
                Scope::RepresentativeReference
            },
            (Scope::RepresentativeMember, b"sequence") if !self.seen_sequence => {
                self.seen_sequence = true;
                self.declared_length = attribute(e, b"length");
                Scope::RepresentativeSequence
            },
            _ => Scope::Other,
        }
    }

    fn apply_property(&mut self, parent: Scope, e: &BytesStart) {
        let (Some(kind), Some(value)) = (attribute(e, b"type"), attribute(e, b"value")) else {
            return;
        };

        let slot = match (parent, kind.as_str()) {
            (Scope::Entry, "common taxon ID") => &mut self.common_taxon_id,
            (Scope::RepresentativeReference, "NCBI taxonomy") => &mut self.representative_taxon_id,
            (Scope::RepresentativeReference, "UniRef90 ID") => &mut self.uniref90_id,
            (Scope::RepresentativeReference, "UniParc ID") => &mut self.uniparc_id,
            (Scope::RepresentativeReference, "UniProtKB accession") => &mut self.uniprotkb_acc,
            (Scope::RepresentativeReference, "protein name") => &mut self.product,
            _ => return,
        };

        // first occurrence wins
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn push_text(&mut self, scope: Scope, text: &str) {
        match scope {
            Scope::Name => self.name.push_str(text),
            Scope::RepresentativeSequence => self.sequence.extend(
                text.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| c.to_ascii_uppercase()),
            ),
            _ => {},
        }
    }

    fn build(self, cluster_id: String) -> Result<ClusterEntry, ParseError> {
        if self.sequence.is_empty() {
            return Err(ParseError::MissingField {
                field: "representative sequence",
                cluster: cluster_id,
            });
        }

        let counted = self.sequence.chars().count() as u32;
        let length = match self.declared_length.as_deref().map(str::parse::<u32>) {
            Some(Ok(length)) => length,
            _ => {
                warn!(
                    cluster = %cluster_id,
                    declared = ?self.declared_length,
                    "Missing or invalid sequence length, using counted length {}",
                    counted
                );
                counted
            },
        };

        Ok(ClusterEntry {
            is_fragment: self.name.contains(FRAGMENT_MARKER),
            common_taxon_id: self
                .common_taxon_id
                .unwrap_or_else(|| ROOT_SENTINEL.to_string()),
            representative_taxon_id: self
                .representative_taxon_id
                .unwrap_or_else(|| ROOT_SENTINEL.to_string()),
            sequence: self.sequence,
            length,
            uniref90_id: self.uniref90_id.map(|id| strip_prefix(id, UNIREF90_PREFIX)),
            uniparc_id: self.uniparc_id.map(|id| strip_prefix(id, UNIPARC_PREFIX)),
            uniprotkb_acc: self.uniprotkb_acc,
            product: self.product,
            cluster_id,
        })
    }
}

fn is_entry(ns: &ResolveResult, e: &BytesStart) -> bool {
    e.local_name().as_ref() == ENTRY_TAG
        && matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == UNIREF_NAMESPACE.as_bytes())
}

/// Trimmed, unescaped attribute value; malformed or blank values count as absent
fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

fn strip_prefix(value: String, prefix: &str) -> String {
    match value.strip_prefix(prefix) {
        Some(rest) => rest.to_string(),
        None => value,
    }
}

fn xml_error(position: u64, err: impl Into<quick_xml::Error>) -> ParseError {
    ParseError::Xml {
        position,
        source: err.into(),
    }
}
