//! Child → parent taxonomy index
//!
//! Loads NCBI `nodes.dmp`-style tables and answers ancestor queries.
//!
//! # File Format
//! Fields are separated by `\t|\t` and lines end with `\t|`. Only the first
//! two fields (taxon id, parent id) are read:
//!
//! ```text
//! 562	|	561	|	species	|	EC	|	...	|
//! ```

use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::TaxonomyError;

/// Parent id of the tree root. Walks stop here.
pub const ROOT_SENTINEL: &str = "1";

const FIELD_SEPARATOR: &str = "\t|\t";

/// Outcome of loading a taxonomy table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Nodes inserted
    pub loaded: usize,
    /// Non-empty lines without two fields
    pub skipped: usize,
}

/// Read-only child → parent mapping
#[derive(Debug, Default, Clone)]
pub struct TaxonomyIndex {
    parents: HashMap<String, String>,
}

impl TaxonomyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `(child, parent)` pairs
    pub fn from_pairs<I, C, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, P)>,
        C: Into<String>,
        P: Into<String>,
    {
        let mut index = Self::new();
        for (child, parent) in pairs {
            index.insert(child, parent);
        }
        index
    }

    /// Load a taxonomy file, decompressing `.gz` transparently
    pub fn load_path(path: impl AsRef<Path>) -> Result<(Self, LoadReport), TaxonomyError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading taxonomy");

        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let mut index = Self::new();
        let report = index.load(reader)?;
        Ok((index, report))
    }

    /// Read `child \t|\t parent ...` lines into the index.
    ///
    /// Later lines overwrite earlier ones for the same child.
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<LoadReport, TaxonomyError> {
        let mut report = LoadReport::default();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match parse_node_line(&line) {
                Some((child, parent)) => {
                    self.insert(child, parent);
                    report.loaded += 1;
                },
                None => {
                    warn!("Skipping taxonomy line {}: expected id and parent fields", line_num + 1);
                    report.skipped += 1;
                },
            }
        }

        info!(loaded = report.loaded, skipped = report.skipped, "Stored tax ids: {}", self.len());
        Ok(report)
    }

    pub fn insert(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.parents.insert(child.into(), parent.into());
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// True when `ancestor` lies strictly above `candidate`.
    ///
    /// The walk starts at the candidate's parent and ends at the root
    /// sentinel, so a taxon is not its own descendant and the sentinel never
    /// matches. Unknown ids end the walk with `false`. A walk longer than the
    /// number of known nodes can only be a cycle and fails with
    /// [`TaxonomyError::Cycle`].
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> Result<bool, TaxonomyError> {
        let limit = self.parents.len() + 1;
        let mut current = match self.parent(candidate) {
            Some(parent) => parent,
            None => return Ok(false),
        };
        let mut steps = 0usize;

        while current != ROOT_SENTINEL {
            if current == ancestor {
                return Ok(true);
            }
            steps += 1;
            if steps > limit {
                debug!(candidate, ancestor, steps, "Ancestor walk exceeded node count");
                return Err(TaxonomyError::Cycle {
                    candidate: candidate.to_string(),
                    limit,
                });
            }
            current = match self.parent(current) {
                Some(parent) => parent,
                None => return Ok(false),
            };
        }

        Ok(false)
    }
}

/// Split a `nodes.dmp` line into (id, parent)
fn parse_node_line(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.splitn(3, FIELD_SEPARATOR);
    let child = fields.next()?.trim();
    let parent = fields.next()?.trim().trim_end_matches('|').trim();

    if child.is_empty() || parent.is_empty() {
        return None;
    }
    Some((child, parent))
}
