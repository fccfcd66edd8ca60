//! Shared fixtures for ups-ingest integration tests
//!
//! Builds small UniRef100 documents and `nodes.dmp` files on disk so tests
//! can drive the real parser and SQLite store.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("ups_ingest=debug")
        .try_init();
}

/// One `<entry>` of a fixture document
#[derive(Debug, Clone)]
pub struct ClusterFixture {
    pub id: String,
    pub sequence: String,
    pub name: String,
    pub common_taxon: Option<String>,
    pub representative_taxon: Option<String>,
    pub uniref90: Option<String>,
    pub uniparc: Option<String>,
    pub accession: Option<String>,
    pub product: Option<String>,
    /// `(type, value)` properties placed on a non-representative member
    pub member_properties: Vec<(String, String)>,
}

impl ClusterFixture {
    pub fn new(id: &str, sequence: &str) -> Self {
        Self {
            id: id.to_string(),
            sequence: sequence.to_string(),
            name: format!("Cluster: protein {}", id),
            common_taxon: None,
            representative_taxon: None,
            uniref90: None,
            uniparc: None,
            accession: None,
            product: None,
            member_properties: Vec::new(),
        }
    }

    pub fn common_taxon(mut self, taxon: &str) -> Self {
        self.common_taxon = Some(taxon.to_string());
        self
    }

    pub fn representative_taxon(mut self, taxon: &str) -> Self {
        self.representative_taxon = Some(taxon.to_string());
        self
    }

    pub fn fragment(mut self) -> Self {
        self.name = format!("Cluster: protein {} (Fragment)", self.id);
        self
    }

    pub fn uniref90(mut self, id: &str) -> Self {
        self.uniref90 = Some(id.to_string());
        self
    }

    pub fn uniparc(mut self, id: &str) -> Self {
        self.uniparc = Some(id.to_string());
        self
    }

    pub fn accession(mut self, acc: &str) -> Self {
        self.accession = Some(acc.to_string());
        self
    }

    pub fn product(mut self, product: &str) -> Self {
        self.product = Some(product.to_string());
        self
    }

    pub fn member_property(mut self, kind: &str, value: &str) -> Self {
        self.member_properties.push((kind.to_string(), value.to_string()));
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = format!("<entry id=\"UniRef100_{}\" updated=\"2024-01-24\">\n", self.id);
        xml.push_str(&format!("  <name>{}</name>\n", self.name));
        xml.push_str("  <property type=\"member count\" value=\"2\"/>\n");
        if let Some(taxon) = &self.common_taxon {
            xml.push_str(&format!("  <property type=\"common taxon ID\" value=\"{}\"/>\n", taxon));
        }

        xml.push_str("  <representativeMember>\n");
        xml.push_str(&format!("    <dbReference type=\"UniProtKB ID\" id=\"{}_REP\">\n", self.id));
        let mut property = |kind: &str, value: &Option<String>| {
            if let Some(value) = value {
                xml.push_str(&format!("      <property type=\"{}\" value=\"{}\"/>\n", kind, value));
            }
        };
        property("UniProtKB accession", &self.accession);
        property("UniParc ID", &self.uniparc.as_ref().map(|id| format!("UPI{}", id)));
        property("UniRef90 ID", &self.uniref90.as_ref().map(|id| format!("UniRef90_{}", id)));
        property("protein name", &self.product);
        property("NCBI taxonomy", &self.representative_taxon);
        xml.push_str("    </dbReference>\n");
        xml.push_str(&format!(
            "    <sequence length=\"{}\" checksum=\"0000000000000000\">{}</sequence>\n",
            self.sequence.len(),
            self.sequence
        ));
        xml.push_str("  </representativeMember>\n");

        if !self.member_properties.is_empty() {
            xml.push_str("  <member>\n    <dbReference type=\"UniProtKB ID\" id=\"OTHER\">\n");
            for (kind, value) in &self.member_properties {
                xml.push_str(&format!("      <property type=\"{}\" value=\"{}\"/>\n", kind, value));
            }
            xml.push_str("    </dbReference>\n  </member>\n");
        }

        xml.push_str("</entry>\n");
        xml
    }
}

/// Wrap entries in a UniRef100 root element
pub fn uniref_document(entries: &[ClusterFixture]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\" ?>\n\
         <UniRef100 xmlns=\"http://uniprot.org/uniref\" releaseDate=\"2024-01-24\" version=\"2024_01\">\n",
    );
    for entry in entries {
        xml.push_str(&entry.to_xml());
    }
    xml.push_str("</UniRef100>\n");
    xml
}

pub fn gzip(contents: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Write `entries` as `uniref100.xml.gz` under `dir`
pub fn write_uniref(dir: &Path, entries: &[ClusterFixture]) -> PathBuf {
    let path = dir.join("uniref100.xml.gz");
    std::fs::write(&path, gzip(&uniref_document(entries))).unwrap();
    path
}

/// Write `(child, parent)` pairs as `nodes.dmp` under `dir`
pub fn write_nodes(dir: &Path, pairs: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("nodes.dmp");
    let mut contents = String::new();
    for (child, parent) in pairs {
        contents.push_str(&format!("{}\t|\t{}\t|\tno rank\t|\t\t|\t0\t|\n", child, parent));
    }
    std::fs::write(&path, contents).unwrap();
    path
}
