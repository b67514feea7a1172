// lib.rs - header rewriting core

use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Recognized FASTA file extensions for output naming.
pub const FASTA_EXTENSIONS: &[&str] = &[".fa", ".fasta", ".fsa", ".fna", ".ffn", ".faa"];

/// Suffix appended to the input stem when the output name is derived.
pub const OUTPUT_SUFFIX: &str = "_Tax_Headers.fa";

/// Source database the FASTA file originates from. Each database encodes
/// taxonomy information in its headers differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Database {
    Ncbi,
    Uniref,
    Ensembl,
    Gencode,
}

/// Header rewriter resolved from the database and the optional
/// user-supplied taxonomy. Ensembl and Gencode carry the normalized
/// taxonomy; NCBI and UniRef extract it from each header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewriter {
    Ncbi,
    Uniref,
    Ensembl { taxonomy: String },
    Gencode { taxonomy: String },
}

/// One rewritten header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenHeader {
    pub line: String,
    /// False when no taxonomy could be extracted and the header passed
    /// through without a prefix (NCBI/UniRef only).
    pub tagged: bool,
}

// Last square-bracketed group at the end of an NCBI header,
// e.g. "... [Homo sapiens]".
static NCBI_TAXON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]\s*$").unwrap());
static NCBI_TRAILER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\[[^\[\]]+\]\s*$").unwrap());
static UNIREF_TAXID: Lazy<Regex> = Lazy::new(|| Regex::new(r"TaxID=(\d+)").unwrap());

impl Rewriter {
    /// Resolve the rewriter for a database, enforcing the taxonomy flag
    /// contract: required and non-empty for Ensembl/Gencode, must be
    /// absent for NCBI/UniRef.
    pub fn new(database: Database, taxonomy: Option<&str>) -> Result<Self> {
        match database {
            Database::Ncbi | Database::Uniref => {
                if taxonomy.is_some() {
                    bail!("the --taxonomy flag must not be provided for NCBI or UniRef FASTA files");
                }
                Ok(if database == Database::Ncbi {
                    Rewriter::Ncbi
                } else {
                    Rewriter::Uniref
                })
            }
            Database::Ensembl | Database::Gencode => {
                let taxonomy = taxonomy.map(normalize_taxonomy).unwrap_or_default();
                if taxonomy.is_empty() {
                    bail!("the --taxonomy flag is required for ENSEMBL and Gencode FASTA files");
                }
                Ok(if database == Database::Ensembl {
                    Rewriter::Ensembl { taxonomy }
                } else {
                    Rewriter::Gencode { taxonomy }
                })
            }
        }
    }

    /// Rewrite one raw header line (leading '>' included, terminator not).
    pub fn rewrite(&self, header: &str) -> RewrittenHeader {
        let body = header.trim_start_matches('>').trim();
        match self {
            Rewriter::Ncbi => rewrite_ncbi(body),
            Rewriter::Uniref => rewrite_uniref(body),
            Rewriter::Ensembl { taxonomy } | Rewriter::Gencode { taxonomy } => RewrittenHeader {
                line: format!(">{taxonomy}:{body}"),
                tagged: true,
            },
        }
    }
}

fn rewrite_ncbi(body: &str) -> RewrittenHeader {
    match NCBI_TAXON.captures(body) {
        Some(caps) => {
            let taxonomy = caps[1].replace(' ', "_");
            let rest = NCBI_TRAILER.replace(body, "");
            RewrittenHeader {
                line: format!(">{taxonomy}:{}", rest.trim()),
                tagged: true,
            }
        }
        None => RewrittenHeader {
            line: format!(">{body}"),
            tagged: false,
        },
    }
}

fn rewrite_uniref(body: &str) -> RewrittenHeader {
    match UNIREF_TAXID.captures(body) {
        Some(caps) => RewrittenHeader {
            line: format!(">TaxID_{}:{body}", &caps[1]),
            tagged: true,
        },
        None => RewrittenHeader {
            line: format!(">{body}"),
            tagged: false,
        },
    }
}

/// Trim a user-supplied taxonomy and turn spaces into underscores,
/// e.g. "Homo sapiens" -> "Homo_sapiens".
pub fn normalize_taxonomy(taxonomy: &str) -> String {
    taxonomy.trim().replace(' ', "_")
}

/// Counters reported after a rewrite pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    /// Records seen (one per input header line).
    pub records: usize,
    /// Headers that passed through without a taxonomy prefix.
    pub untagged: usize,
}

/// Stream `reader` line by line, rewriting each header through `rewriter`
/// and copying sequence lines through byte for byte.
///
/// A record is held back until the next header (or end of input) arrives,
/// so an input with no header at all produces no output, and lines before
/// the first header are discarded.
pub fn rewrite_records<R: BufRead, W: Write>(
    mut reader: R,
    writer: &mut W,
    rewriter: &Rewriter,
) -> Result<RewriteStats> {
    let mut stats = RewriteStats::default();
    let mut current_header: Option<Vec<u8>> = None;
    let mut pending: Vec<u8> = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.starts_with(b">") {
            if let Some(header) = current_header.take() {
                writer.write_all(&header)?;
                writer.write_all(&pending)?;
            }
            pending.clear();
            current_header = Some(rewrite_header_line(&line, rewriter, &mut stats));
            stats.records += 1;
        } else {
            pending.extend_from_slice(&line);
        }
    }
    if let Some(header) = current_header {
        writer.write_all(&header)?;
        writer.write_all(&pending)?;
    }
    Ok(stats)
}

// Rewrites the text of a header line while keeping its own terminator
// (LF, CRLF, or none at end of file).
fn rewrite_header_line(raw: &[u8], rewriter: &Rewriter, stats: &mut RewriteStats) -> Vec<u8> {
    let (text, eol) = split_eol(raw);
    let rewritten = rewriter.rewrite(&String::from_utf8_lossy(text));
    if !rewritten.tagged {
        stats.untagged += 1;
    }
    let mut out = rewritten.line.into_bytes();
    out.extend_from_slice(eol);
    out
}

fn split_eol(line: &[u8]) -> (&[u8], &[u8]) {
    if line.ends_with(b"\r\n") {
        line.split_at(line.len() - 2)
    } else if line.ends_with(b"\n") {
        line.split_at(line.len() - 1)
    } else {
        (line, b"")
    }
}

/// Resolve the output file path from the input path and the optional
/// --output value, which may name a file or a directory.
pub fn resolve_output_path(input: &Path, output: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .unwrap_or_else(|| OsStr::new("output"))
        .to_string_lossy();
    let derived_name = format!("{stem}{OUTPUT_SUFFIX}");

    match output {
        None => input
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(derived_name),
        Some(out) => {
            let path = Path::new(out);
            if out.ends_with('/') || out.ends_with(std::path::MAIN_SEPARATOR) || path.is_dir() {
                path.join(derived_name)
            } else if has_fasta_extension(out) {
                path.to_path_buf()
            } else {
                PathBuf::from(format!("{out}.fa"))
            }
        }
    }
}

fn has_fasta_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    FASTA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
