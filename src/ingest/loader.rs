// Source loading: CSV rows and plain-text files -> chunk strings
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::chunker::SmartChunker;
use super::email::{truncate_chars, EmailNormalizer};
use crate::config::ChunkingConfig;
use crate::errors::{RagError, Result};
use crate::nlp::Analyzer;

/// Column preference for the row body, first non-empty wins
pub const FIELD_PREFERENCE: [&str; 5] = ["message", "body", "text", "Fact", "content"];

/// `[Unit - Subtopic]` category tag for rows carrying a `Fact` field
fn fact_tag(unit: Option<&str>, subtopic: Option<&str>) -> String {
    format!(
        "[{} - {}]",
        unit.unwrap_or("General"),
        subtopic.unwrap_or("Info")
    )
}

/// How non-CSV files are split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Follow `chunking.prose` from the configuration
    #[default]
    Auto,
    /// Sentence-aligned overlapping chunks
    Prose,
    /// Blank-line separated paragraphs
    Paragraphs,
}

/// One CSV row, classified by the column that supplied its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Fact {
        fact: String,
        unit: Option<String>,
        subtopic: Option<String>,
    },
    Email {
        raw: String,
    },
    Text {
        text: String,
    },
}

impl Row {
    /// Raw body length used for the minimum-length filter
    pub fn body_chars(&self) -> usize {
        match self {
            Row::Fact { fact, .. } => fact.chars().count(),
            Row::Email { raw } => raw.chars().count(),
            Row::Text { text } => text.chars().count(),
        }
    }
}

/// Counters reported after loading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub too_short: usize,
    pub duplicates: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedSource {
    pub chunks: Vec<String>,
    pub stats: LoadStats,
}

/// Normalizes heterogeneous inputs into chunk strings
pub struct SourceLoader {
    config: ChunkingConfig,
    analyzer: Arc<dyn Analyzer>,
    chunker: SmartChunker,
    email: EmailNormalizer,
}

impl SourceLoader {
    pub fn new(config: ChunkingConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        let chunker = SmartChunker::new(config.chunk_size_words, config.overlap_words);
        Self {
            config,
            analyzer,
            chunker,
            email: EmailNormalizer::new(),
        }
    }

    /// Load `path`, dispatching on its extension
    pub fn load(&self, path: &Path, mode: SourceMode) -> Result<LoadedSource> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        let loaded = if is_csv {
            self.load_csv(path)?
        } else {
            self.load_text(path, mode)?
        };

        info!(
            path = %path.display(),
            chunks = loaded.chunks.len(),
            duplicates = loaded.stats.duplicates,
            too_short = loaded.stats.too_short,
            malformed = loaded.stats.malformed,
            "source loaded"
        );
        Ok(loaded)
    }

    fn load_csv(&self, path: &Path) -> Result<LoadedSource> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| match e.into_kind() {
                csv::ErrorKind::Io(io) => RagError::Io(io),
                other => RagError::MalformedSource(format!("{:?}", other)),
            })?;

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let preference: Vec<(&str, usize)> = FIELD_PREFERENCE
            .iter()
            .filter_map(|name| column(name).map(|index| (*name, index)))
            .collect();
        if preference.is_empty() {
            return Err(RagError::MalformedSource(format!(
                "{} has none of the columns {:?}",
                path.display(),
                FIELD_PREFERENCE
            )));
        }
        let fact_col = column("Fact");
        let unit_col = column("Unit");
        let subtopic_col = column("Subtopic");

        let mut out = Deduplicator::default();
        let mut stats = LoadStats::default();

        for (line, record) in reader.byte_records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    stats.malformed += 1;
                    warn!(row = line + 1, error = %e, "skipping unreadable CSV record");
                    continue;
                }
            };
            stats.rows += 1;

            let field = |index: Option<usize>| -> Option<String> {
                let bytes = record.get(index?)?;
                let value = String::from_utf8_lossy(bytes).trim().to_string();
                (!value.is_empty()).then_some(value)
            };

            let Some(row) = preference.iter().find_map(|(name, index)| {
                field(Some(*index)).map(|body| self.classify(name, body, &field, unit_col, subtopic_col))
            }) else {
                stats.too_short += 1;
                continue;
            };

            if row.body_chars() < self.config.min_chunk_chars {
                stats.too_short += 1;
                continue;
            }

            let tag = (!matches!(row, Row::Fact { .. }) && field(fact_col).is_some())
                .then(|| fact_tag(field(unit_col).as_deref(), field(subtopic_col).as_deref()));
            let text = match tag {
                Some(tag) => truncate_chars(
                    &format!("{} {}", tag, self.row_text(row)),
                    self.config.max_chunk_chars,
                ),
                None => self.row_text(row),
            };
            if !out.push(text) {
                stats.duplicates += 1;
            }
        }

        Ok(LoadedSource {
            chunks: out.chunks,
            stats,
        })
    }

    fn classify(
        &self,
        name: &str,
        body: String,
        field: &dyn Fn(Option<usize>) -> Option<String>,
        unit_col: Option<usize>,
        subtopic_col: Option<usize>,
    ) -> Row {
        match name {
            "Fact" => Row::Fact {
                fact: body,
                unit: field(unit_col),
                subtopic: field(subtopic_col),
            },
            "message" => Row::Email { raw: body },
            _ if self.config.clean_email_bodies => Row::Email { raw: body },
            _ => Row::Text { text: body },
        }
    }

    /// Final chunk text for a row
    pub fn row_text(&self, row: Row) -> String {
        let max = self.config.max_chunk_chars;
        match row {
            Row::Fact {
                fact,
                unit,
                subtopic,
            } => {
                let tagged = format!(
                    "{} {}",
                    fact_tag(unit.as_deref(), subtopic.as_deref()),
                    fact
                );
                truncate_chars(&tagged, max)
            }
            Row::Email { raw } => self.email.normalize(&raw, max),
            Row::Text { text } => truncate_chars(&text, max),
        }
    }

    fn load_text(&self, path: &Path, mode: SourceMode) -> Result<LoadedSource> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes).replace("\r\n", "\n");

        let prose = match mode {
            SourceMode::Auto => self.config.prose,
            SourceMode::Prose => true,
            SourceMode::Paragraphs => false,
        };
        debug!(path = %path.display(), prose, "splitting text source");

        let pieces: Vec<String> = if prose {
            self.chunker.chunk(self.analyzer.as_ref(), &text)
        } else {
            split_paragraphs(&text)
        };

        let mut out = Deduplicator::default();
        let mut stats = LoadStats::default();
        for piece in pieces {
            stats.rows += 1;
            if piece.chars().count() < self.config.min_chunk_chars {
                stats.too_short += 1;
                continue;
            }
            if !out.push(truncate_chars(&piece, self.config.max_chunk_chars)) {
                stats.duplicates += 1;
            }
        }

        Ok(LoadedSource {
            chunks: out.chunks,
            stats,
        })
    }
}

/// Blank-line separated, trimmed paragraphs
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keeps the first occurrence of each chunk text
#[derive(Default)]
struct Deduplicator {
    seen: HashSet<[u8; 32]>,
    chunks: Vec<String>,
}

impl Deduplicator {
    fn push(&mut self, text: String) -> bool {
        let digest: [u8; 32] = Sha256::digest(text.as_bytes()).into();
        if !self.seen.insert(digest) {
            return false;
        }
        self.chunks.push(text);
        true
    }
}
