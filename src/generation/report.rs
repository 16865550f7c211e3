// Evidence report for discovery-style queries
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::Result;
use crate::rag::Passage;

/// Plain-text report listing every retrieved passage in full
pub struct EvidenceReport {
    path: PathBuf,
}

impl EvidenceReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header and evidence items
    pub fn render(question: &str, passages: &[Passage], timestamp: DateTime<Local>) -> String {
        let mut out = String::new();
        out.push_str("LEGAL DISCOVERY REPORT\n");
        out.push_str(&format!("Query: {}\n", question));
        out.push_str(&format!("Timestamp: {}\n", timestamp.format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&"=".repeat(60));
        out.push_str("\n\n");

        for (index, passage) in passages.iter().enumerate() {
            out.push_str(&format!(
                "--- EVIDENCE ITEM #{} ---\n{}\n\n",
                index + 1,
                passage.text
            ));
        }
        out
    }

    /// Replace the report file with the evidence for `question`
    pub fn write(&self, question: &str, passages: &[Passage]) -> Result<()> {
        fs::write(&self.path, Self::render(question, passages, Local::now()))?;
        info!(path = %self.path.display(), items = passages.len(), "evidence report written");
        Ok(())
    }

    /// Append the generated answer
    pub fn append_summary(&self, answer: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        writeln!(file, "--- AI SUMMARY ---\n{}", answer.trim())?;
        Ok(())
    }
}
