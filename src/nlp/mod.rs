//! Sentence segmentation and named-entity recognition
//!
//! The `Analyzer` trait is the seam for any NLP backend; `HeuristicAnalyzer`
//! is the built-in rule-based binding.

pub mod heuristic;
pub mod stopwords;

pub use heuristic::HeuristicAnalyzer;
pub use stopwords::is_stop_word;

use std::fmt;
use std::str::FromStr;

/// Closed set of entity labels (OntoNotes scheme)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Person,
    Norp,
    Fac,
    Org,
    Gpe,
    Loc,
    Product,
    Event,
    WorkOfArt,
    Law,
    Language,
    Date,
    Time,
    Percent,
    Money,
    Quantity,
    Ordinal,
    Cardinal,
}

/// Labels that take part in entity enrichment
pub const RELEVANT_LABELS: [EntityLabel; 6] = [
    EntityLabel::Person,
    EntityLabel::Org,
    EntityLabel::Gpe,
    EntityLabel::Date,
    EntityLabel::Law,
    EntityLabel::Product,
];

/// Labels stored as lowercased surface text instead of a knowledge-base id
pub const TEXT_LABELS: [EntityLabel; 2] = [EntityLabel::Date, EntityLabel::Product];

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Norp => "NORP",
            EntityLabel::Fac => "FAC",
            EntityLabel::Org => "ORG",
            EntityLabel::Gpe => "GPE",
            EntityLabel::Loc => "LOC",
            EntityLabel::Product => "PRODUCT",
            EntityLabel::Event => "EVENT",
            EntityLabel::WorkOfArt => "WORK_OF_ART",
            EntityLabel::Law => "LAW",
            EntityLabel::Language => "LANGUAGE",
            EntityLabel::Date => "DATE",
            EntityLabel::Time => "TIME",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Money => "MONEY",
            EntityLabel::Quantity => "QUANTITY",
            EntityLabel::Ordinal => "ORDINAL",
            EntityLabel::Cardinal => "CARDINAL",
        }
    }

    pub fn is_relevant(&self) -> bool {
        RELEVANT_LABELS.contains(self)
    }

    /// Whether spans with this label skip the knowledge base
    pub fn is_text_kind(&self) -> bool {
        TEXT_LABELS.contains(self)
    }
}

impl FromStr for EntityLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = match s {
            "PERSON" => EntityLabel::Person,
            "NORP" => EntityLabel::Norp,
            "FAC" => EntityLabel::Fac,
            "ORG" => EntityLabel::Org,
            "GPE" => EntityLabel::Gpe,
            "LOC" => EntityLabel::Loc,
            "PRODUCT" => EntityLabel::Product,
            "EVENT" => EntityLabel::Event,
            "WORK_OF_ART" => EntityLabel::WorkOfArt,
            "LAW" => EntityLabel::Law,
            "LANGUAGE" => EntityLabel::Language,
            "DATE" => EntityLabel::Date,
            "TIME" => EntityLabel::Time,
            "PERCENT" => EntityLabel::Percent,
            "MONEY" => EntityLabel::Money,
            "QUANTITY" => EntityLabel::Quantity,
            "ORDINAL" => EntityLabel::Ordinal,
            "CARDINAL" => EntityLabel::Cardinal,
            other => return Err(format!("unknown entity label '{}'", other)),
        };
        Ok(label)
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized entity mention and the sentence containing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
    pub sentence: String,
}

/// Output of one analyzer pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub sentences: Vec<String>,
    pub entities: Vec<EntitySpan>,
}

/// Sentence segmenter + named-entity recognizer
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Analysis;

    fn sentences(&self, text: &str) -> Vec<String> {
        self.analyze(text).sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        for label in RELEVANT_LABELS {
            assert_eq!(label.as_str().parse::<EntityLabel>().unwrap(), label);
        }
        assert!("FRUIT".parse::<EntityLabel>().is_err());
    }

    #[test]
    fn test_relevant_and_text_labels() {
        assert!(EntityLabel::Law.is_relevant());
        assert!(!EntityLabel::Money.is_relevant());
        assert!(EntityLabel::Product.is_text_kind());
        assert!(!EntityLabel::Org.is_text_kind());
    }
}
