//! Deterministic content classifier for expertise areas and truth ratings.
//!
//! This crate provides a focused classifier for post content with:
//! - Expertise area detection from a keyword lexicon
//! - A truth rating per detected area, derived from marker phrases
//! - A `bullshit` flag on ratings that indicate fabricated content
//!
//! Classification is fully deterministic: the same content always yields the
//! same analysis, and areas are reported in lexicon order.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during classification.
#[derive(Debug, Error)]
pub enum Error {
    #[error("content is empty")]
    EmptyContent,

    #[error("invalid lexicon: {0}")]
    Lexicon(String),
}

/// A truth rating for content within one expertise area.
///
/// The numeric value is signed: negative ratings carry reputation
/// consequences for the author. The `bullshit` flag marks content judged
/// fabricated outright, which blocks publication regardless of value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthRating {
    pub label: String,
    pub numeric_value: i32,
    pub bullshit: bool,
}

impl TruthRating {
    pub fn new(label: impl Into<String>, numeric_value: i32, bullshit: bool) -> Self {
        Self {
            label: label.into(),
            numeric_value,
            bullshit,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.numeric_value < 0
    }
}

/// One detected expertise area, with the rating the classifier assigned.
///
/// The rating is absent when the classifier recognized the topic but formed
/// no judgement about the content's veracity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Expertise area label, e.g. "Medicine".
    pub area: String,
    pub rating: Option<TruthRating>,
}

impl Classification {
    pub fn new(area: impl Into<String>, rating: Option<TruthRating>) -> Self {
        Self {
            area: area.into(),
            rating,
        }
    }
}

/// The full result of classifying one piece of content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Detected areas in lexicon order.
    pub classifications: Vec<Classification>,
}

impl Analysis {
    pub fn new(classifications: Vec<Classification>) -> Self {
        Self { classifications }
    }

    /// True if any detected area was rated as bullshit.
    pub fn contains_bullshit(&self) -> bool {
        self.classifications
            .iter()
            .any(|c| c.rating.as_ref().is_some_and(|r| r.bullshit))
    }

    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty()
    }
}

/// A content classifier.
///
/// Implementations must be deterministic and side-effect free; callers rely
/// on the order of returned classifications being stable.
pub trait Classifier {
    fn classify(&self, content: &str) -> Result<Analysis, Error>;
}

// ============================================================================
// Lexicon
// ============================================================================

/// Keywords that map content to one expertise area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaLexicon {
    pub label: String,
    pub keywords: Vec<String>,
}

impl AreaLexicon {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, content: &str) -> bool {
        self.keywords.iter().any(|k| content.contains(k.as_str()))
    }
}

/// A phrase that, when present, assigns a truth rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthMarker {
    pub phrase: String,
    pub rating: TruthRating,
}

impl TruthMarker {
    pub fn new(phrase: impl Into<String>, rating: TruthRating) -> Self {
        Self {
            phrase: phrase.into().to_lowercase(),
            rating,
        }
    }
}

lazy_static! {
    /// Standard expertise areas.
    static ref DEFAULT_AREAS: Vec<AreaLexicon> = vec![
        AreaLexicon::new(
            "Mathematics",
            &["math", "theorem", "proof", "equation", "prime number", "integral"],
        ),
        AreaLexicon::new(
            "Physics",
            &["physics", "quantum", "relativity", "particle", "gravity"],
        ),
        AreaLexicon::new(
            "Medicine",
            &["medicine", "vaccine", "drug", "therapy", "diagnosis", "cure"],
        ),
        AreaLexicon::new(
            "Climate",
            &["climate", "warming", "carbon", "emissions", "glacier"],
        ),
        AreaLexicon::new(
            "Economics",
            &["economics", "inflation", "interest rate", "market", "gdp"],
        ),
        AreaLexicon::new(
            "History",
            &["history", "ancient", "empire", "revolution", "medieval"],
        ),
    ];

    /// Standard truth markers, checked against the whole text.
    static ref DEFAULT_MARKERS: Vec<TruthMarker> = vec![
        TruthMarker::new("miracle cure", TruthRating::new("fabricated", -80, true)),
        TruthMarker::new(
            "they don't want you to know",
            TruthRating::new("fabricated", -80, true),
        ),
        TruthMarker::new("wake up sheeple", TruthRating::new("fabricated", -80, true)),
        TruthMarker::new("proven hoax", TruthRating::new("fabricated", -60, true)),
        TruthMarker::new("everyone knows", TruthRating::new("misleading", -40, false)),
        TruthMarker::new("it is obvious that", TruthRating::new("misleading", -40, false)),
        TruthMarker::new("i heard", TruthRating::new("unsupported", -20, false)),
        TruthMarker::new("trust me", TruthRating::new("unsupported", -20, false)),
        TruthMarker::new("suggests that", TruthRating::new("plausible", 20, false)),
        TruthMarker::new("according to", TruthRating::new("plausible", 20, false)),
        TruthMarker::new("peer reviewed", TruthRating::new("well sourced", 50, false)),
        TruthMarker::new("meta-analysis", TruthRating::new("well sourced", 50, false)),
    ];
}

// ============================================================================
// Classifier
// ============================================================================

/// Lexicon-backed classifier.
///
/// Detects every area whose keywords occur in the content, then assigns each
/// detected area the worst-case rating among all matching truth markers. If
/// no marker matches, the area is reported without a rating.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    areas: Vec<AreaLexicon>,
    markers: Vec<TruthMarker>,
}

impl LexiconClassifier {
    /// Create a classifier with the standard lexicon.
    pub fn new() -> Self {
        Self {
            areas: DEFAULT_AREAS.clone(),
            markers: DEFAULT_MARKERS.clone(),
        }
    }

    /// Create a classifier with no areas and no markers.
    pub fn empty() -> Self {
        Self {
            areas: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Add an expertise area with its keywords.
    pub fn with_area(mut self, label: impl Into<String>, keywords: &[&str]) -> Self {
        self.areas.push(AreaLexicon::new(label, keywords));
        self
    }

    /// Add a truth marker phrase.
    pub fn with_marker(mut self, phrase: impl Into<String>, rating: TruthRating) -> Self {
        self.markers.push(TruthMarker::new(phrase, rating));
        self
    }

    /// The worst-case rating among all markers matching the content.
    fn rate(&self, content: &str) -> Option<TruthRating> {
        self.markers
            .iter()
            .filter(|m| content.contains(m.phrase.as_str()))
            .map(|m| &m.rating)
            .min_by_key(|r| r.numeric_value)
            .cloned()
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LexiconClassifier {
    fn classify(&self, content: &str) -> Result<Analysis, Error> {
        if content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }

        let lowered = content.to_lowercase();
        let rating = self.rate(&lowered);

        let classifications = self
            .areas
            .iter()
            .filter(|a| a.matches(&lowered))
            .map(|a| Classification::new(a.label.clone(), rating.clone()))
            .collect();

        Ok(Analysis::new(classifications))
    }
}
