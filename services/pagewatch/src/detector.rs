//! Change detection: content fingerprints, keyword matching and per-fetch classification

use std::fmt;

use sha2::{Digest, Sha256};

use crate::fetcher::FetchResult;

/// Deterministic digest of extracted element content (lowercase hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(content: &str) -> Self {
        Self(hex::encode(Sha256::digest(content.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Case-insensitive match terms. Blank terms are dropped since they would match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = Vec::new();
        for keyword in keywords {
            let term = keyword.as_ref().trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Terms that occur in `content`, in configured order
    pub fn matches_in<'a>(&'a self, content: &str) -> Vec<&'a str> {
        if self.terms.is_empty() {
            return Vec::new();
        }
        let haystack = content.to_lowercase();
        self.terms
            .iter()
            .filter(|term| haystack.contains(term.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn matches(&self, content: &str) -> bool {
        !self.matches_in(content).is_empty()
    }
}

/// Outcome of comparing one fetch against the stored fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// First successful read; seeds the fingerprint without notifying
    Baseline {
        fingerprint: Fingerprint,
        keyword_hit: bool,
    },
    Unchanged,
    Changed {
        content: String,
        fingerprint: Fingerprint,
        keyword_hit: bool,
    },
    MissingElement,
    FetchFailed(String),
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Baseline { .. } => "baseline",
            Classification::Unchanged => "unchanged",
            Classification::Changed { .. } => "changed",
            Classification::MissingElement => "missing_element",
            Classification::FetchFailed(_) => "fetch_failed",
        }
    }

    /// Fingerprint the monitor should remember after this classification, if any
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Classification::Baseline { fingerprint, .. }
            | Classification::Changed { fingerprint, .. } => Some(fingerprint),
            _ => None,
        }
    }
}

/// Classify a fetch result. Pure: the caller owns the stored fingerprint.
pub fn classify(
    previous: Option<&Fingerprint>,
    fetch: FetchResult,
    keywords: &KeywordSet,
) -> Classification {
    let content = match fetch {
        FetchResult::TransportError(detail) => return Classification::FetchFailed(detail),
        FetchResult::NotFound => return Classification::MissingElement,
        FetchResult::Ok(content) => content,
    };

    let fingerprint = Fingerprint::of(&content);
    match previous {
        None => Classification::Baseline {
            keyword_hit: keywords.matches(&content),
            fingerprint,
        },
        Some(previous) if *previous == fingerprint => Classification::Unchanged,
        Some(_) => Classification::Changed {
            keyword_hit: keywords.matches(&content),
            content,
            fingerprint,
        },
    }
}
