//! Lexicon store: an immutable token → valence table plus modifier rules.
//!
//! The table uses the VADER text format, one entry per line:
//! `token<TAB>mean valence[<TAB>std dev<TAB>raw ratings]`. Only the first two
//! columns are read. The bundled English table is compiled into the binary;
//! a larger table can be loaded from disk at startup.

/// Negation words and booster/dampener scalars.
pub mod modifiers;

pub use modifiers::{booster_scalar, is_negation};

use crate::error::{Result, StoreError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN_LEXICON: &str = include_str!("../../data/lexicon.tsv");

/// Immutable mapping from lowercase token to sentiment valence.
///
/// Loaded once at process start and shared read-only (typically behind `Arc`).
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
}

impl Lexicon {
    /// Parses a VADER-format lexicon.
    ///
    /// Blank lines are skipped. A non-blank line without a numeric second
    /// column is an error naming its 1-based line number.
    pub fn parse(text: &str) -> Result<Self> {
        let mut valences = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let mut cols = line.split('\t');
            let token = cols.next().unwrap_or_default().trim();
            let valence = cols
                .next()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite());
            match valence {
                Some(v) if !token.is_empty() => {
                    valences.insert(token.to_lowercase(), v);
                }
                _ => {
                    return Err(StoreError::Lexicon(format!(
                        "line {}: expected `token<TAB>valence`",
                        idx + 1
                    )))
                }
            }
        }
        if valences.is_empty() {
            return Err(StoreError::Lexicon("lexicon contains no entries".into()));
        }
        Ok(Self { valences })
    }

    /// Reads and parses a lexicon file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let lexicon = Self::parse(&text)?;
        tracing::info!(path = %path.display(), entries = lexicon.len(), "Loaded lexicon");
        Ok(lexicon)
    }

    /// The bundled English lexicon.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_LEXICON).expect("bundled lexicon is well-formed")
    }

    /// Valence of a token, looked up case-insensitively.
    pub fn valence(&self, token: &str) -> Option<f64> {
        match self.valences.get(token) {
            Some(&v) => Some(v),
            None => self.valences.get(&token.to_lowercase()).copied(),
        }
    }

    /// Returns `true` if the token has a valence entry.
    pub fn contains(&self, token: &str) -> bool {
        self.valence(token).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.valences.len()
    }

    /// Returns `true` if the lexicon has no entries.
    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}
