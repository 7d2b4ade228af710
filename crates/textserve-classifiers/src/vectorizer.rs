//! Vectorizer trait and the fitted count vectorizer

use crate::features::{Features, SparseMatrix};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use textserve_core::{Error, Result};

/// Default token pattern: runs of two or more word characters
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Trait for fitted text vectorizers
pub trait Vectorizer: Send + Sync {
    /// Turn a batch of documents into one feature row per document
    fn transform(&self, docs: &[&str]) -> Result<Features>;

    /// Width of the produced feature rows
    fn n_features(&self) -> usize;

    /// Get the vectorizer name
    fn name(&self) -> &str;
}

/// Fitted parameters of a count vectorizer, as stored in an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizerParams {
    /// Term to column index
    pub vocabulary: BTreeMap<String, usize>,

    #[serde(default = "default_true")]
    pub lowercase: bool,

    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,

    /// Inclusive `(min_n, max_n)` word n-gram range
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    #[serde(default)]
    pub stop_words: Option<BTreeSet<String>>,

    /// Clamp counts to 1
    #[serde(default)]
    pub binary: bool,
}

impl CountVectorizerParams {
    /// Default options over the given vocabulary
    pub fn with_vocabulary(vocabulary: BTreeMap<String, usize>) -> Self {
        Self {
            vocabulary,
            lowercase: true,
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
            stop_words: None,
            binary: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// Count vectorizer over a fixed vocabulary
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    name: String,
    vocabulary: HashMap<String, usize>,
    token_pattern: Regex,
    lowercase: bool,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    binary: bool,
}

impl CountVectorizer {
    /// Build a vectorizer from fitted parameters, validating them
    pub fn from_params(params: CountVectorizerParams) -> Result<Self> {
        let token_pattern = Regex::new(&params.token_pattern)
            .map_err(|e| Error::corrupt(format!("invalid token pattern: {e}")))?;
        if token_pattern.captures_len() > 2 {
            return Err(Error::corrupt(
                "token pattern may contain at most one capturing group",
            ));
        }

        let (min_n, max_n) = params.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::corrupt(format!(
                "invalid ngram range ({min_n}, {max_n})"
            )));
        }

        let n_features = params.vocabulary.len();
        let mut seen = vec![false; n_features];
        for (term, &index) in &params.vocabulary {
            if index >= n_features || std::mem::replace(&mut seen[index], true) {
                return Err(Error::corrupt(format!(
                    "vocabulary index {index} for term {term:?} is out of range or duplicated"
                )));
            }
        }

        Ok(Self {
            name: "count_vectorizer".to_string(),
            vocabulary: params.vocabulary.into_iter().collect(),
            token_pattern,
            lowercase: params.lowercase,
            ngram_range: params.ngram_range,
            stop_words: params.stop_words.unwrap_or_default().into_iter().collect(),
            binary: params.binary,
        })
    }

    /// Vectorizer with default options over `terms`, indexed in order
    pub fn from_terms<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.into(), i))
            .collect();
        Self::from_params(CountVectorizerParams::with_vocabulary(vocabulary))
    }

    /// Split a document into tokens, after lowercasing and stop-word removal
    fn tokenize(&self, doc: &str) -> Vec<String> {
        let doc = if self.lowercase {
            doc.to_lowercase()
        } else {
            doc.to_string()
        };

        let group = usize::from(self.token_pattern.captures_len() == 2);
        self.token_pattern
            .captures_iter(&doc)
            .filter_map(|caps| caps.get(group).map(|m| m.as_str().to_string()))
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    /// Expand tokens into the configured word n-grams
    fn ngrams(&self, tokens: Vec<String>) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        if max_n == 1 {
            return tokens;
        }

        let mut grams = if min_n == 1 { tokens.clone() } else { Vec::new() };
        let start = min_n.max(2);
        for n in start..=max_n.min(tokens.len()) {
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        grams
    }

    fn count_row(&self, doc: &str) -> Vec<(usize, f32)> {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for gram in self.ngrams(self.tokenize(doc)) {
            if let Some(&col) = self.vocabulary.get(&gram) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        if self.binary {
            counts.values_mut().for_each(|v| *v = 1.0);
        }
        counts.into_iter().collect()
    }
}

impl Vectorizer for CountVectorizer {
    fn transform(&self, docs: &[&str]) -> Result<Features> {
        let rows = docs.iter().map(|doc| self.count_row(doc)).collect();
        Ok(Features::Sparse(SparseMatrix::from_rows(
            self.vocabulary.len(),
            rows,
        )))
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
