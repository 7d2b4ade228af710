//! Binary artifact format for fitted vectorizers and classifiers
//!
//! An artifact is a 4-byte magic followed by a bincode payload:
//!
//! | bytes | content                                                   |
//! |-------|-----------------------------------------------------------|
//! | 0..4  | `TSVZ` (vectorizer) or `TSCL` (classifier)                |
//! | 4..   | bincode (varint) encoding of [`VectorizerArtifact`] or [`ClassifierArtifact`] |
//!
//! There is no version field or checksum. Decoding fails with
//! `ArtifactCorrupt` on a wrong magic, an undecodable payload, trailing
//! bytes, or fitted arrays that disagree on shape.

use crate::classifier::Classifier;
use crate::linear::{LinearClassifier, LinearClassifierParams};
use crate::naive_bayes::MultinomialNb;
use crate::vectorizer::{CountVectorizer, CountVectorizerParams, Vectorizer};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use textserve_core::{Error, Result};

/// Magic prefix of vectorizer artifacts
pub const VECTORIZER_MAGIC: [u8; 4] = *b"TSVZ";

/// Magic prefix of classifier artifacts
pub const CLASSIFIER_MAGIC: [u8; 4] = *b"TSCL";

/// Upper bound on decoded payload size
const MAX_PAYLOAD_BYTES: u64 = 512 * 1024 * 1024;

/// Serialized vectorizer variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerArtifact {
    Count(CountVectorizerParams),
}

/// Serialized classifier variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierArtifact {
    MultinomialNb(MultinomialNb),
    Linear(LinearClassifierParams),
}

/// Artifact kind, used by tooling that handles both
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Vectorizer,
    Classifier,
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vectorizer" => Ok(Self::Vectorizer),
            "classifier" | "model" => Ok(Self::Classifier),
            other => Err(format!(
                "unknown artifact kind '{other}', expected 'vectorizer' or 'classifier'"
            )),
        }
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_PAYLOAD_BYTES)
}

fn encode_with_magic<T: Serialize>(magic: [u8; 4], value: &T) -> Result<Vec<u8>> {
    let payload = codec()
        .serialize(value)
        .map_err(|e| Error::internal(format!("failed to encode artifact: {e}")))?;

    let mut bytes = Vec::with_capacity(magic.len() + payload.len());
    bytes.extend_from_slice(&magic);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode_with_magic<T: DeserializeOwned>(magic: [u8; 4], bytes: &[u8], what: &str) -> Result<T> {
    let payload = bytes
        .strip_prefix(&magic[..])
        .ok_or_else(|| Error::corrupt(format!("not a {what} artifact (bad magic)")))?;

    codec()
        .deserialize(payload)
        .map_err(|e| Error::corrupt(format!("failed to decode {what} artifact: {e}")))
}

impl VectorizerArtifact {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_with_magic(VECTORIZER_MAGIC, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_with_magic(VECTORIZER_MAGIC, bytes, "vectorizer")
    }

    /// Parse JSON-exported fitted parameters
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the runtime vectorizer
    pub fn into_vectorizer(self) -> Result<Arc<dyn Vectorizer>> {
        match self {
            Self::Count(params) => Ok(Arc::new(CountVectorizer::from_params(params)?)),
        }
    }
}

impl ClassifierArtifact {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_with_magic(CLASSIFIER_MAGIC, self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_with_magic(CLASSIFIER_MAGIC, bytes, "classifier")
    }

    /// Parse JSON-exported fitted parameters
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the runtime classifier
    pub fn into_classifier(self) -> Result<Arc<dyn Classifier>> {
        match self {
            Self::MultinomialNb(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
            Self::Linear(params) => Ok(Arc::new(LinearClassifier::from_params(params)?)),
        }
    }
}

/// Decode vectorizer artifact bytes into a ready-to-use vectorizer
pub fn decode_vectorizer(bytes: &[u8]) -> Result<Arc<dyn Vectorizer>> {
    VectorizerArtifact::decode(bytes)?.into_vectorizer()
}

/// Decode classifier artifact bytes into a ready-to-use classifier
pub fn decode_classifier(bytes: &[u8]) -> Result<Arc<dyn Classifier>> {
    ClassifierArtifact::decode(bytes)?.into_classifier()
}

/// Convert JSON-exported parameters into artifact bytes
pub fn pack_json(kind: ArtifactKind, json: &str) -> Result<Vec<u8>> {
    match kind {
        ArtifactKind::Vectorizer => {
            let artifact = VectorizerArtifact::from_json(json)?;
            // Build once so invalid parameters are rejected before writing
            artifact.clone().into_vectorizer()?;
            artifact.encode()
        }
        ArtifactKind::Classifier => {
            let artifact = ClassifierArtifact::from_json(json)?;
            artifact.clone().into_classifier()?;
            artifact.encode()
        }
    }
}
