//! TextServe Classifiers
//!
//! Fitted text-classification models and the machinery to load them.
//!
//! A model is a pair: a [`Vectorizer`] that turns raw text into count features
//! over a fixed vocabulary, and a [`Classifier`] that maps those features to a
//! label. Both are decoded from binary artifacts (see [`artifact`]) obtained
//! from a local file, a cached download, or a direct download (see [`source`]).
//!
//! Classifiers advertise whether they take sparse input; dense-only models are
//! evaluated with Candle on CPU.

pub mod artifact;
pub mod classifier;
pub mod features;
pub mod linear;
pub mod model_loader;
pub mod naive_bayes;
pub mod source;
pub mod vectorizer;

pub use artifact::{
    decode_classifier, decode_vectorizer, pack_json, ArtifactKind, ClassifierArtifact,
    VectorizerArtifact,
};
pub use classifier::Classifier;
pub use features::{DenseMatrix, Features, SparseMatrix};
pub use linear::{LinearClassifier, LinearClassifierParams};
pub use model_loader::{ArtifactSources, LoadedModel, ModelLoader, ModelStatus, MODEL_NOT_LOADED};
pub use naive_bayes::MultinomialNb;
pub use source::{artifact_url, redact_url, ArtifactFetcher, ArtifactSource, DEFAULT_FETCH_TIMEOUT};
pub use vectorizer::{CountVectorizer, CountVectorizerParams, Vectorizer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::Classifier;
    pub use crate::features::Features;
    pub use crate::model_loader::{LoadedModel, ModelLoader, ModelStatus};
    pub use crate::source::{ArtifactFetcher, ArtifactSource};
    pub use crate::vectorizer::{CountVectorizer, Vectorizer};
}
