//! Loading the vectorizer/classifier pair and serving predictions from it

use crate::artifact::{decode_classifier, decode_vectorizer};
use crate::classifier::Classifier;
use crate::source::{ArtifactFetcher, ArtifactSource};
use crate::vectorizer::Vectorizer;
use std::fmt;
use std::sync::Arc;
use textserve_core::{Error, Label, Result};
use tracing::{debug, error, info, warn};

/// Message reported when a prediction is requested without a loaded model
pub const MODEL_NOT_LOADED: &str = "Model or vectorizer is not loaded on the server.";

/// Acquisition descriptors for both artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSources {
    pub vectorizer: ArtifactSource,
    pub classifier: ArtifactSource,
}

/// Fitted vectorizer and classifier, always held together
#[derive(Clone)]
pub struct LoadedModel {
    vectorizer: Arc<dyn Vectorizer>,
    classifier: Arc<dyn Classifier>,
}

impl LoadedModel {
    pub fn new(vectorizer: Arc<dyn Vectorizer>, classifier: Arc<dyn Classifier>) -> Self {
        if vectorizer.n_features() != classifier.n_features() {
            warn!(
                "Vectorizer {} produces {} features but classifier {} expects {}; predictions will fail",
                vectorizer.name(),
                vectorizer.n_features(),
                classifier.name(),
                classifier.n_features()
            );
        }
        Self {
            vectorizer,
            classifier,
        }
    }

    /// Decode both artifacts from raw bytes
    pub fn from_bytes(vectorizer: &[u8], classifier: &[u8]) -> Result<Self> {
        Ok(Self::new(
            decode_vectorizer(vectorizer)?,
            decode_classifier(classifier)?,
        ))
    }

    pub fn vectorizer(&self) -> &dyn Vectorizer {
        self.vectorizer.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Vectorize one text and predict its label.
    ///
    /// Sparse features are densified only when the classifier cannot take
    /// them. Every failure is reported as `PredictionFailed`.
    pub fn predict(&self, text: &str) -> Result<Vec<Label>> {
        let features = self.vectorizer.transform(&[text]).map_err(as_prediction_error)?;

        let features = if features.is_sparse() && !self.classifier.accepts_sparse() {
            debug!("Densifying features for {}", self.classifier.name());
            features.into_dense()
        } else {
            features
        };

        self.classifier
            .predict(&features)
            .map_err(as_prediction_error)
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("vectorizer", &self.vectorizer.name())
            .field("classifier", &self.classifier.name())
            .field("n_features", &self.vectorizer.n_features())
            .finish()
    }
}

fn as_prediction_error(err: Error) -> Error {
    match err {
        Error::PredictionFailed(_) => err,
        other => Error::prediction(other.to_string()),
    }
}

/// Outcome of the startup load, fixed for the life of the process
#[derive(Debug, Clone)]
pub enum ModelStatus {
    Loaded(LoadedModel),
    Unavailable { reason: String },
}

impl ModelStatus {
    /// Fold a load result into a status, logging the outcome once
    pub fn from_result(result: Result<LoadedModel>) -> Self {
        match result {
            Ok(model) => {
                info!("Model and vectorizer loaded successfully: {:?}", model);
                Self::Loaded(model)
            }
            Err(e) => {
                error!("Failed to load model or vectorizer: {}", e);
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The loaded model, or `ServiceUnavailable`
    pub fn model(&self) -> Result<&LoadedModel> {
        match self {
            Self::Loaded(model) => Ok(model),
            Self::Unavailable { .. } => Err(Error::unavailable(MODEL_NOT_LOADED)),
        }
    }

    /// Why the model is unavailable, if it is
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Loaded(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

/// Loads the artifact pair from its configured sources
#[derive(Debug, Clone)]
pub struct ModelLoader {
    fetcher: ArtifactFetcher,
    sources: ArtifactSources,
}

impl ModelLoader {
    pub fn new(fetcher: ArtifactFetcher, sources: ArtifactSources) -> Self {
        Self { fetcher, sources }
    }

    pub fn sources(&self) -> &ArtifactSources {
        &self.sources
    }

    /// Fetch and decode both artifacts
    pub async fn load(&self) -> Result<LoadedModel> {
        info!("Loading vectorizer from {}", self.sources.vectorizer.describe());
        info!("Loading classifier from {}", self.sources.classifier.describe());

        let (vectorizer_bytes, classifier_bytes) = tokio::try_join!(
            self.fetcher.fetch(&self.sources.vectorizer),
            self.fetcher.fetch(&self.sources.classifier),
        )?;

        LoadedModel::from_bytes(&vectorizer_bytes, &classifier_bytes)
    }

    /// Load and convert any failure into [`ModelStatus::Unavailable`]
    pub async fn load_status(&self) -> ModelStatus {
        ModelStatus::from_result(self.load().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ClassifierArtifact, VectorizerArtifact};
    use crate::linear::LinearClassifierParams;
    use crate::naive_bayes::MultinomialNb;
    use crate::source::DEFAULT_FETCH_TIMEOUT;
    use crate::vectorizer::CountVectorizerParams;

    fn vectorizer_bytes(terms: &[&str]) -> Vec<u8> {
        let vocabulary = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
        VectorizerArtifact::Count(CountVectorizerParams::with_vocabulary(vocabulary))
            .encode()
            .unwrap()
    }

    fn linear_bytes() -> Vec<u8> {
        ClassifierArtifact::Linear(LinearClassifierParams {
            classes: vec![Label::Int(0), Label::Int(1)],
            coef: vec![vec![-1.0, 2.0]],
            intercept: vec![0.0],
        })
        .encode()
        .unwrap()
    }

    #[test]
    fn test_predict_single_text() {
        let model = LoadedModel::from_bytes(&vectorizer_bytes(&["meeting", "prize"]), &linear_bytes())
            .unwrap();

        assert_eq!(model.predict("You won a prize!").unwrap(), vec![Label::Int(1)]);
        assert_eq!(model.predict("Team meeting at noon").unwrap(), vec![Label::Int(0)]);
        assert_eq!(model.predict("").unwrap().len(), 1);
    }

    #[test]
    fn test_sparse_capable_classifier_keeps_sparse() {
        let classifier = ClassifierArtifact::MultinomialNb(MultinomialNb {
            classes: vec![Label::text("a"), Label::text("b")],
            class_log_prior: vec![-0.7, -0.7],
            feature_log_prob: vec![vec![-0.1, -3.0], vec![-3.0, -0.1]],
        })
        .encode()
        .unwrap();
        let model = LoadedModel::from_bytes(&vectorizer_bytes(&["alpha", "beta"]), &classifier)
            .unwrap();

        assert!(model.classifier().accepts_sparse());
        assert_eq!(model.predict("beta beta").unwrap(), vec![Label::text("b")]);
    }

    #[test]
    fn test_mismatched_pair_fails_per_request() {
        let model =
            LoadedModel::from_bytes(&vectorizer_bytes(&["one", "two", "three"]), &linear_bytes())
                .unwrap();

        let err = model.predict("one two").unwrap_err();
        assert!(matches!(err, Error::PredictionFailed(_)));
        assert!(err.to_string().contains("3 features"));
    }

    #[test]
    fn test_status_refuses_when_unavailable() {
        let status = ModelStatus::from_result(Err(Error::not_found("api/missing.sav")));
        assert!(!status.is_loaded());
        assert!(status.unavailable_reason().unwrap().contains("missing.sav"));

        let err = status.model().unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
        assert!(err.to_string().contains(MODEL_NOT_LOADED));
    }

    #[tokio::test]
    async fn test_loader_from_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer = dir.path().join("count_vectorizer.sav");
        let classifier = dir.path().join("finalized_model.sav");
        std::fs::write(&vectorizer, vectorizer_bytes(&["meeting", "prize"])).unwrap();
        std::fs::write(&classifier, linear_bytes()).unwrap();

        let loader = ModelLoader::new(
            ArtifactFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap(),
            ArtifactSources {
                vectorizer: ArtifactSource::local(&vectorizer),
                classifier: ArtifactSource::local(&classifier),
            },
        );

        let status = loader.load_status().await;
        assert!(status.is_loaded());
        assert_eq!(
            status.model().unwrap().predict("prize").unwrap(),
            vec![Label::Int(1)]
        );
    }

    #[tokio::test]
    async fn test_loader_missing_classifier_leaves_nothing_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer = dir.path().join("count_vectorizer.sav");
        std::fs::write(&vectorizer, vectorizer_bytes(&["meeting"])).unwrap();

        let loader = ModelLoader::new(
            ArtifactFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap(),
            ArtifactSources {
                vectorizer: ArtifactSource::local(&vectorizer),
                classifier: ArtifactSource::local(dir.path().join("finalized_model.sav")),
            },
        );

        assert!(matches!(
            loader.load().await,
            Err(Error::ArtifactNotFound { .. })
        ));
        assert!(!loader.load_status().await.is_loaded());
    }

    #[tokio::test]
    async fn test_loader_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let vectorizer = dir.path().join("count_vectorizer.sav");
        let classifier = dir.path().join("finalized_model.sav");
        std::fs::write(&vectorizer, vectorizer_bytes(&["meeting"])).unwrap();
        std::fs::write(&classifier, b"\x80\x04\x95pickle").unwrap();

        let loader = ModelLoader::new(
            ArtifactFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap(),
            ArtifactSources {
                vectorizer: ArtifactSource::local(&vectorizer),
                classifier: ArtifactSource::local(&classifier),
            },
        );

        assert!(matches!(
            loader.load().await,
            Err(Error::ArtifactCorrupt(_))
        ));
    }
}
