//! Multinomial naive Bayes over count features

use crate::classifier::{argmax, check_n_features, Classifier};
use crate::features::Features;
use serde::{Deserialize, Serialize};
use textserve_core::{Error, Label, Result};

/// Fitted multinomial naive Bayes model.
///
/// Scores each class with `x · feature_log_prob[c] + class_log_prior[c]` and
/// picks the highest. Works on sparse and dense input alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    pub classes: Vec<Label>,
    pub class_log_prior: Vec<f32>,
    /// One row of `n_features` log probabilities per class
    pub feature_log_prob: Vec<Vec<f32>>,
}

impl MultinomialNb {
    /// Check that the fitted arrays agree on shape
    pub fn validate(&self) -> Result<()> {
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err(Error::corrupt("naive Bayes model has no classes"));
        }
        if self.class_log_prior.len() != n_classes || self.feature_log_prob.len() != n_classes {
            return Err(Error::corrupt(format!(
                "naive Bayes model has {n_classes} classes but {} priors and {} probability rows",
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            )));
        }

        let n_features = self.feature_log_prob[0].len();
        if self.feature_log_prob.iter().any(|row| row.len() != n_features) {
            return Err(Error::corrupt(
                "naive Bayes probability rows differ in length",
            ));
        }
        Ok(())
    }

    fn joint_log_likelihood(&self, features: &Features, row: usize) -> Vec<f32> {
        self.feature_log_prob
            .iter()
            .zip(&self.class_log_prior)
            .map(|(log_prob, prior)| features.dot_row(row, log_prob) + prior)
            .collect()
    }
}

impl Classifier for MultinomialNb {
    fn predict(&self, features: &Features) -> Result<Vec<Label>> {
        check_n_features(self.name(), self.n_features(), features)?;

        Ok((0..features.n_rows())
            .map(|row| {
                let jll = self.joint_log_likelihood(features, row);
                self.classes[argmax(&jll)].clone()
            })
            .collect())
    }

    fn accepts_sparse(&self) -> bool {
        true
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob.first().map_or(0, Vec::len)
    }

    fn classes(&self) -> &[Label] {
        &self.classes
    }

    fn name(&self) -> &str {
        "MultinomialNB"
    }
}
