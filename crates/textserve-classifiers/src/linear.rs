//! Linear classifier (logistic regression, linear SVM) evaluated with Candle

use crate::classifier::{argmax, check_n_features, Classifier};
use crate::features::Features;
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use textserve_core::{Error, Label, Result};

/// Fitted parameters of a linear classifier, as stored in an artifact.
///
/// Binary models carry a single coefficient row whose positive side is
/// `classes[1]`; multiclass models carry one row per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifierParams {
    pub classes: Vec<Label>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

/// Linear decision function `x · coefᵀ + intercept` on dense input
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<Label>,
    n_features: usize,
    /// Shape (n_features, n_rows)
    weights_t: Tensor,
    /// Shape (n_rows,)
    bias: Tensor,
    device: Device,
}

impl LinearClassifier {
    /// Validate fitted parameters and build the weight tensors
    pub fn from_params(params: LinearClassifierParams) -> Result<Self> {
        let n_classes = params.classes.len();
        if n_classes < 2 {
            return Err(Error::corrupt(format!(
                "linear model needs at least 2 classes, got {n_classes}"
            )));
        }

        let n_rows = params.coef.len();
        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if n_rows != expected_rows || params.intercept.len() != n_rows {
            return Err(Error::corrupt(format!(
                "linear model with {n_classes} classes expects {expected_rows} coefficient rows, \
                 got {n_rows} rows and {} intercepts",
                params.intercept.len()
            )));
        }

        let n_features = params.coef[0].len();
        if n_features == 0 || params.coef.iter().any(|row| row.len() != n_features) {
            return Err(Error::corrupt(
                "linear model coefficient rows are empty or differ in length",
            ));
        }

        let device = Device::Cpu;
        let flat: Vec<f32> = params.coef.into_iter().flatten().collect();
        let weights_t = Tensor::from_vec(flat, (n_rows, n_features), &device)
            .and_then(|w| w.t()?.contiguous())
            .map_err(|e| Error::corrupt(format!("failed to build weight tensor: {e}")))?;
        let bias = Tensor::from_vec(params.intercept, n_rows, &device)
            .map_err(|e| Error::corrupt(format!("failed to build bias tensor: {e}")))?;

        Ok(Self {
            classes: params.classes,
            n_features,
            weights_t,
            bias,
            device,
        })
    }

    /// Raw decision values, one vector per input row
    pub fn decision_function(&self, features: &Features) -> Result<Vec<Vec<f32>>> {
        check_n_features(self.name(), self.n_features, features)?;

        let Features::Dense(dense) = features else {
            return Err(Error::prediction(format!(
                "{} requires dense input",
                self.name()
            )));
        };

        let x = Tensor::from_slice(dense.as_slice(), (dense.n_rows(), dense.n_cols()), &self.device)
            .map_err(tensor_error)?;
        x.matmul(&self.weights_t)
            .and_then(|scores| scores.broadcast_add(&self.bias))
            .and_then(|scores| scores.to_vec2::<f32>())
            .map_err(tensor_error)
    }
}

fn tensor_error(e: candle_core::Error) -> Error {
    Error::prediction(format!("tensor evaluation failed: {e}"))
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &Features) -> Result<Vec<Label>> {
        if features.n_rows() == 0 {
            return Ok(Vec::new());
        }

        let scores = self.decision_function(features)?;
        Ok(scores
            .iter()
            .map(|row| {
                let index = match row.as_slice() {
                    [single] => usize::from(*single > 0.0),
                    many => argmax(many),
                };
                self.classes[index].clone()
            })
            .collect())
    }

    fn accepts_sparse(&self) -> bool {
        false
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[Label] {
        &self.classes
    }

    fn name(&self) -> &str {
        "LinearClassifier"
    }
}
