use crate::{
    sign::{SignClassifier, SignPrediction},
    utils::image_conversion::rgb_to_nchw,
    Error, Result,
};
use image::RgbImage;
use ndarray::{ArrayViewD, Axis, CowArray, Ix2};
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Default detector input size
const DEFAULT_DETECTOR_INPUT_SIZE: u32 = 640;

/// Box coordinates preceding the class scores in every output column
const BOX_VALUES: usize = 4;

/// YOLO-style sign detector using `ONNX` Runtime
///
/// The model takes an NCHW `[1, 3, size, size]` image in `[0, 1]` and
/// returns `[1, 4 + classes, anchors]`: box values followed by one score
/// per class for every anchor. Only the single best-scoring class is used.
pub struct SignDetector {
    session: Session,
    labels: Vec<String>,
    input_size: u32,
    conf_threshold: f32,
}

impl SignDetector {
    /// Create a new sign detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs
    /// - `labels` is empty
    pub fn new<P: AsRef<Path>>(model_path: P, labels: Vec<String>, conf_threshold: f32) -> Result<Self> {
        log::info!(
            "Initializing SignDetector with model: {} ({} labels)",
            model_path.as_ref().display(),
            labels.len()
        );
        if labels.is_empty() {
            return Err(Error::ModelError("Sign detector needs at least one label".to_string()));
        }

        let environment = Arc::new(
            Environment::builder()
                .with_name("sign_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

        // [batch, channels, height, width]; dynamic sizes fall back to the default
        let input_size = input_meta
            .dimensions
            .get(2)
            .copied()
            .flatten()
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or(DEFAULT_DETECTOR_INPUT_SIZE);

        Ok(Self {
            session,
            labels,
            input_size,
            conf_threshold,
        })
    }
}

/// Best class over all anchors of a `[1, 4 + classes, anchors]` output
///
/// Returns `None` when no score reaches `conf_threshold`.
///
/// # Errors
///
/// Returns an error if the output shape does not match the label count
pub fn best_prediction(output: ArrayViewD<'_, f32>, labels: &[String], conf_threshold: f32) -> Result<Option<SignPrediction>> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 || shape[1] != BOX_VALUES + labels.len() {
        return Err(Error::ModelDataFormatError(format!(
            "Expected output [1, {}, N], got {shape:?}",
            BOX_VALUES + labels.len()
        )));
    }
    let columns = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .map_err(|e| Error::ModelDataFormatError(e.to_string()))?;

    let mut best: Option<(usize, f32)> = None;
    for (class, row) in columns.axis_iter(Axis(0)).skip(BOX_VALUES).enumerate() {
        for &score in row {
            if score >= conf_threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((class, score));
            }
        }
    }

    Ok(best.map(|(class, score)| SignPrediction::new(labels[class].clone(), score)))
}

impl SignClassifier for SignDetector {
    fn classify(&mut self, frame: &RgbImage) -> Result<Option<SignPrediction>> {
        let inputs = rgb_to_nchw(frame, self.input_size);
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;
        let output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let tensor = output.try_extract::<f32>()?;

        best_prediction(tensor.view(), &self.labels, self.conf_threshold)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn name(&self) -> &str {
        "sign-detector"
    }

    fn set_confidence_threshold(&mut self, threshold: f32) {
        self.conf_threshold = threshold;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn labels() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn test_best_prediction_picks_highest_score() {
        let mut output = Array3::<f32>::zeros((1, 6, 3));
        output[[0, 4, 0]] = 0.4;
        output[[0, 5, 2]] = 0.8;
        output[[0, 4, 1]] = 0.7;

        let best = best_prediction(output.view().into_dyn(), &labels(), 0.25).unwrap();
        assert_eq!(best, Some(SignPrediction::new("B", 0.8)));
    }

    #[test]
    fn test_best_prediction_below_threshold() {
        let mut output = Array3::<f32>::zeros((1, 6, 2));
        output[[0, 4, 0]] = 0.1;
        assert_eq!(best_prediction(output.view().into_dyn(), &labels(), 0.25).unwrap(), None);
    }

    #[test]
    fn test_best_prediction_shape_mismatch() {
        let output = Array3::<f32>::zeros((1, 7, 2));
        assert!(matches!(
            best_prediction(output.view().into_dyn(), &labels(), 0.25),
            Err(Error::ModelDataFormatError(_))
        ));
    }
}
