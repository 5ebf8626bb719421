use crate::{
    config::FaceMeshConfig,
    constants::NUM_FACE_MESH_LANDMARKS,
    landmarks::{FaceLandmarks, LandmarkProvider, Point2},
    utils::image_conversion::rgb_to_nhwc,
    Error, Result,
};
use image::RgbImage;
use ndarray::{Array4, CowArray};
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Values per landmark in the model output (x, y, z)
const COORDS_PER_LANDMARK: usize = 3;

/// Face mesh landmark provider using `ONNX` Runtime
///
/// Expects a single NHWC `[1, size, size, 3]` input in `[0, 1]`, a first
/// output holding 468 `(x, y, z)` triples in input pixels and an optional
/// second output holding the face presence logit.
pub struct FaceMeshProvider {
    session: Session,
    input_size: u32,
    min_detection_confidence: f32,
}

impl FaceMeshProvider {
    /// Create a new face mesh provider from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs or outputs
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, config: &FaceMeshConfig) -> Result<Self> {
        log::info!(
            "Initializing FaceMeshProvider with model: {}",
            model_path.as_ref().display()
        );
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_mesh")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(Error::ModelInputError("Model has no inputs".to_string()));
        }
        if session.outputs.is_empty() {
            return Err(Error::ModelOutputError("Model has no outputs".to_string()));
        }

        Ok(Self {
            session,
            input_size: config.input_size,
            min_detection_confidence: config.min_detection_confidence,
        })
    }

    /// Run the model and return raw landmark values plus the presence score
    fn forward(&self, inputs: Array4<f32>) -> Result<(Vec<f32>, Option<f32>)> {
        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        let marks_output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;
        let marks_tensor = marks_output.try_extract::<f32>()?;
        let marks = marks_tensor.view().iter().copied().collect();

        let presence = match outputs.get(1) {
            Some(flag) => {
                let flag_tensor = flag.try_extract::<f32>()?;
                let logit = flag_tensor.view().iter().next().copied();
                logit.map(presence_score)
            }
            None => None,
        };

        Ok((marks, presence))
    }
}

/// Sigmoid of the face presence logit
#[must_use]
pub fn presence_score(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Turn flat `(x, y, z)` triples in input pixels into normalized landmarks
///
/// # Errors
///
/// Returns an error if fewer than 468 landmarks are present
pub fn decode_landmarks(raw: &[f32], input_size: u32) -> Result<FaceLandmarks> {
    let expected = NUM_FACE_MESH_LANDMARKS * COORDS_PER_LANDMARK;
    if raw.len() < expected {
        return Err(Error::ModelDataFormatError(format!(
            "Expected {expected} landmark values, got {}",
            raw.len()
        )));
    }
    let scale = f64::from(input_size);
    let points = raw
        .chunks_exact(COORDS_PER_LANDMARK)
        .take(NUM_FACE_MESH_LANDMARKS)
        .map(|xyz| Point2::new(f64::from(xyz[0]) / scale, f64::from(xyz[1]) / scale))
        .collect();
    Ok(FaceLandmarks::from_dense(points))
}

impl LandmarkProvider for FaceMeshProvider {
    fn extract(&mut self, frame: &RgbImage) -> Result<Option<FaceLandmarks>> {
        let inputs = rgb_to_nhwc(frame, self.input_size);
        let (marks, presence) = self.forward(inputs)?;

        if let Some(score) = presence {
            if score < self.min_detection_confidence {
                log::debug!("Face presence {score:.2} below threshold");
                return Ok(None);
            }
        }

        decode_landmarks(&marks, self.input_size).map(Some)
    }

    fn name(&self) -> &str {
        "face-mesh"
    }
}
