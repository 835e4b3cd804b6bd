use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array1, Array4, ArrayViewD};
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use log::info;

use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// The inference engine behind the classifier.
///
/// Implementations take one preprocessed `[1, H, W, 3]` tensor and return the
/// model's scores for that image, one value per class.
pub trait InferenceBackend: Send + Sync {
    fn infer(&self, input: Array4<f32>) -> Result<Array1<f32>, ClassifierError>;

    /// Number of classes the model emits, when the model declares it statically.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// An ONNX model loaded into ONNX Runtime.
///
/// A single session is not safe to run from several threads at once in every
/// execution provider, so runs are serialized behind a mutex.
#[derive(Debug)]
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
    num_classes: Option<usize>,
}

impl OnnxModel {
    /// Loads a model file and validates it against the expected input shape.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        config: &RuntimeConfig,
        expected_input: [usize; 4],
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let session = create_session_builder(config)?
            .commit_from_file(path)
            .map_err(|e| ClassifierError::Build(format!("Failed to load model {:?}: {}", path, e)))?;

        let num_classes = Self::validate_model(&session, expected_input)?;
        info!("Model structure validated successfully");

        let input_name = session.inputs[0].name.clone();
        info!(
            "Model loaded from {:?}: input '{}', output '{}', classes {:?}",
            path, input_name, session.outputs[0].name, num_classes
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            num_classes,
        })
    }

    /// Validates that the model has the expected input/output structure and
    /// returns the class count the output declares, if static.
    fn validate_model(session: &Session, expected_input: [usize; 4]) -> Result<Option<usize>, ClassifierError> {
        let input = session.inputs.first().ok_or_else(|| {
            ClassifierError::Build("Model must have at least 1 input for the image tensor".to_string())
        })?;
        let output = session.outputs.first().ok_or_else(|| {
            ClassifierError::Build("Model must have at least 1 output for class scores".to_string())
        })?;

        match &input.input_type {
            ValueType::Tensor { ty, dimensions, .. } => {
                require_f32("input", &input.name, *ty)?;
                if !input_shape_compatible(dimensions, expected_input) {
                    return Err(ClassifierError::Build(format!(
                        "Model input '{}' has shape {:?}, expected {:?} (NHWC)",
                        input.name, dimensions, expected_input
                    )));
                }
            }
            other => {
                return Err(ClassifierError::Build(format!(
                    "Model input '{}' is not a tensor: {:?}",
                    input.name, other
                )));
            }
        }

        match &output.output_type {
            ValueType::Tensor { ty, dimensions, .. } => {
                require_f32("output", &output.name, *ty)?;
                Ok(declared_classes(dimensions))
            }
            other => Err(ClassifierError::Build(format!(
                "Model output '{}' is not a tensor: {:?}",
                output.name, other
            ))),
        }
    }
}

/// Rejects tensors whose elements are not `f32`; the preprocessor and the
/// score extraction only speak `f32`.
pub(crate) fn require_f32(kind: &str, name: &str, ty: TensorElementType) -> Result<(), ClassifierError> {
    if ty == TensorElementType::Float32 {
        return Ok(());
    }
    Err(ClassifierError::Build(format!(
        "Model {} '{}' has element type {:?}, expected f32",
        kind, name, ty
    )))
}

/// Whether a model input shape accepts the preprocessor's tensor.
/// Dynamic dimensions (reported as non-positive) match anything.
pub(crate) fn input_shape_compatible(dimensions: &[i64], expected: [usize; 4]) -> bool {
    dimensions.len() == expected.len()
        && dimensions
            .iter()
            .zip(expected.iter())
            .all(|(&actual, &expected)| actual <= 0 || actual as usize == expected)
}

/// The static class count of an output shape: its last dimension, unless dynamic.
pub(crate) fn declared_classes(dimensions: &[i64]) -> Option<usize> {
    dimensions
        .last()
        .and_then(|&d| usize::try_from(d).ok())
        .filter(|&d| d > 0)
}

/// Flattens a model output to one score per class.
///
/// Accepts `[N]` as well as `[1, N]` (or any shape with unit leading dims).
pub(crate) fn scores_from_output(output: ArrayViewD<f32>) -> Result<Array1<f32>, ClassifierError> {
    let shape = output.shape();
    let leading = &shape[..shape.len().saturating_sub(1)];
    if shape.is_empty() || leading.iter().any(|&d| d != 1) {
        return Err(ClassifierError::Inference(format!(
            "Expected output of shape [1, classes], got {:?}",
            shape
        )));
    }
    Ok(Array1::from_iter(output.iter().copied()))
}

impl InferenceBackend for OnnxModel {
    fn infer(&self, input: Array4<f32>) -> Result<Array1<f32>, ClassifierError> {
        let tensor = Tensor::from_array(input)
            .map_err(|e| ClassifierError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), tensor);

        let session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("Model session lock poisoned".into()))?;
        let outputs = session
            .run(input_tensors)
            .map_err(|e| ClassifierError::Inference(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        scores_from_output(output_tensor)
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}
