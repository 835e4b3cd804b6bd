use std::path::PathBuf;

mod error;
mod model;
mod preprocess;
mod utils;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;

pub use error::ClassifierError;
pub use model::{InferenceBackend, OnnxModel};
pub use preprocess::{ImagePreprocessor, CHANNELS, INPUT_SIZE};
pub use builder::ClassifierBuilder;
pub use classifier::{decode_base64, Classifier, ClassifyRequest, Prediction};

use crate::labels::LabelSet;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, if the model was loaded from disk
    pub model_path: Option<PathBuf>,
    /// Number of classes the classifier can predict
    pub num_classes: usize,
    /// Labels of the classes, in model output order
    pub labels: LabelSet,
    /// Shape of the tensor fed to the model
    pub input_shape: [usize; 4],
}
