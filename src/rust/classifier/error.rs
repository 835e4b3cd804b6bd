use ort::Error as OrtError;

use crate::artifacts::ArtifactError;
use crate::labels::LabelError;

/// Represents the different types of errors that can occur while building
/// the classifier or classifying an image.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The request carried no `image` field
    #[error("No image provided")]
    MissingImage,
    /// The `image` field was not valid base64
    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    /// The decoded bytes are not an image the codec understands
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    /// The image decoded but cannot be turned into a 3-channel pixel grid
    #[error("Unsupported image format: {0}")]
    Format(String),
    /// The inference engine failed or produced unusable output
    #[error("Inference error: {0}")]
    Inference(String),
    /// The model picked a class the label set does not name
    #[error("Model predicted class {index} but only {num_labels} labels are loaded")]
    LabelMismatch { index: usize, num_labels: usize },
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    Build(String),
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl ClassifierError {
    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::MissingImage | Self::InvalidBase64(_) | Self::Decode(_) | Self::Format(_) => true,
            Self::Inference(_)
            | Self::LabelMismatch { .. }
            | Self::Build(_)
            | Self::Labels(_)
            | Self::Artifact(_) => false,
        }
    }
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::Build(err.to_string())
    }
}
