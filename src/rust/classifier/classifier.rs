use std::path::PathBuf;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use log::info;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::model::InferenceBackend;
use super::preprocess::ImagePreprocessor;
use super::utils::arg_max;
use crate::labels::LabelSet;

/// Standard alphabet, padding optional, non-zero trailing bits ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Body of a classification request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifyRequest {
    /// Base64-encoded image, optionally as a `data:<mime>;base64,` URL
    #[serde(default)]
    pub image: Option<String>,
}

impl ClassifyRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
        }
    }
}

/// The best class for one image and the model's raw score for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub breed: String,
    pub confidence: f32,
}

/// A single-model image classifier: labels, preprocessing and inference
/// engine, fixed at construction.
///
/// # Thread Safety
///
/// `Classifier` is `Send + Sync`; share it across request handlers with `Arc`.
/// The backend is responsible for serializing access to the engine.
#[derive(Clone)]
pub struct Classifier {
    pub model_path: Option<PathBuf>,
    pub labels: LabelSet,
    pub preprocessor: ImagePreprocessor,
    pub(crate) backend: Arc<dyn InferenceBackend>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("model_path", &self.model_path)
            .field("labels", &self.labels)
            .field("preprocessor", &self.preprocessor)
            .finish_non_exhaustive()
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            num_classes: self.labels.len(),
            labels: self.labels.clone(),
            input_shape: self.preprocessor.output_shape(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Validates a request, decodes its image and classifies it.
    ///
    /// Inference is never invoked for a request without an image.
    pub fn classify(&self, request: &ClassifyRequest) -> Result<Prediction, ClassifierError> {
        let encoded = request.image.as_deref().ok_or(ClassifierError::MissingImage)?;
        let bytes = decode_base64(encoded)?;
        info!("Received image payload of {} bytes", bytes.len());
        self.classify_bytes(&bytes)
    }

    /// Classifies an encoded image (PNG, JPEG, ...).
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        let tensor = self.preprocessor.preprocess(bytes)?;
        let scores = self.backend.infer(tensor)?;

        let (index, confidence) = arg_max(scores.view()).ok_or_else(|| {
            ClassifierError::Inference(format!(
                "Model returned no usable scores ({} values)",
                scores.len()
            ))
        })?;
        let breed = self.labels.get(index).ok_or(ClassifierError::LabelMismatch {
            index,
            num_labels: self.labels.len(),
        })?;

        info!("Prediction: {} ({:.2}%)", breed, confidence * 100.0);
        Ok(Prediction {
            breed: breed.to_string(),
            confidence,
        })
    }
}

/// Decodes standard base64, tolerating a data-URL prefix, embedded line
/// breaks and missing padding.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, ClassifierError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(LENIENT_BASE64.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use ndarray::{Array1, Array4};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedScores {
        scores: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedScores {
        fn new(scores: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                scores,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl InferenceBackend for FixedScores {
        fn infer(&self, input: Array4<f32>) -> Result<Array1<f32>, ClassifierError> {
            assert_eq!(input.shape(), &[1, 224, 224, 3]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Array1::from(self.scores.clone()))
        }
    }

    fn classifier(backend: Arc<FixedScores>, labels: &[&str]) -> Classifier {
        Classifier::builder()
            .with_backend(backend)
            .with_labels(LabelSet::new(labels.iter().copied()))
            .build()
            .unwrap()
    }

    fn png_base64() -> String {
        let image = ImageBuffer::from_pixel(8, 8, Rgb([120u8, 80, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_selects_arg_max_label() {
        let backend = FixedScores::new(vec![0.1, 0.7, 0.2]);
        let classifier = classifier(backend.clone(), &["a", "b", "c"]);

        let prediction = classifier.classify(&ClassifyRequest::new(png_base64())).unwrap();
        assert_eq!(prediction, Prediction { breed: "b".into(), confidence: 0.7 });
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tie_selects_first() {
        let classifier = classifier(FixedScores::new(vec![0.5, 0.5]), &["first", "second"]);
        let prediction = classifier.classify(&ClassifyRequest::new(png_base64())).unwrap();
        assert_eq!(prediction.breed, "first");
    }

    #[test]
    fn test_missing_image_skips_inference() {
        let backend = FixedScores::new(vec![1.0]);
        let classifier = classifier(backend.clone(), &["only"]);

        let result = classifier.classify(&ClassifyRequest::default());
        assert!(matches!(result, Err(ClassifierError::MissingImage)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_idempotent() {
        let classifier = classifier(FixedScores::new(vec![0.3, 0.6, 0.1]), &["x", "y", "z"]);
        let request = ClassifyRequest::new(png_base64());
        let first = classifier.classify(&request).unwrap();
        let second = classifier.classify(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_base64() {
        let backend = FixedScores::new(vec![1.0]);
        let classifier = classifier(backend.clone(), &["only"]);

        let result = classifier.classify(&ClassifyRequest::new("***not base64***"));
        assert!(matches!(result, Err(ClassifierError::InvalidBase64(_))));
        assert!(result.unwrap_err().is_client_error());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_base64_that_is_not_an_image() {
        let classifier = classifier(FixedScores::new(vec![1.0]), &["only"]);
        let result = classifier.classify(&ClassifyRequest::new(STANDARD.encode("hello world")));
        assert!(matches!(result, Err(ClassifierError::Decode(_))));
    }

    #[test]
    fn test_out_of_range_index() {
        // Skip the build-time check by giving the backend no declared class count.
        let classifier = classifier(FixedScores::new(vec![0.1, 0.2, 0.9]), &["a", "b"]);
        let result = classifier.classify(&ClassifyRequest::new(png_base64()));
        assert!(matches!(
            result,
            Err(ClassifierError::LabelMismatch { index: 2, num_labels: 2 })
        ));
    }

    #[test]
    fn test_empty_scores() {
        let classifier = classifier(FixedScores::new(vec![]), &["a"]);
        let result = classifier.classify(&ClassifyRequest::new(png_base64()));
        assert!(matches!(result, Err(ClassifierError::Inference(_))));
    }

    #[test]
    fn test_labels_unchanged_by_classify() {
        let classifier = classifier(FixedScores::new(vec![0.9, 0.1]), &["a", "b"]);
        let before = classifier.labels().clone();
        classifier.classify(&ClassifyRequest::new(png_base64())).unwrap();
        assert_eq!(classifier.labels(), &before);
    }

    #[test]
    fn test_decode_base64_variants() {
        let plain = STANDARD.encode(b"cattle");
        assert_eq!(decode_base64(&plain).unwrap(), b"cattle");

        let unpadded = plain.trim_end_matches('=');
        assert_eq!(decode_base64(unpadded).unwrap(), b"cattle");

        let data_url = format!("data:image/png;base64,{}", plain);
        assert_eq!(decode_base64(&data_url).unwrap(), b"cattle");

        let wrapped = format!("{}\n{}\r\n", &plain[..4], &plain[4..]);
        assert_eq!(decode_base64(&wrapped).unwrap(), b"cattle");
    }

    #[test]
    fn test_decode_base64_non_canonical_trailing_bits() {
        // "QQ==" is the canonical encoding of "A"; "QR==" sets unused low bits.
        assert_eq!(decode_base64("QR==").unwrap(), b"A");
        assert_eq!(decode_base64("QR").unwrap(), b"A");
    }

    #[test]
    fn test_infinite_score_never_wins() {
        let mixed = classifier(FixedScores::new(vec![0.2, f32::INFINITY, 0.6]), &["a", "b", "c"]);
        let prediction = mixed.classify(&ClassifyRequest::new(png_base64())).unwrap();
        assert_eq!(prediction, Prediction { breed: "c".into(), confidence: 0.6 });

        let only_infinite = classifier(FixedScores::new(vec![f32::INFINITY]), &["a"]);
        let result = only_infinite.classify(&ClassifyRequest::new(png_base64()));
        assert!(matches!(result, Err(ClassifierError::Inference(_))));
    }

    #[test]
    fn test_request_deserialization() {
        let request: ClassifyRequest = serde_json::from_str(r#"{"image": "abc"}"#).unwrap();
        assert_eq!(request.image.as_deref(), Some("abc"));

        let request: ClassifyRequest = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert!(request.image.is_none());

        let request: ClassifyRequest = serde_json::from_str(r#"{"image": null}"#).unwrap();
        assert!(request.image.is_none());
    }
}
