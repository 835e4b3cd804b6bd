use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};

use super::classifier::Classifier;
use super::error::ClassifierError;
use super::model::{InferenceBackend, OnnxModel};
use super::preprocess::ImagePreprocessor;
use crate::artifacts::ArtifactStore;
use crate::labels::LabelSet;
use crate::runtime::RuntimeConfig;

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Default)]
pub struct ClassifierBuilder {
    model_path: Option<PathBuf>,
    backend: Option<Arc<dyn InferenceBackend>>,
    labels: Option<LabelSet>,
    preprocessor: ImagePreprocessor,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use breedscope::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            model_path: None,
            backend: None,
            labels: None,
            preprocessor: ImagePreprocessor::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before [`with_model_file`](Self::with_model_file) to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Replaces the default 224x224 preprocessor.
    ///
    /// Must be called before [`with_model_file`](Self::with_model_file), which
    /// validates the model input against the preprocessor's output shape.
    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Loads an ONNX model file into ONNX Runtime
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The path is empty or the file doesn't exist
    ///   - A model is already set
    ///   - The model failed to load
    ///   - The model's input shape doesn't match the preprocessor
    pub fn with_model_file<P: AsRef<Path>>(mut self, model_path: P) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(ClassifierError::Build("Model path cannot be empty".to_string()));
        }
        if self.backend.is_some() {
            return Err(ClassifierError::Build("Model already set".to_string()));
        }
        if !model_path.is_file() {
            return Err(ClassifierError::Build(format!("Model file not found: {}", model_path.display())));
        }

        let model = OnnxModel::from_file(model_path, &self.runtime_config, self.preprocessor.output_shape())
            .map_err(|e| {
                error!("Failed to load model: {}", e);
                e
            })?;

        self.model_path = Some(model_path.to_path_buf());
        self.backend = Some(Arc::new(model));
        Ok(self)
    }

    /// Uses an already constructed inference backend instead of a model file.
    pub fn with_backend<B: InferenceBackend + 'static>(mut self, backend: Arc<B>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Loads the label set from a newline-separated text file
    pub fn with_labels_file<P: AsRef<Path>>(mut self, labels_path: P) -> Result<Self, ClassifierError> {
        self.labels = Some(LabelSet::from_file(labels_path)?);
        Ok(self)
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Loads model and labels from an artifact store, verifying the model's
    /// SHA-256 digest first when one is given.
    pub fn with_artifacts(
        self,
        store: &ArtifactStore,
        expected_model_hash: Option<&str>,
    ) -> Result<Self, ClassifierError> {
        store.ensure_present()?;
        if let Some(hash) = expected_model_hash {
            store.verify_model(hash)?;
            info!("Model checksum verified");
        }
        self.with_labels_file(store.get_labels_path())?
            .with_model_file(store.get_model_path())
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier if successful, or an error if:
    ///   - No model has been set
    ///   - No labels have been set, or the label set is empty
    ///   - The model declares a class count that differs from the label count
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let backend = self
            .backend
            .ok_or_else(|| ClassifierError::Build("A model must be set".to_string()))?;
        let labels = self
            .labels
            .ok_or_else(|| ClassifierError::Build("Labels must be set".to_string()))?;
        if labels.is_empty() {
            return Err(ClassifierError::Build("At least one label is required".to_string()));
        }

        match backend.num_classes() {
            Some(classes) if classes != labels.len() => {
                return Err(ClassifierError::Build(format!(
                    "Model outputs {} classes but {} labels were loaded",
                    classes,
                    labels.len()
                )));
            }
            Some(_) => info!("Label count matches model output ({} classes)", labels.len()),
            None => info!(
                "Model output size is dynamic; label count ({}) will be checked per request",
                labels.len()
            ),
        }

        Ok(Classifier {
            model_path: self.model_path,
            labels,
            preprocessor: self.preprocessor,
            backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array4};

    struct DeclaredClasses(usize);

    impl InferenceBackend for DeclaredClasses {
        fn infer(&self, _input: Array4<f32>) -> Result<Array1<f32>, ClassifierError> {
            Ok(Array1::zeros(self.0))
        }

        fn num_classes(&self) -> Option<usize> {
            Some(self.0)
        }
    }

    #[test]
    fn test_build_requires_model() {
        let result = ClassifierBuilder::new()
            .with_labels(LabelSet::new(["a"]))
            .build();
        assert!(matches!(result, Err(ClassifierError::Build(_))));
    }

    #[test]
    fn test_build_requires_labels() {
        let result = ClassifierBuilder::new()
            .with_backend(Arc::new(DeclaredClasses(1)))
            .build();
        assert!(matches!(result, Err(ClassifierError::Build(_))));

        let result = ClassifierBuilder::new()
            .with_backend(Arc::new(DeclaredClasses(0)))
            .with_labels(LabelSet::new(Vec::<String>::new()))
            .build();
        assert!(matches!(result, Err(ClassifierError::Build(_))));
    }

    #[test]
    fn test_class_count_mismatch() {
        let result = ClassifierBuilder::new()
            .with_backend(Arc::new(DeclaredClasses(5)))
            .with_labels(LabelSet::new(["a", "b", "c"]))
            .build();
        assert!(matches!(result, Err(ClassifierError::Build(_))));
    }

    #[test]
    fn test_class_count_match() -> Result<(), ClassifierError> {
        let classifier = ClassifierBuilder::new()
            .with_backend(Arc::new(DeclaredClasses(2)))
            .with_labels(LabelSet::new(["a", "b"]))
            .build()?;
        let info = classifier.info();
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.input_shape, [1, 224, 224, 3]);
        assert!(info.model_path.is_none());
        Ok(())
    }

    #[test]
    fn test_model_path_validation() {
        let result = ClassifierBuilder::new().with_model_file("");
        assert!(matches!(result, Err(ClassifierError::Build(_))));

        let result = ClassifierBuilder::new().with_model_file("/nonexistent/model.onnx");
        assert!(matches!(result, Err(ClassifierError::Build(_))));
    }

    #[test]
    fn test_missing_artifacts() {
        let store = ArtifactStore::new("/nonexistent/breedscope");
        let result = ClassifierBuilder::new().with_artifacts(&store, None);
        assert!(matches!(result, Err(ClassifierError::Artifact(_))));
    }
}
