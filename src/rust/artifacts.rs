use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub const MODEL_FILE_NAME: &str = "model.onnx";
pub const LABELS_FILE_NAME: &str = "labels.txt";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Locates the model and label files the server loads at startup.
///
/// Both default to fixed names inside an artifact directory; either can be
/// overridden with an explicit path.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifact_dir: PathBuf,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
}

impl ArtifactStore {
    /// Creates a store rooted at the default artifact directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_artifact_dir())
    }

    /// Returns the default artifact directory path
    pub fn get_default_artifact_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("BREEDSCOPE_HOME") {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("breedscope");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("breedscope");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("breedscope")
    }

    pub fn new<P: AsRef<Path>>(artifact_dir: P) -> Self {
        Self {
            artifact_dir: artifact_dir.as_ref().to_path_buf(),
            model_path: None,
            labels_path: None,
        }
    }

    pub fn with_model_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.model_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_labels_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.labels_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn get_model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.artifact_dir.join(MODEL_FILE_NAME))
    }

    pub fn get_labels_path(&self) -> PathBuf {
        self.labels_path
            .clone()
            .unwrap_or_else(|| self.artifact_dir.join(LABELS_FILE_NAME))
    }

    /// Checks that both artifacts exist, naming the first one missing.
    pub fn ensure_present(&self) -> Result<(), ArtifactError> {
        let model_path = self.get_model_path();
        let labels_path = self.get_labels_path();
        log::info!("Checking artifacts:");
        log::info!("  Model path: {:?} (exists: {})", model_path, model_path.is_file());
        log::info!("  Labels path: {:?} (exists: {})", labels_path, labels_path.is_file());

        for path in [&model_path, &labels_path] {
            if !path.is_file() {
                return Err(ArtifactError::NotFound(path.display().to_string()));
            }
        }
        Ok(())
    }

    /// Verifies the model file against an expected SHA-256 hex digest.
    pub fn verify_model(&self, expected_hash: &str) -> Result<(), ArtifactError> {
        let path = self.get_model_path();
        let actual = Self::hash_file(&path)?;
        let expected = expected_hash.trim().to_ascii_lowercase();
        log::info!("Calculated model hash: {}", actual);
        log::info!("Expected model hash:   {}", expected);

        if actual != expected {
            log::error!("model hash mismatch: expected {}, got {}", expected, actual);
            return Err(ArtifactError::HashMismatch {
                file_type: "model".to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn hash_file(path: &Path) -> Result<String, ArtifactError> {
        log::info!("Hashing file: {:?}", path);
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
