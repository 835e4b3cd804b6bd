//! An HTTP image classifier serving a single pre-trained ONNX model.
//!
//! Images arrive base64-encoded, are resized to 224x224 RGB and scaled into
//! `[0, 1]`, and the model's highest scoring class is returned with its raw
//! score.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use breedscope::{Classifier, ClassifyRequest};
//!
//! let classifier = Classifier::builder()
//!     .with_labels_file("artifacts/labels.txt")?
//!     .with_model_file("artifacts/model.onnx")?
//!     .build()?;
//!
//! let image = std::fs::read("cow.jpg")?;
//! let prediction = classifier.classify_bytes(&image)?;
//! println!("{} ({:.1}%)", prediction.breed, prediction.confidence * 100.0);
//!
//! // Requests carry the image as base64
//! let request = ClassifyRequest::new("iVBORw0KGgo...");
//! let _ = classifier.classify(&request);
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use breedscope::server::{router, AppState};
//! use breedscope::{ArtifactStore, Classifier};
//!
//! let store = ArtifactStore::new("artifacts");
//! let classifier = Classifier::builder().with_artifacts(&store, None)?.build()?;
//! let app = router(AppState::new(classifier, "Server is running"), 50 * 1024 * 1024);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod labels;
mod runtime;
pub mod server;

pub use artifacts::{ArtifactError, ArtifactStore};
pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, ClassifyRequest,
    ImagePreprocessor, InferenceBackend, OnnxModel, Prediction,
};
pub use config::ServerConfig;
pub use labels::{LabelError, LabelSet};
pub use runtime::{create_session_builder, RuntimeConfig};

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
