use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use clap::Parser;

use crate::artifacts::ArtifactStore;
use crate::runtime::RuntimeConfig;

pub const DEFAULT_STATUS: &str = "Server is running 🚀";

/// Serve a pre-trained image classification model over HTTP
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(long, env = "BREEDSCOPE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "BREEDSCOPE_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding model.onnx and labels.txt
    #[arg(long, env = "BREEDSCOPE_HOME")]
    pub artifact_dir: Option<PathBuf>,

    /// Path to the ONNX model (overrides the artifact directory)
    #[arg(short, long, env = "BREEDSCOPE_MODEL")]
    pub model: Option<PathBuf>,

    /// Path to the label file (overrides the artifact directory)
    #[arg(short, long, env = "BREEDSCOPE_LABELS")]
    pub labels: Option<PathBuf>,

    /// Expected SHA-256 of the model file; startup fails on mismatch
    #[arg(long, env = "BREEDSCOPE_MODEL_SHA256")]
    pub model_sha256: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long, env = "BREEDSCOPE_BODY_LIMIT", default_value_t = 50 * 1024 * 1024)]
    pub body_limit: usize,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, env = "BREEDSCOPE_INTRA_THREADS", default_value_t = 0)]
    pub intra_threads: usize,

    /// ONNX Runtime inter-op threads (0 lets the runtime decide)
    #[arg(long, env = "BREEDSCOPE_INTER_THREADS", default_value_t = 0)]
    pub inter_threads: usize,

    /// Graph optimization level, 0 (disabled) to 3
    #[arg(long, env = "BREEDSCOPE_OPT_LEVEL", default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub opt_level: u8,

    /// Status message reported by the health endpoint
    #[arg(long, env = "BREEDSCOPE_STATUS", default_value = DEFAULT_STATUS)]
    pub status: String,
}

impl ServerConfig {
    /// Listen address. Accepts IPv4, IPv6 (bare or bracketed) and hostnames.
    pub fn socket_addr(&self) -> io::Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (host, self.port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("host '{}' resolved to no addresses", self.host),
            )
        })
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        let mut store = match &self.artifact_dir {
            Some(dir) => ArtifactStore::new(dir),
            None => ArtifactStore::new_default(),
        };
        if let Some(model) = &self.model {
            store = store.with_model_path(model);
        }
        if let Some(labels) = &self.labels {
            store = store.with_labels_path(labels);
        }
        store
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: RuntimeConfig::optimization_level_from(self.opt_level),
        }
    }
}
