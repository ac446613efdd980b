//! Configuration types for ghostcode

use crate::codecs::HwAccel;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Decoder/encoder thread count passed through to FFmpeg
pub const DEFAULT_THREADS: &str = "auto";

/// Transcode configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Input media file
    pub input: PathBuf,
    /// Output media file (None = derived from input)
    pub output: Option<PathBuf>,
    /// Hardware decoding method
    pub hwaccel: Option<HwAccel>,
    /// Decoder name (None = FFmpeg default for the stream)
    pub decoder: Option<String>,
    /// Encoder name (None = container default)
    pub encoder: Option<String>,
    /// FFmpeg "threads" option for both codecs
    pub threads: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            hwaccel: None,
            decoder: None,
            encoder: None,
            threads: DEFAULT_THREADS.to_string(),
        }
    }
}

impl TranscodeConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Load defaults from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse defaults from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_hwaccel(mut self, hwaccel: HwAccel) -> Self {
        self.hwaccel = Some(hwaccel);
        self
    }

    pub fn with_decoder(mut self, decoder: impl Into<String>) -> Self {
        self.decoder = Some(decoder.into());
        self
    }

    pub fn with_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.encoder = Some(encoder.into());
        self
    }

    pub fn with_threads(mut self, threads: impl Into<String>) -> Self {
        self.threads = threads.into();
        self
    }

    /// Explicit output, or `<input stem>_out<ext>` next to the input
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.input),
        }
    }
}

/// Derive the default output path for an input file.
///
/// `_out` goes before the extension; inputs without one get `.mp4`.
/// A leading dot does not start an extension, so `.clip` becomes
/// `.clip_out.mp4`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name.as_str(), ".mp4"),
    };

    input.with_file_name(format!("{}_out{}", stem, extension))
}
