use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// A validated language for whisper transcription.
///
/// Wraps a language code that has been verified against whisper.cpp's
/// supported language list. Accepts both short codes ("en", "de") and full
/// names ("english", "german"). Use `Language::Auto` for detection.
#[derive(Debug, Clone)]
pub enum Language {
    /// Auto-detect language from audio.
    Auto,
    /// A validated language code (e.g. "en", "de", "ja").
    Code {
        /// Short code as whisper expects it.
        code: String,
        /// Whisper internal language ID.
        id: i32,
    },
}

impl Language {
    /// Create a language from a code or full name, validating against whisper.cpp.
    pub fn new(lang: &str) -> Result<Self, Error> {
        let lower = lang.trim().to_lowercase();
        if lower == "auto" {
            return Ok(Language::Auto);
        }

        match whisper_rs::get_lang_id(&lower) {
            Some(id) => {
                // Normalize full names to the short code
                let code = whisper_rs::get_lang_str(id).unwrap_or(&lower).to_string();
                Ok(Language::Code { code, id })
            }
            None => Err(Error::UnsupportedLanguage(lang.to_string())),
        }
    }

}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Auto => write!(f, "auto"),
            Language::Code { code, .. } => write!(f, "{code}"),
        }
    }
}

/// Whisper model sizes.
#[derive(Debug, Clone)]
pub enum Model {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV3,
    LargeV3Turbo,
}

impl Model {
    /// Model filename as used by HuggingFace / whisper.cpp.
    pub fn filename(&self) -> &'static str {
        match self {
            Model::Tiny => "ggml-tiny.bin",
            Model::TinyEn => "ggml-tiny.en.bin",
            Model::Base => "ggml-base.bin",
            Model::BaseEn => "ggml-base.en.bin",
            Model::Small => "ggml-small.bin",
            Model::SmallEn => "ggml-small.en.bin",
            Model::Medium => "ggml-medium.bin",
            Model::MediumEn => "ggml-medium.en.bin",
            Model::LargeV3 => "ggml-large-v3.bin",
            Model::LargeV3Turbo => "ggml-large-v3-turbo.bin",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        match self {
            Model::Tiny => "tiny",
            Model::TinyEn => "tiny.en",
            Model::Base => "base",
            Model::BaseEn => "base.en",
            Model::Small => "small",
            Model::SmallEn => "small.en",
            Model::Medium => "medium",
            Model::MediumEn => "medium.en",
            Model::LargeV3 => "large-v3",
            Model::LargeV3Turbo => "large-v3-turbo",
        }
    }
}

/// Configuration for a [`crate::Pipeline`].
///
/// Everything a job touches is injected here: the directory for intermediate
/// audio, the directory for finished subtitles, the model tier, and how long
/// intermediate audio is retained after completion. The model tier is an
/// operator decision made at construction, not a per-request knob.
pub struct PipelineConfig {
    /// Directory for per-job intermediate audio files (`<job_id>.wav`).
    pub uploads_dir: PathBuf,
    /// Directory for finished subtitle files (`<job_id>.srt`).
    pub downloads_dir: PathBuf,
    /// Whisper model tier to transcribe with.
    pub model: Model,
    /// Model cache directory (default: `~/.cache/subgen/models`).
    pub model_cache_dir: Option<PathBuf>,
    /// How long to keep a job's intermediate audio after completion.
    pub audio_retention: Duration,
    /// Use GPU acceleration when whisper.cpp was built with support for it.
    pub gpu: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            downloads_dir: PathBuf::from("downloads"),
            model: Model::Base,
            model_cache_dir: None,
            audio_retention: Duration::from_secs(3600),
            gpu: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = dir.into();
        self
    }

    pub fn downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = dir.into();
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn model_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_cache_dir = Some(dir.into());
        self
    }

    pub fn audio_retention(mut self, retention: Duration) -> Self {
        self.audio_retention = retention;
        self
    }

    pub fn gpu(mut self, enabled: bool) -> Self {
        self.gpu = enabled;
        self
    }

    /// Resolve the model cache directory, defaulting to ~/.cache/subgen/models.
    pub fn resolve_model_cache_dir(&self) -> PathBuf {
        self.model_cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("subgen")
                .join("models")
        })
    }
}
