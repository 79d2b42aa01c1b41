use std::path::PathBuf;

/// All errors that can occur in subgen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("download error: {0}")]
    Download(String),

    #[error("yt-dlp not found (install with: pip install yt-dlp)")]
    YtDlpNotFound,

    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[error("unsupported language: \"{0}\"")]
    UnsupportedLanguage(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[error("model error: {0}")]
    Model(String),

    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
