pub mod audio;
pub mod cleanup;
pub mod config;
pub mod download;
pub mod error;
pub mod model;
pub mod srt;
pub mod transcribe;
pub mod types;

pub use config::{Language, Model, PipelineConfig};
pub use error::{Error, Result};
pub use types::{Segment, Transcript};

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

/// A finished transcription job.
pub struct CompletedJob {
    /// Short opaque identifier, also the stem of both job files.
    pub job_id: String,
    /// Path of the subtitle file under the downloads directory.
    pub srt_path: PathBuf,
    /// The transcript the subtitles were rendered from.
    pub transcript: Transcript,
}

/// The download → transcribe → format pipeline.
///
/// One instance serves any number of concurrent jobs; each job gets its own
/// identifier and its own files, and the stages of a single job run strictly
/// in sequence. First failure aborts the job, removes its intermediate audio,
/// and leaves no subtitle file behind.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, ensuring both working directories exist.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.uploads_dir)?;
        std::fs::create_dir_all(&config.downloads_dir)?;
        info!(
            model = config.model.name(),
            uploads_dir = %config.uploads_dir.display(),
            downloads_dir = %config.downloads_dir.display(),
            "pipeline ready"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one job to completion: download the URL's audio, transcribe it,
    /// and write `<downloads_dir>/<job_id>.srt`.
    ///
    /// On success the intermediate audio file is scheduled for deletion after
    /// the configured retention window, without blocking the caller.
    pub async fn run(&self, url: &str, language: Language) -> Result<CompletedJob> {
        let job_id = self.mint_job_id();
        info!(%job_id, %url, language = %language, "job accepted");

        let downloaded =
            download::download_audio(url, &job_id, &self.config.uploads_dir).await?;
        if let Some(title) = &downloaded.title {
            info!(%job_id, title = %title, "source downloaded");
        }

        let audio_path = downloaded.audio_path;
        match self.finish_job(&job_id, &audio_path, language).await {
            Ok(job) => {
                cleanup::schedule_removal(audio_path, self.config.audio_retention);
                Ok(job)
            }
            Err(e) => {
                // Failed jobs keep nothing around
                if let Err(rm) = std::fs::remove_file(&audio_path) {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(%job_id, error = %rm, "failed to remove audio after job failure");
                    }
                }
                Err(e)
            }
        }
    }

    /// Transcribe the downloaded audio and write the subtitle file.
    async fn finish_job(
        &self,
        job_id: &str,
        audio_path: &Path,
        language: Language,
    ) -> Result<CompletedJob> {
        let cache_dir = self.config.resolve_model_cache_dir();
        let model_path = model::ensure_model(&self.config.model, &cache_dir).await?;

        // Decoding and inference are CPU-bound; keep them off the dispatcher.
        let path = audio_path.to_path_buf();
        let gpu = self.config.gpu;
        let transcript = tokio::task::spawn_blocking(move || {
            let samples = audio::load_audio(&path)?;
            transcribe::transcribe_samples(&samples, &model_path, &language, gpu)
        })
        .await??;

        let srt_path = self.config.downloads_dir.join(format!("{job_id}.srt"));
        tokio::fs::write(&srt_path, transcript.to_srt()).await?;

        info!(
            job_id,
            language = %transcript.language,
            duration_secs = format!("{:.1}", transcript.duration),
            segments = transcript.segments.len(),
            "job completed"
        );

        Ok(CompletedJob {
            job_id: job_id.to_string(),
            srt_path,
            transcript,
        })
    }

    /// Mint a short job identifier that no existing job file is using.
    fn mint_job_id(&self) -> String {
        loop {
            let mut id = Uuid::new_v4().simple().to_string();
            id.truncate(8);

            let audio = self.config.uploads_dir.join(format!("{id}.wav"));
            let srt = self.config.downloads_dir.join(format!("{id}.srt"));
            if !audio.exists() && !srt.exists() {
                return id;
            }
        }
    }
}
