use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Result of downloading audio for one job.
pub struct DownloadResult {
    pub audio_path: PathBuf,
    pub title: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::Download(format!(
            "invalid URL (must start with http:// or https://): {trimmed}"
        )))
    }
}

/// Download the audio track of a video URL to `<output_dir>/<job_id>.wav`
/// using yt-dlp, extracting the best audio-only stream as WAV.
///
/// The URL is scheme-validated, arguments are passed without shell expansion,
/// and `--no-exec` keeps yt-dlp from running post-processing commands. The
/// final path is derived from the job id, never parsed from tool output.
pub async fn download_audio(url: &str, job_id: &str, output_dir: &Path) -> Result<DownloadResult> {
    validate_url(url)?;

    info!(%url, job_id, "downloading audio");

    let check = tokio::process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await;

    if check.is_err() {
        return Err(Error::YtDlpNotFound);
    }

    std::fs::create_dir_all(output_dir)?;

    let audio_path = output_dir.join(format!("{job_id}.wav"));
    let output_template = output_dir
        .join(format!("{job_id}.%(ext)s"))
        .to_str()
        .ok_or_else(|| Error::Download("output directory path contains invalid UTF-8".into()))?
        .to_string();

    // Metadata probe, for logging only; failures here are not fatal
    let info_output = tokio::process::Command::new("yt-dlp")
        .args(["--dump-json", "--no-download", "--no-exec"])
        .arg(url)
        .output()
        .await?;

    let probe: Option<YtDlpInfo> = if info_output.status.success() {
        serde_json::from_slice(&info_output.stdout).ok()
    } else {
        None
    };

    if let Some(info) = &probe {
        debug!(
            title = info.title.as_deref().unwrap_or("unknown"),
            duration = info.duration.unwrap_or(0.0),
            "source metadata"
        );
    }

    let output = tokio::process::Command::new("yt-dlp")
        .args([
            "--extract-audio",
            "--audio-format",
            "wav",
            "--audio-quality",
            "0",
            "--no-playlist",
            "--no-exec",
            "--output",
        ])
        .arg(&output_template)
        .arg(url)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Limit error message length to avoid dumping huge stderr
        let stderr_truncated: String = stderr.chars().take(1000).collect();
        return Err(Error::Download(format!("yt-dlp failed: {stderr_truncated}")));
    }

    if !audio_path.exists() {
        return Err(Error::Download(format!(
            "audio file not created at {}",
            audio_path.display()
        )));
    }

    debug!(path = %audio_path.display(), "audio downloaded");

    Ok(DownloadResult {
        audio_path,
        title: probe.as_ref().and_then(|i| i.title.clone()),
        duration: probe.as_ref().and_then(|i| i.duration),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_https() {
        assert!(validate_url("https://youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_http() {
        assert!(validate_url("http://example.com/video.mp4").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_no_scheme() {
        assert!(validate_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_validate_url_rejects_file_scheme() {
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_validate_url_rejects_empty() {
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_url_rejects_shell_metacharacters() {
        assert!(validate_url("$(whoami)").is_err());
        assert!(validate_url("| cat /etc/passwd").is_err());
    }
}
