use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Schedule `path` for deletion after `delay`, off the request path.
///
/// The returned handle can be aborted to cancel a pending removal; dropping
/// it detaches the task and the removal still runs. A file that is already
/// gone at fire time is not an error.
pub fn schedule_removal(path: PathBuf, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed intermediate file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove intermediate file")
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn removes_file_after_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.wav");
        std::fs::write(&path, b"pcm").unwrap();

        let handle = schedule_removal(path.clone(), Duration::from_secs(3600));
        assert!(path.exists());

        tokio::time::advance(Duration::from_secs(3601)).await;
        handle.await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-existed.wav");

        let handle = schedule_removal(path, Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_removal_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.wav");
        std::fs::write(&path, b"pcm").unwrap();

        let handle = schedule_removal(path.clone(), Duration::from_secs(3600));
        handle.abort();
        let _ = handle.await;

        tokio::time::advance(Duration::from_secs(7200)).await;
        assert!(path.exists());
    }
}
