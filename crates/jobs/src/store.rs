//! On-disk lifecycle of uploaded inputs and predicted outputs.
//!
//! Every bulk request gets its own id, so concurrent requests never share
//! file paths. Writes land in a temp file and are renamed into place, so a
//! download never observes a partially written table. Stale files are
//! swept opportunistically when new work arrives.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::JobError;

/// Default retention window for job files.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

/// Identifier for one bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(String);

impl JobId {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// File store rooted at a data directory, with `uploads/` and `outputs/`
/// subdirectories.
#[derive(Debug)]
pub struct JobStore {
    uploads_dir: PathBuf,
    outputs_dir: PathBuf,
    retention: Duration,
}

impl JobStore {
    /// Open a store under `data_dir`, creating directories as needed.
    pub async fn open(data_dir: &Path, retention: Duration) -> Result<Self, JobError> {
        let uploads_dir = data_dir.join("uploads");
        let outputs_dir = data_dir.join("outputs");
        fs::create_dir_all(&uploads_dir).await?;
        fs::create_dir_all(&outputs_dir).await?;
        Ok(Self {
            uploads_dir,
            outputs_dir,
            retention,
        })
    }

    /// Allocate an id for a new bulk request.
    pub fn new_job(&self) -> JobId {
        JobId::generate()
    }

    /// Public name of the output file for a job.
    pub fn output_name(&self, id: &JobId) -> String {
        format!("predicted_{}.csv", id.as_str())
    }

    fn upload_path(&self, id: &JobId) -> PathBuf {
        self.uploads_dir.join(format!("upload_{}.csv", id.as_str()))
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.outputs_dir.join(name)
    }

    /// Persist the uploaded bytes for a job.
    pub async fn save_upload(&self, id: &JobId, bytes: &[u8]) -> Result<PathBuf, JobError> {
        let path = self.upload_path(id);
        write_atomic(&path, bytes).await?;
        Ok(path)
    }

    /// Persist the predicted output for a job and return its public name.
    pub async fn save_output(&self, id: &JobId, bytes: &[u8]) -> Result<String, JobError> {
        let name = self.output_name(id);
        write_atomic(&self.output_path(&name), bytes).await?;
        Ok(name)
    }

    /// Read a previously published output by its public name.
    ///
    /// Names with path separators or parent references are rejected so a
    /// caller cannot escape the output directory.
    pub async fn read_output(&self, name: &str) -> Result<Vec<u8>, JobError> {
        if !is_safe_name(name) {
            return Err(JobError::NotFound);
        }
        match fs::read(self.output_path(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(JobError::NotFound),
            Err(err) => Err(JobError::Io(err)),
        }
    }

    /// Remove job files older than the retention window.
    pub async fn sweep_expired(&self) {
        for dir in [&self.uploads_dir, &self.outputs_dir] {
            if let Err(err) = sweep_dir(dir, self.retention).await {
                warn!("retention sweep failed for {}: {}", dir.display(), err);
            }
        }
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), JobError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn sweep_dir(dir: &Path, retention: Duration) -> std::io::Result<()> {
    let now = SystemTime::now();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let modified = entry.metadata().await?.modified()?;
        let expired = now
            .duration_since(modified)
            .map(|age| age > retention)
            .unwrap_or(false);
        if expired {
            debug!("sweeping expired job file {:?}", entry.file_name());
            let _ = fs::remove_file(entry.path()).await;
        }
    }
    Ok(())
}
