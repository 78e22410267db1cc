//! File-backed implementation of `AuditWriter`.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/<planId>/plan.json
//! <root>/<planId>/execution-<unixMillis>-<stepIndex>.json
//! <root>/<planId>/execution-<unixMillis>-<stepIndex>-<n>.json   (collision)
//! ```
//!
//! Every file is created exclusively, so nothing already on disk is ever
//! overwritten.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    execution::ExecutionRecord,
    plan::{Plan, PlanId},
};
use guardrail_core::traits::AuditWriter;

const PLAN_FILE: &str = "plan.json";
const MAX_COLLISION_SUFFIX: u32 = 1_000;

/// Writes pretty-printed JSON records into one directory per plan.
#[derive(Debug, Clone)]
pub struct FileAuditWriter {
    root: PathBuf,
}

impl FileAuditWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every record for `plan_id`.
    pub fn plan_dir(&self, plan_id: &PlanId) -> PathBuf {
        self.root.join(plan_id.to_string())
    }

    async fn ensure_plan_dir(&self, plan_id: &PlanId) -> GuardrailResult<PathBuf> {
        let dir = self.plan_dir(plan_id);
        fs::create_dir_all(&dir).await.map_err(|e| GuardrailError::AuditWriteFailed {
            reason: format!("failed to create audit directory '{}': {}", dir.display(), e),
        })?;
        Ok(dir)
    }
}

fn to_json<T: Serialize>(value: &T) -> GuardrailResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| GuardrailError::AuditWriteFailed {
        reason: format!("failed to serialize audit record: {}", e),
    })
}

/// Create `path` exclusively and write `contents`.
///
/// Returns the raw I/O error so callers can tell `AlreadyExists` apart.
async fn create_exclusive(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

fn write_failed(path: &Path, e: std::io::Error) -> GuardrailError {
    GuardrailError::AuditWriteFailed {
        reason: format!("failed to write '{}': {}", path.display(), e),
    }
}

#[async_trait]
impl AuditWriter for FileAuditWriter {
    /// Fails if `plan.json` already exists for this plan id.
    async fn write_plan(&self, plan: &Plan) -> GuardrailResult<()> {
        let contents = to_json(plan)?;
        let path = self.ensure_plan_dir(&plan.id).await?.join(PLAN_FILE);

        create_exclusive(&path, &contents)
            .await
            .map_err(|e| write_failed(&path, e))?;

        info!(plan_id = %plan.id, path = %path.display(), "plan audit written");
        Ok(())
    }

    async fn write_execution(&self, plan_id: &PlanId, record: &ExecutionRecord) -> GuardrailResult<()> {
        let contents = to_json(record)?;
        let dir = self.ensure_plan_dir(plan_id).await?;
        let stem = format!(
            "execution-{}-{}",
            record.recorded_at.timestamp_millis(),
            record.step_index
        );

        for suffix in 0..=MAX_COLLISION_SUFFIX {
            let name = if suffix == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}-{suffix}.json")
            };
            let path = dir.join(name);

            match create_exclusive(&path, &contents).await {
                Ok(()) => {
                    info!(
                        plan_id = %plan_id,
                        step = record.step_index,
                        path = %path.display(),
                        "execution audit written"
                    );
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "execution audit file exists, trying next suffix");
                }
                Err(e) => return Err(write_failed(&path, e)),
            }
        }

        Err(GuardrailError::AuditWriteFailed {
            reason: format!(
                "no free file name for {stem} in '{}' after {} attempts",
                dir.display(),
                MAX_COLLISION_SUFFIX + 1
            ),
        })
    }
}
