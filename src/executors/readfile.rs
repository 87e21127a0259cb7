//! `readfile` executor: reads one or more files matched by a path or glob

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};

use super::{DefaultAssertions, Executor, ExecutorError, StepContext};
use crate::discovery;
use crate::models::ExecutorResult;

pub const NAME: &str = "readfile";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReadFileExecutor {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Serialize)]
struct ReadFileResult {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    contentjson: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    err: Option<String>,
    md5sum: BTreeMap<String, String>,
    size: BTreeMap<String, u64>,
    modtime: BTreeMap<String, u64>,
    #[serde(rename = "mod")]
    mode: BTreeMap<String, String>,
    timeseconds: f64,
    timehuman: String,
}

impl ReadFileExecutor {
    fn files(&self, ctx: &StepContext) -> Result<Vec<PathBuf>, String> {
        let target = ctx.workdir().join(ctx.expand(&self.path));
        let files = if target.is_dir() {
            discovery::files_in_dir(&target, None).map_err(|e| e.to_string())?
        } else {
            discovery::expand_pattern(&target.to_string_lossy()).map_err(|e| e.to_string())?
        };
        if files.is_empty() {
            return Err(format!(
                "Invalid path '{}' or file not found",
                target.display()
            ));
        }
        Ok(files)
    }

    async fn read(&self, ctx: &StepContext, result: &mut ReadFileResult) -> Result<(), String> {
        for file in self.files(ctx)? {
            let name = relative_name(ctx.workdir(), &file);
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|e| format!("Error while reading file {}: {e}", file.display()))?;
            let metadata = tokio::fs::metadata(&file)
                .await
                .map_err(|e| format!("Error while reading metadata of {}: {e}", file.display()))?;

            result
                .md5sum
                .insert(name.clone(), format!("{:x}", md5::compute(&bytes)));
            result.size.insert(name.clone(), metadata.len());
            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            result.modtime.insert(name.clone(), modified);
            result.mode.insert(name, mode_string(&metadata));
            result.content.push_str(&String::from_utf8_lossy(&bytes));
        }

        result.contentjson = serde_json::from_str::<Value>(&result.content)
            .ok()
            .filter(|v| v.is_object() || v.is_array());
        Ok(())
    }
}

#[async_trait]
impl Executor for ReadFileExecutor {
    async fn run(&self, ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        if self.path.trim().is_empty() {
            return Err(ExecutorError::Invocation("Invalid path".to_string()));
        }

        let start = Instant::now();
        let mut result = ReadFileResult::default();
        if let Err(err) = self.read(ctx, &mut result).await {
            result.err = Some(err);
        }
        let elapsed = start.elapsed();
        result.timeseconds = elapsed.as_secs_f64();
        result.timehuman = format!("{elapsed:?}");

        Ok(ExecutorResult::from_serializable(&result)?)
    }

    fn default_assertions_capability(&self) -> Option<&dyn DefaultAssertions> {
        Some(self)
    }
}

impl DefaultAssertions for ReadFileExecutor {
    fn default_assertions(&self) -> Vec<String> {
        vec!["result.err ShouldNotExist".to_string()]
    }
}

fn relative_name(workdir: &Path, file: &Path) -> String {
    file.strip_prefix(workdir)
        .unwrap_or(file)
        .to_string_lossy()
        .into_owned()
}

#[cfg(unix)]
fn mode_string(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_string(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "r".to_string()
    } else {
        "rw".to_string()
    }
}
