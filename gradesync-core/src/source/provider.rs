//! Grade source subprocess protocol.
//!
//! This module handles communication with external source binaries
//! (e.g., `gradesync-source-gradescope`) using JSON over stdin/stdout.
//!
//! Sources own their credentials and sessions with the assessment
//! platform. gradesync only passes the course and assignment ids.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::assignment::AssignmentRecord;
use crate::error::{GradeSyncError, GradeSyncResult};
use crate::source::GradeSource;
use crate::source::protocol::{
    Command, FetchGrades, ListAssignments, Request, Response, SourceCommand,
};

/// Grade exports for large courses can take a while to render.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceProvider(String);

impl SourceProvider {
    pub fn from_name(name: &str) -> Self {
        SourceProvider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("gradesync-source-{}", self.0)
    }

    fn binary_path(&self) -> GradeSyncResult<std::path::PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| GradeSyncError::SourceNotInstalled(binary_name))
    }

    /// Call a typed source command and return the result.
    pub async fn call<C: SourceCommand>(&self, cmd: C) -> GradeSyncResult<C::Response> {
        timeout(SOURCE_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| GradeSyncError::SourceTimeout(SOURCE_TIMEOUT.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> GradeSyncResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| GradeSyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| GradeSyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                GradeSyncError::Source(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| GradeSyncError::Source("Source stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(GradeSyncError::Source(format!(
                "Source exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Decode the first non-empty line a source wrote to stdout.
fn parse_response<R: serde::de::DeserializeOwned>(stdout: &str) -> GradeSyncResult<R> {
    let line = stdout
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| GradeSyncError::Source("Source returned no response".into()))?;

    let response: Response<R> = serde_json::from_str(line)
        .map_err(|e| GradeSyncError::Source(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(GradeSyncError::Source(error)),
    }
}

impl GradeSource for SourceProvider {
    async fn list_assignments(&self, course_id: &str) -> GradeSyncResult<Vec<AssignmentRecord>> {
        self.call(ListAssignments {
            course_id: course_id.to_string(),
        })
        .await
    }

    async fn fetch_grades(&self, course_id: &str, assignment_id: &str) -> GradeSyncResult<String> {
        self.call(FetchGrades {
            course_id: course_id.to_string(),
            assignment_id: assignment_id.to_string(),
        })
        .await
    }
}
