//! Runware REST request/response payloads.

use serde::{Deserialize, Serialize};

/// One `imageInference` task. Runware accepts a JSON array of tasks per request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInferenceTask {
    pub task_type: &'static str,
    #[serde(rename = "taskUUID")]
    pub task_uuid: String,
    pub positive_prompt: String,
    pub model: String,
    pub number_results: u32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    #[serde(rename = "CFGScale")]
    pub cfg_scale: f32,
    pub use_cache: bool,
    pub include_cost: bool,
    pub output_type: &'static str,
}

/// Top-level response envelope. A body may carry `data`, `errors`, or both.
#[derive(Debug, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub data: Vec<ImageInferenceData>,
    #[serde(default)]
    pub errors: Vec<TaskError>,
}

/// One generated image entry.
#[derive(Debug, Deserialize)]
pub struct ImageInferenceData {
    #[serde(rename = "taskType")]
    pub task_type: Option<String>,
    #[serde(rename = "taskUUID")]
    pub task_uuid: Option<String>,
    #[serde(rename = "imageUUID")]
    pub image_uuid: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub cost: Option<f64>,
}

/// Error entry reported by Runware for a failed task.
#[derive(Debug, Deserialize)]
pub struct TaskError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub parameter: Option<String>,
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("unknownError"),
            self.message.as_deref().unwrap_or("no message")
        )?;
        if let Some(parameter) = &self.parameter {
            write!(f, " (parameter: {})", parameter)?;
        }
        Ok(())
    }
}
