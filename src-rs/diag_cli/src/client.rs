use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};

use crate::models::{SubmitRequest, SubmitResponse, TaskView};

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn submit(&self, req: &SubmitRequest) -> Result<SubmitResponse> {
        let url = format!("{}/api/diagnostics", self.base_url);
        let resp = self.client.post(url).json(req).send().context("submitting diagnostic")?;
        decode(resp)
    }

    pub fn status(&self, task_id: &str) -> Result<TaskView> {
        let url = format!("{}/api/diagnostics/{}", self.base_url, task_id);
        let resp = self.client.get(url).send().context("querying task status")?;
        decode(resp)
    }

    pub fn list_tasks(&self, limit: usize) -> Result<Vec<TaskView>> {
        let url = format!("{}/api/tasks?limit={}", self.base_url, limit);
        let resp = self.client.get(url).send().context("listing tasks")?;
        let value: serde_json::Value = decode(resp)?;
        let tasks = value
            .get("tasks")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(vec![]));
        serde_json::from_value(tasks).context("decoding task list")
    }
}

// 202 is a normal answer for in-flight tasks
fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().context("decoding response body");
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    bail!("http {}: {}", status.as_u16(), message)
}
