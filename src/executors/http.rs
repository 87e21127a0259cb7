//! `http` executor: one HTTP request per attempt

use async_trait::async_trait;
use reqwest::{multipart, Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::{DefaultAssertions, Executor, ExecutorError, StepContext};
use crate::models::ExecutorResult;

pub const NAME: &str = "http";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpExecutor {
    pub method: String,
    pub url: String,
    pub path: String,
    pub body: String,
    /// Field name → value; values starting with `@` upload that file when it exists
    pub multipart_form: Option<BTreeMap<String, String>>,
    pub headers: BTreeMap<String, String>,
    pub ignore_verify_ssl: bool,
}

#[derive(Debug, Serialize)]
struct HttpResult {
    statuscode: u16,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bodyjson: Option<Value>,
    headers: BTreeMap<String, String>,
    timeseconds: f64,
    timehuman: String,
}

impl HttpExecutor {
    fn method(&self) -> Result<Method, ExecutorError> {
        let method = if self.method.is_empty() {
            "GET"
        } else {
            self.method.as_str()
        };
        Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| ExecutorError::Invocation(format!("Invalid HTTP method: {method}")))
    }

    async fn request(&self, ctx: &StepContext) -> Result<reqwest::RequestBuilder, ExecutorError> {
        if !self.body.is_empty() && self.multipart_form.is_some() {
            return Err(ExecutorError::Invocation(
                "Cannot use both 'body' and 'multipart_form'".to_string(),
            ));
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(self.ignore_verify_ssl)
            .build()?;

        let url = ctx.expand(&format!("{}{}", self.url, self.path));
        let method = self.method()?;
        debug!(suite = ctx.suite(), case = ctx.case(), "{} {}", method, url);

        let mut builder = client.request(method, &url);
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), ctx.expand(value));
        }

        if !self.body.is_empty() {
            builder = builder.body(ctx.expand(&self.body));
        } else if let Some(form) = &self.multipart_form {
            builder = builder.multipart(self.form(ctx, form).await?);
        }

        Ok(builder)
    }

    async fn form(
        &self,
        ctx: &StepContext,
        fields: &BTreeMap<String, String>,
    ) -> Result<multipart::Form, ExecutorError> {
        let mut form = multipart::Form::new();
        for (key, value) in fields {
            let value = ctx.expand(value);
            if let Some(file) = value.strip_prefix('@') {
                let path = ctx.workdir().join(file);
                if path.is_file() {
                    let bytes = tokio::fs::read(&path).await?;
                    let file_name = Path::new(file)
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| file.to_string());
                    form = form.part(key.clone(), multipart::Part::bytes(bytes).file_name(file_name));
                    continue;
                }
            }
            form = form.text(key.clone(), value);
        }
        Ok(form)
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn run(&self, ctx: &StepContext) -> Result<ExecutorResult, ExecutorError> {
        let request = self.request(ctx).await?;

        let start = Instant::now();
        let response = tokio::select! {
            response = request.send() => response?,
            _ = ctx.cancelled() => return Err(ExecutorError::Cancelled),
        };
        let elapsed = start.elapsed();

        let statuscode = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;
        let bodyjson = serde_json::from_str::<Value>(&body)
            .ok()
            .filter(|v| v.is_object() || v.is_array());

        let result = HttpResult {
            statuscode,
            body,
            bodyjson,
            headers,
            timeseconds: elapsed.as_secs_f64(),
            timehuman: format!("{elapsed:?}"),
        };

        Ok(ExecutorResult::from_serializable(&result)?)
    }

    fn default_assertions_capability(&self) -> Option<&dyn DefaultAssertions> {
        Some(self)
    }
}

impl DefaultAssertions for HttpExecutor {
    fn default_assertions(&self) -> Vec<String> {
        vec!["result.statusCode ShouldEqual 200".to_string()]
    }
}
