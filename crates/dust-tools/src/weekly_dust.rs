//! Weekly fine-dust forecast lookup tool
//!
//! 날짜를 받아 에어코리아 미세먼지 주간예보 API 를 한 번 호출하고
//! 결과를 사람이 읽을 수 있는 문자열로 돌려줍니다.

use std::time::Duration;

use async_trait::async_trait;
use dust_core::{DustApiConfig, Result, SchemaBuilder, Tool, ToolResult};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::model::ForecastOutcome;

/// Tool name exposed to agent hosts
pub const TOOL_NAME: &str = "getWeeklyDustByDate";

const TOOL_DESCRIPTION: &str =
    "날짜로 대기질 전망과 주간예보 정보를 조회합니다. 날짜 형식: yyyy-MM-dd";

/// Normalize `yyyyMMdd` to `yyyy-MM-dd`; anything else passes through.
pub fn normalize_date(date: &str) -> String {
    if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..])
    } else {
        date.to_string()
    }
}

/// Weekly dust forecast lookup tool
pub struct WeeklyDustTool {
    client: Client,
    config: DustApiConfig,
}

impl WeeklyDustTool {
    /// Create a new WeeklyDustTool instance
    pub fn new(config: DustApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// Create with custom client (for testing)
    pub fn with_client(client: Client, config: DustApiConfig) -> Self {
        Self { client, config }
    }

    /// Full request URL for a date.
    ///
    /// The service key is inserted as issued; data.go.kr hands out keys
    /// that are already URL-encoded.
    pub fn request_url(&self, date: &str) -> String {
        format!(
            "{}?serviceKey={}&returnType=json&numOfRows={}&pageNo={}&searchDate={}",
            self.config.base_url,
            self.config.service_key,
            self.config.num_of_rows,
            self.config.page_no,
            normalize_date(date)
        )
    }

    /// Request URL safe for logs
    fn masked_url(&self, url: &str) -> String {
        if self.config.service_key.is_empty() {
            url.to_string()
        } else {
            url.replace(&self.config.service_key, "***")
        }
    }

    /// Perform the GET and return status and body
    async fn fetch(&self, date: &str) -> Result<(u16, String)> {
        let url = self.request_url(date);
        tracing::info!(url = %self.masked_url(&url), "Requesting weekly dust forecast");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::info!(status = status, bytes = body.len(), "Received forecast response");
        tracing::debug!(body = %body, "Forecast response body");

        Ok((status, body))
    }

    /// Look up the forecast for a date. Never fails; every failure is an outcome.
    pub async fn lookup(&self, date: &str) -> ForecastOutcome {
        match self.fetch(date).await {
            Ok((status, body)) => ForecastOutcome::from_response(status, &body),
            Err(e) => {
                tracing::error!(error = %e, "Weekly dust forecast request failed");
                ForecastOutcome::RequestFailed(e.to_string())
            }
        }
    }
}

/// Input parameters for the forecast tool
#[derive(Debug, Deserialize)]
struct DustInput {
    /// Date as `yyyy-MM-dd` or `yyyyMMdd`
    date: String,
}

#[async_trait]
impl Tool for WeeklyDustTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema_with_descriptions(vec![(
            "date",
            "string",
            "조회할 날짜 (yyyy-MM-dd 또는 yyyyMMdd)",
            true,
        )])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: DustInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return Ok(ToolResult::error(format!("Invalid input parameters: {}", e))),
        };

        let outcome = self.lookup(&input.date).await;
        let output = outcome.to_string();

        if outcome.is_error() {
            Ok(ToolResult::error(output))
        } else {
            Ok(ToolResult::success(output))
        }
    }
}
