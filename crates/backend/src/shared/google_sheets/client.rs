use anyhow::{Context, Result};
use async_trait::async_trait;
use contracts::shared::sheet_row::SheetRow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::TokenProvider;
use super::SpreadsheetApi;

/// HTTP-клиент Google Sheets API v4 для одной таблицы
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GoogleSheetsClient {
    pub fn new(
        base_url: &str,
        spreadsheet_id: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .context("Failed to create HTTP client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            tokens,
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/{}", self.base_url, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str, action: &str) -> String {
        format!(
            "{}/values/{}{}",
            self.spreadsheet_url(),
            urlencoding::encode(range),
            action
        )
    }

    /// Отправить запрос с bearer-токеном; не-2xx превращается в ошибку
    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Сетевая ошибка Google Sheets ({}): {}", what, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google Sheets request failed ({}): {} {}", what, status, body);
            anyhow::bail!("Google Sheets {} failed with status {}: {}", what, status, body);
        }

        Ok(response)
    }
}

#[async_trait]
impl SpreadsheetApi for GoogleSheetsClient {
    async fn read_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "");
        let response = self
            .send(self.client.get(&url), &format!("values.get {}", range))
            .await?;
        let body: ValueRange = response
            .json()
            .await
            .with_context(|| format!("Ошибка парсинга values.get {}", range))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn sheet_titles(&self) -> Result<Vec<String>> {
        let url = self.spreadsheet_url();
        let response = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("fields", "sheets.properties.title")]),
                "spreadsheets.get",
            )
            .await?;
        let meta: SpreadsheetMeta = response
            .json()
            .await
            .context("Ошибка парсинга spreadsheets.get")?;

        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<()> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        self.send(self.client.post(&url).json(&body), &format!("addSheet {}", title))
            .await?;
        Ok(())
    }

    async fn clear_values(&self, range: &str) -> Result<()> {
        let url = self.values_url(range, ":clear");
        self.send(
            self.client.post(&url).json(&serde_json::json!({})),
            &format!("values.clear {}", range),
        )
        .await?;
        Ok(())
    }

    async fn update_values(&self, range: &str, rows: &[SheetRow]) -> Result<()> {
        let url = self.values_url(range, "");
        self.send(
            self.client
                .put(&url)
                .query(&[("valueInputOption", "RAW")])
                .json(&ValuesBody::rows(rows)),
            &format!("values.update {}", range),
        )
        .await?;
        Ok(())
    }

    async fn append_values(&self, range: &str, rows: &[SheetRow]) -> Result<()> {
        let url = self.values_url(range, ":append");
        self.send(
            self.client
                .post(&url)
                .query(&[("valueInputOption", "RAW")])
                .json(&ValuesBody::rows(rows)),
            &format!("values.append {}", range),
        )
        .await?;
        Ok(())
    }
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Request/Response structures для Google Sheets API
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValuesBody<'a> {
    major_dimension: &'static str,
    values: &'a [SheetRow],
}

impl<'a> ValuesBody<'a> {
    fn rows(values: &'a [SheetRow]) -> Self {
        Self {
            major_dimension: "ROWS",
            values,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}
