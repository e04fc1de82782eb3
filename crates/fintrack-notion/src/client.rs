//! HTTP reader for Notion databases

use async_trait::async_trait;
use fintrack_config::NotionConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::error::NotionError;
use crate::record::{ApiErrorBody, QueryRequest, QueryResponse, RawRecord};
use crate::RecordSource;

const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Reads every record of a database by following the query cursor
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    api_base: String,
    token: String,
    version: String,
    page_size: u32,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, NotionError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            version: config.version.clone(),
            page_size: config.page_size,
        })
    }

    fn query_url(&self, database_id: &str) -> String {
        format!("{}/databases/{}/query", self.api_base, database_id)
    }

    async fn query_page(
        &self,
        database_id: &str,
        start_cursor: Option<String>,
    ) -> Result<QueryResponse, NotionError> {
        let body = QueryRequest {
            page_size: self.page_size,
            start_cursor,
        };

        let response = self
            .http
            .post(self.query_url(database_id))
            .bearer_auth(&self.token)
            .header(NOTION_VERSION_HEADER, &self.version)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        response
            .json::<QueryResponse>()
            .await
            .map_err(|e| NotionError::Decode {
                source_id: database_id.to_string(),
                message: e.to_string(),
            })
    }
}

fn status_error(status: StatusCode, body: &str) -> NotionError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return NotionError::Unauthorized {
            status: status.as_u16(),
        };
    }

    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{}: {}", code, message),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    };

    NotionError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl RecordSource for NotionClient {
    async fn fetch_all(&self, source_id: &str) -> Result<Vec<RawRecord>, NotionError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.query_page(source_id, cursor.take()).await?;
            pages += 1;
            records.extend(page.results);

            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    return Err(NotionError::MissingCursor {
                        source_id: source_id.to_string(),
                    })
                }
            }
        }

        log::debug!(
            "Fetched {} records from {} in {} page(s)",
            records.len(),
            source_id,
            pages
        );
        Ok(records)
    }
}
