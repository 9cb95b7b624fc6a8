//! GraphQL client for the upstream todo service
//!
//! Credentials are forwarded as-is in the upstream's token headers; this
//! crate never inspects them.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::paging::{Page, PageFetcher, PageInfo, PageRequest};

pub const TOKEN_ID_HEADER: &str = "x-bloo-token-id";
pub const TOKEN_SECRET_HEADER: &str = "x-bloo-token-secret";
pub const COMPANY_HEADER: &str = "x-bloo-company-id";

/// Longest upstream error body carried into an error message
const MAX_ERROR_BODY: usize = 512;

pub const TODOS_QUERY: &str = r#"
query ListTodos($companyIds: [String!], $skip: Int, $limit: Int) {
  todoQueries {
    todos(filter: { companyIds: $companyIds }, skip: $skip, limit: $limit) {
      items {
        id
        uid
        position
        title
        text
        html
        startedAt
        duedAt
        timezone
        color
        cover
        done
        createdBy {
          fullName
        }
        customFields {
          name
          value
        }
        todoList {
          id
          title
        }
        users {
          id
          firstName
          lastName
          fullName
        }
        tags {
          id
          color
          title
        }
      }
      pageInfo {
        totalPages
        totalItems
        perPage
        page
        hasNextPage
      }
    }
  }
}
"#;

/// Pass-through credentials
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub token_id: Option<String>,
    pub token_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    endpoint: String,
    company: String,
    company_ids: Vec<String>,
    credentials: Credentials,
}

#[derive(Deserialize)]
struct GraphQlEnvelope {
    data: Option<TodoQueriesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoQueriesData {
    todo_queries: Option<TodoQueries>,
}

#[derive(Deserialize)]
struct TodoQueries {
    todos: Option<TodoList>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoList {
    #[serde(default)]
    items: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    page_info: Option<PageInfo>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        if credentials.token_id.is_none() || credentials.token_secret.is_none() {
            tracing::warn!("upstream credentials incomplete; requests will likely be rejected");
        }
        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            company: config.company.clone(),
            company_ids: config.company_ids.clone(),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, request: &PageRequest) -> serde_json::Value {
        json!({
            "query": TODOS_QUERY,
            "variables": {
                "companyIds": self.company_ids,
                "skip": request.skip,
                "limit": request.limit,
            }
        })
    }
}

impl PageFetcher for UpstreamClient {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(COMPANY_HEADER, &self.company)
            .json(&self.request_body(request));
        if let Some(token_id) = self.credentials.token_id.as_deref() {
            req = req.header(TOKEN_ID_HEADER, token_id);
        }
        if let Some(secret) = self.credentials.token_secret.as_deref() {
            req = req.header(TOKEN_SECRET_HEADER, secret);
        }

        tracing::debug!(endpoint = %self.endpoint, skip = request.skip, limit = request.limit, "fetching todos");
        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        parse_page(&body)
    }
}

/// Decode a GraphQL todos response body into a page.
pub fn parse_page(body: &str) -> Result<Page> {
    let envelope: GraphQlEnvelope = serde_json::from_str(body)
        .map_err(|err| Error::UpstreamResponse(format!("invalid JSON envelope: {err}")))?;

    let todos = envelope
        .data
        .and_then(|data| data.todo_queries)
        .and_then(|queries| queries.todos);

    match todos {
        Some(todos) => {
            if !envelope.errors.is_empty() {
                tracing::warn!(
                    errors = envelope.errors.len(),
                    "upstream returned partial data with errors"
                );
            }
            Ok(Page {
                items: todos.items.unwrap_or_default(),
                info: todos.page_info.unwrap_or_default(),
            })
        }
        None if !envelope.errors.is_empty() => {
            let messages: Vec<&str> = envelope
                .errors
                .iter()
                .map(|err| err.message.as_str())
                .collect();
            Err(Error::UpstreamResponse(messages.join("; ")))
        }
        None => Err(Error::UpstreamResponse(
            "response has no todoQueries.todos".to_string(),
        )),
    }
}

fn truncate_body(body: &str) -> String {
    crate::record::trim_description(body.trim(), MAX_ERROR_BODY)
}
