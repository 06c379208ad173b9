//! PostgREST adapter for the hosted database.
//!
//! Each store handle carries the caller's bearer token so row-level security
//! applies to every statement. Reads, updates and deletes are retried on
//! transient failures; inserts are not (a retried insert can duplicate a row).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde_json::Value;

use super::{DataStore, Filter, Query, Row, StoreError, StoreProvider, Table};

// ─── Constants ──────────────────────────────────────────────────────────────

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum retry attempts for idempotent requests.
const MAX_RETRIES: u32 = 2;

/// Base delay between retries (doubles each attempt).
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

// ─── Provider ───────────────────────────────────────────────────────────────

/// Builds per-caller [`PostgrestStore`] handles sharing one HTTP client.
pub struct PostgrestProvider {
    http: HttpClient,
    endpoint: String,
    api_key: String,
}

impl PostgrestProvider {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport {
                url: endpoint.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl StoreProvider for PostgrestProvider {
    fn for_user_token(&self, token: &str) -> Arc<dyn DataStore> {
        Arc::new(PostgrestStore {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            bearer: token.to_string(),
        })
    }
}

// ─── Store ──────────────────────────────────────────────────────────────────

pub struct PostgrestStore {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    bearer: String,
}

impl PostgrestStore {
    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.endpoint, table)
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn send_rows(&self, url: String, req: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = req.send().await.map_err(|e| StoreError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| StoreError::Transport {
            url,
            reason: format!("failed to read response body: {e}"),
        })?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn with_retry<T, F, Fut>(&self, op: &str, table: Table, mut f: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    tracing::warn!(op, table = %table, attempt, error = %e, "retrying store request");
                    tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl DataStore for PostgrestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let params = query_params(query, true);
        self.with_retry("select", query.table, || {
            let req = self.request(Method::GET, query.table).query(&params);
            self.send_rows(self.table_url(query.table), req)
        })
        .await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let req = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&row);
        self.send_rows(self.table_url(table), req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Serialization {
                reason: format!("insert into {table} returned no representation"),
            })
    }

    async fn update(&self, query: &Query, patch: &Row) -> Result<Vec<Row>, StoreError> {
        let params = query_params(query, false);
        self.with_retry("update", query.table, || {
            let req = self
                .request(Method::PATCH, query.table)
                .header("Prefer", "return=representation")
                .query(&params)
                .json(patch);
            self.send_rows(self.table_url(query.table), req)
        })
        .await
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let params = query_params(query, false);
        self.with_retry("delete", query.table, || {
            let req = self
                .request(Method::DELETE, query.table)
                .header("Prefer", "return=representation")
                .query(&params);
            self.send_rows(self.table_url(query.table), req)
        })
        .await
    }
}

// ─── Query encoding ─────────────────────────────────────────────────────────

/// Encode filters as PostgREST query parameters (`col=op.value`).
fn query_params(query: &Query, with_paging: bool) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|f| {
            let value = match f {
                Filter::Eq(_, Value::Null) | Filter::IsNull(_) => "is.null".to_string(),
                Filter::NotNull(_) => "not.is.null".to_string(),
                Filter::Eq(_, v) => format!("eq.{}", scalar(v)),
                Filter::Gte(_, v) => format!("gte.{}", scalar(v)),
                Filter::Lte(_, v) => format!("lte.{}", scalar(v)),
                Filter::ILike(_, needle) => format!("ilike.*{needle}*"),
                Filter::In(_, values) => format!(
                    "in.({})",
                    values.iter().map(quoted).collect::<Vec<_>>().join(",")
                ),
            };
            (f.column().to_string(), value)
        })
        .collect();

    if with_paging {
        if !query.order.is_empty() {
            let order = query
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".into(), order));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".into(), limit.to_string()));
        }
    }

    params
}

fn scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_encoding() {
        let q = Query::table(Table::Shifts)
            .eq("user_id", "u1")
            .gte("date", "2026-01-01")
            .lte("cash_tips", 50)
            .ilike("event_name", "wedding")
            .not_null("notes")
            .is_in("id", vec![json!("a"), json!("b")])
            .order_by("date", false)
            .limit(5);

        let params = query_params(&q, true);
        assert_eq!(params[0], ("user_id".into(), "eq.u1".into()));
        assert_eq!(params[1], ("date".into(), "gte.2026-01-01".into()));
        assert_eq!(params[2], ("cash_tips".into(), "lte.50".into()));
        assert_eq!(params[3], ("event_name".into(), "ilike.*wedding*".into()));
        assert_eq!(params[4], ("notes".into(), "not.is.null".into()));
        assert_eq!(params[5], ("id".into(), "in.(\"a\",\"b\")".into()));
        assert_eq!(params[6], ("order".into(), "date.desc".into()));
        assert_eq!(params[7], ("limit".into(), "5".into()));
    }

    #[test]
    fn test_paging_omitted_for_writes() {
        let q = Query::table(Table::Jobs)
            .eq("id", "j1")
            .order_by("name", true)
            .limit(1);
        let params = query_params(&q, false);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_eq_null_becomes_is_null() {
        let q = Query::table(Table::Jobs).eq("deleted_at", Value::Null);
        let params = query_params(&q, true);
        assert_eq!(params[0].1, "is.null");
    }

    #[test]
    fn test_provider_binds_token() {
        let provider =
            PostgrestProvider::new("https://db.example.com/", "anon", Duration::from_secs(10))
                .unwrap();
        // Handle construction never touches the network.
        let _store = provider.for_user_token("token-abc");
        assert_eq!(provider.endpoint, "https://db.example.com");
    }
}
