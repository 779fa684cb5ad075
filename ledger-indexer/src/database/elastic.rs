//! Document index adapter over the Elasticsearch HTTP API

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ElasticConfig;
use crate::core::error::{IndexError, IndexerError, IndexerResult};
use crate::core::traits::{BulkOutcome, DocumentIndex, RangeCount};
use crate::core::types::IndexName;

#[derive(Clone)]
pub struct ElasticIndex {
    client: Client,
    base_url: String,
    prefix: String,
    auth: Option<(String, String)>,
}

impl ElasticIndex {
    pub fn new(config: &ElasticConfig) -> IndexerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let auth = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            prefix: config.index_prefix.clone(),
            auth,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}/{}", self.base_url, path));
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    fn index_path(&self, index: IndexName, endpoint: &str) -> String {
        format!("{}/{}", index.qualified(&self.prefix), endpoint)
    }

    /// Search the ledger index; a missing index reads as `None`
    async fn search_ledgers(&self, body: Value) -> IndexerResult<Option<Value>> {
        let response = self
            .request(Method::POST, &self.index_path(IndexName::Ledger, "_search"))
            .json(&body)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(json_body(response).await?))
    }
}

async fn json_body(response: Response) -> IndexerResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IndexError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(response.json().await?)
}

fn response_error(what: &str, body: &Value) -> IndexError {
    IndexError::Response(format!("{}: {}", what, body))
}

/// Item level outcome of a `_bulk` response
pub fn parse_bulk_response(body: &Value) -> IndexerResult<BulkOutcome> {
    let errors = body
        .get("errors")
        .and_then(Value::as_bool)
        .ok_or_else(|| response_error("bulk response without errors flag", body))?;
    let items = body.get("items").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

    let mut outcome = BulkOutcome {
        errors,
        items: items.len(),
        ..BulkOutcome::default()
    };
    for item in items {
        // each item is keyed by its action name
        let Some(result) = item.as_object().and_then(|obj| obj.values().next()) else {
            continue;
        };
        let status = result.get("status").and_then(Value::as_u64).unwrap_or(0);
        if !(200..300).contains(&status) {
            outcome.failed_items += 1;
            if outcome.first_error.is_none() {
                let reason = result
                    .pointer("/error/reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| result.get("error").map(Value::to_string).unwrap_or_default());
                outcome.first_error = Some(format!("status {}: {}", status, reason));
            }
        }
    }
    Ok(outcome)
}

fn agg_value(body: &Value, name: &str) -> Option<u32> {
    body.pointer(&format!("/aggregations/{}/value", name))
        .and_then(Value::as_f64)
        .map(|v| v as u32)
}

/// Min and max `seq` aggregations; `None` when the index is empty
pub fn parse_bounds(body: &Value) -> Option<(u32, u32)> {
    Some((agg_value(body, "min_seq")?, agg_value(body, "max_seq")?))
}

/// `seq` of every hit, in response order
pub fn parse_seqs(body: &Value) -> IndexerResult<Vec<u32>> {
    let hits = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| response_error("search response without hits", body))?;
    hits.iter()
        .map(|hit| {
            hit.pointer("/_source/seq")
                .and_then(Value::as_u64)
                .map(|seq| seq as u32)
                .ok_or_else(|| IndexerError::from(response_error("hit without seq", hit)))
        })
        .collect()
}

pub fn parse_range_counts(body: &Value) -> IndexerResult<Vec<RangeCount>> {
    let buckets = body
        .pointer("/aggregations/ranges/buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| response_error("range aggregation missing", body))?;
    buckets
        .iter()
        .map(|bucket| {
            let field = |name: &str| bucket.get(name).and_then(Value::as_f64);
            match (field("from"), field("to"), bucket.get("doc_count").and_then(Value::as_u64)) {
                (Some(from), Some(to), Some(count)) => Ok(RangeCount {
                    start: from as u32,
                    end: to as u32,
                    count,
                }),
                _ => Err(IndexerError::from(response_error("malformed range bucket", bucket))),
            }
        })
        .collect()
}

/// `[start, end)` cut into `interval` sized ranges
fn ranges(start: u32, end: u32, interval: u32) -> Vec<Value> {
    let interval = interval.max(1);
    let mut out = Vec::new();
    let mut from = start;
    while from < end {
        let to = from.saturating_add(interval).min(end);
        out.push(json!({ "from": from, "to": to }));
        from = to;
    }
    out
}

#[async_trait]
impl DocumentIndex for ElasticIndex {
    async fn bulk(&self, body: Bytes) -> IndexerResult<BulkOutcome> {
        let size = body.len();
        let response = self
            .request(Method::POST, "_bulk")
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let outcome = parse_bulk_response(&json_body(response).await?)?;
        debug!("Bulk request of {} bytes: {} items, {} failed", size, outcome.items, outcome.failed_items);
        Ok(outcome)
    }

    async fn ledger_seq_bounds(&self) -> IndexerResult<Option<(u32, u32)>> {
        let body = json!({
            "size": 0,
            "aggs": {
                "min_seq": { "min": { "field": "seq" } },
                "max_seq": { "max": { "field": "seq" } },
            }
        });
        Ok(self.search_ledgers(body).await?.as_ref().and_then(parse_bounds))
    }

    async fn ledger_seqs_in(&self, lo: u32, hi: u32) -> IndexerResult<Vec<u32>> {
        if hi <= lo {
            return Ok(Vec::new());
        }
        let body = json!({
            "size": hi - lo,
            "_source": ["seq"],
            "sort": [{ "seq": "asc" }],
            "query": { "range": { "seq": { "gte": lo, "lt": hi } } },
        });
        match self.search_ledgers(body).await? {
            Some(response) => parse_seqs(&response),
            None => Ok(Vec::new()),
        }
    }

    async fn count(&self, index: IndexName) -> IndexerResult<u64> {
        let response = self.request(Method::GET, &self.index_path(index, "_count")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        let body = json_body(response).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| response_error("count response without count", &body).into())
    }

    async fn ledger_counts_by_range(&self, start: u32, end: u32, interval: u32) -> IndexerResult<Vec<RangeCount>> {
        let body = json!({
            "size": 0,
            "aggs": { "ranges": { "range": { "field": "seq", "ranges": ranges(start, end, interval) } } },
        });
        match self.search_ledgers(body).await? {
            Some(response) => parse_range_counts(&response),
            None => Ok(Vec::new()),
        }
    }

    async fn create_index(&self, index: IndexName, body: &Value) -> IndexerResult<()> {
        let name = index.qualified(&self.prefix);
        let response = self.request(Method::PUT, &name).json(body).send().await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            if text.contains("resource_already_exists_exception") {
                warn!("Index {} already exists", name);
                return Ok(());
            }
            return Err(IndexError::Status { status: 400, body: text }.into());
        }
        json_body(response).await?;
        info!("Created index {}", name);
        Ok(())
    }

    async fn delete_index(&self, index: IndexName) -> IndexerResult<()> {
        let name = index.qualified(&self.prefix);
        let response = self.request(Method::DELETE, &name).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!("Index {} does not exist", name);
            return Ok(());
        }
        json_body(response).await?;
        info!("Deleted index {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_response_with_rejected_item() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_index": "ledger", "_id": "1", "status": 201 } },
                { "index": { "_index": "ledger", "_id": "2", "status": 429,
                    "error": { "type": "es_rejected_execution_exception", "reason": "queue full" } } },
            ]
        });
        let outcome = parse_bulk_response(&body).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.items, 2);
        assert_eq!(outcome.failed_items, 1);
        assert_eq!(outcome.first_error.as_deref(), Some("status 429: queue full"));

        let ok = parse_bulk_response(&json!({ "errors": false, "items": [{ "index": { "status": 200 } }] })).unwrap();
        assert!(ok.is_success());
        assert!(parse_bulk_response(&json!({ "items": [] })).is_err());
    }

    #[test]
    fn test_bounds_of_empty_index() {
        let empty = json!({ "aggregations": { "min_seq": { "value": null }, "max_seq": { "value": null } } });
        assert_eq!(parse_bounds(&empty), None);
        let full = json!({ "aggregations": { "min_seq": { "value": 386.0 }, "max_seq": { "value": 400.0 } } });
        assert_eq!(parse_bounds(&full), Some((386, 400)));
    }

    #[test]
    fn test_parse_seqs() {
        let body = json!({ "hits": { "hits": [ { "_source": { "seq": 5 } }, { "_source": { "seq": 7 } } ] } });
        assert_eq!(parse_seqs(&body).unwrap(), vec![5, 7]);
        assert!(parse_seqs(&json!({ "hits": { "hits": [ { "_source": {} } ] } })).is_err());
    }

    #[test]
    fn test_ranges_and_counts() {
        assert_eq!(
            ranges(10, 35, 10),
            vec![
                json!({ "from": 10, "to": 20 }),
                json!({ "from": 20, "to": 30 }),
                json!({ "from": 30, "to": 35 }),
            ]
        );
        assert!(ranges(5, 5, 10).is_empty());

        let body = json!({ "aggregations": { "ranges": { "buckets": [
            { "key": "10.0-20.0", "from": 10.0, "to": 20.0, "doc_count": 10 },
            { "key": "20.0-25.0", "from": 20.0, "to": 25.0, "doc_count": 3 },
        ] } } });
        let counts = parse_range_counts(&body).unwrap();
        assert_eq!(counts[1], RangeCount { start: 20, end: 25, count: 3 });
    }
}
