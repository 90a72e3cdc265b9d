//! Integration tests for the OpenSearch client over an in-memory transport.

use async_trait::async_trait;
use quarry_opensearch::aggregations::BucketKey;
use quarry_opensearch::{
    Document, Method, OpenSearchClient, OpenSearchConfig, OpenSearchError, Result, SearchRequest,
    Transport, TransportRequest, TransportResponse, bucket_key_enum,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    fn replying(status: u16, body: Value) -> Arc<Self> {
        let transport = Self::default();
        transport.push(status, body);
        Arc::new(transport)
    }

    fn push(&self, status: u16, body: Value) {
        self.responses.lock().unwrap().push_back(TransportResponse {
            status,
            body: body.to_string(),
        });
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OpenSearchError::Transport("no response queued".to_string()))
    }
}

fn client(transport: Arc<MockTransport>) -> OpenSearchClient {
    OpenSearchClient::with_transport(transport, OpenSearchConfig::default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    status: String,
    total: f64,
}

impl Document for Order {
    fn index_name() -> &'static str {
        "orders"
    }
}

#[derive(Debug, PartialEq)]
enum Status {
    Paid,
    Refunded,
}

bucket_key_enum!(Status { Paid, Refunded });

fn orders_response() -> Value {
    json!({
        "took": 3,
        "timed_out": false,
        "_shards": {"total": 2, "successful": 2, "skipped": 0, "failed": 0},
        "hits": {
            "total": {"value": 2, "relation": "eq"},
            "max_score": null,
            "hits": [
                {"_index": "orders", "_id": "1", "_score": null, "_source": {"id": 1, "status": "paid", "total": 10.0}, "sort": [1]},
                {"_index": "orders", "_id": "2", "_score": null, "_source": {"id": 2, "status": "refunded", "total": 4.5}, "sort": [2]}
            ]
        },
        "aggregations": {
            "sum#revenue": {"value": 14.5},
            "sterms#by_status": {
                "doc_count_error_upper_bound": 0,
                "sum_other_doc_count": 0,
                "buckets": [
                    {"key": "paid", "doc_count": 1, "avg#avg_total": {"value": 10.0}},
                    {"key": "refunded", "doc_count": 1, "avg#avg_total": {"value": 4.5}}
                ]
            },
            "date_histogram#per_day": {"buckets": [
                {"key_as_string": "2024-03-01T00:00:00.000Z", "key": 1_709_251_200_000_i64, "doc_count": 2}
            ]},
            "percentiles#latency": {"values": {"50.0": 12.0, "99.0": 80.0}},
            "top_hits#latest": {"hits": {
                "total": {"value": 2, "relation": "eq"},
                "max_score": null,
                "hits": [{"_index": "orders", "_id": "2", "_score": null, "_source": {"id": 2, "status": "refunded", "total": 4.5}}]
            }}
        }
    })
}

#[tokio::test]
async fn test_search_sends_typed_keys_and_decodes_response() {
    let transport = MockTransport::replying(200, orders_response());
    let client = client(transport.clone());

    let response = client
        .search_documents::<Order>(json!({"size": 2, "aggs": {}}))
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path, "/orders/_search");
    assert!(requests[0].params.contains(&("typed_keys".to_string(), "true".to_string())));
    assert_eq!(requests[0].body, Some(json!({"size": 2, "aggs": {}})));

    assert_eq!(response.took, 3);
    assert_eq!(response.shards.successful, 2);
    assert_eq!(response.total(), Some(2));
    let ids: Vec<u32> = response.documents().map(|order| order.id).collect();
    assert_eq!(ids, [1, 2]);
    assert_eq!(response.hits.hits[0].sort, Some(vec![json!(1)]));
}

#[tokio::test]
async fn test_search_aggregations_end_to_end() {
    let client = client(MockTransport::replying(200, orders_response()));
    let response = client
        .search::<Order>(SearchRequest::for_document::<Order>())
        .await
        .unwrap();
    let aggs = &response.aggregations;

    assert_eq!(aggs.sum("revenue").unwrap().value, Some(14.5));

    let by_status = aggs.terms::<Status>("by_status").unwrap().unwrap();
    assert_eq!(by_status.buckets[0].key, Status::Paid);
    assert_eq!(by_status.buckets[1].key, Status::Refunded);
    assert_eq!(by_status.sum_other_doc_count, Some(0));
    assert_eq!(
        by_status.buckets[1].aggregations.average("avg_total").unwrap().value,
        Some(4.5)
    );

    let per_day = aggs.date_histogram("per_day").unwrap().unwrap();
    assert_eq!(
        per_day.buckets[0].date().unwrap().to_rfc3339(),
        "2024-03-01T00:00:00+00:00"
    );

    assert_eq!(aggs.percentiles("latency").unwrap().percentile(99.0), Some(80.0));

    let latest = aggs.top_hits("latest").unwrap();
    assert_eq!(latest.documents::<Order>().unwrap()[0].status, "refunded");
}

#[tokio::test]
async fn test_typed_keys_can_be_disabled() {
    let transport = MockTransport::replying(200, json!({"hits": {"hits": []}}));
    let client = OpenSearchClient::with_transport(
        transport.clone(),
        OpenSearchConfig::default().with_typed_keys(false),
    );

    let response = client.search::<Value>(SearchRequest::default()).await.unwrap();

    assert!(response.aggregations.is_empty());
    let request = &transport.requests()[0];
    assert_eq!(request.path, "/_search");
    assert!(request.params.is_empty());
}

#[tokio::test]
async fn test_caller_params_are_forwarded() {
    let transport = MockTransport::replying(200, json!({"hits": {"hits": []}, "_scroll_id": "abc"}));
    let client = client(transport.clone());

    let response = client
        .search::<Value>(SearchRequest::new("logs").scroll("1m").param("typed_keys", "false"))
        .await
        .unwrap();

    assert_eq!(response.scroll_id.as_deref(), Some("abc"));
    let params = &transport.requests()[0].params;
    assert_eq!(
        params,
        &vec![
            ("scroll".to_string(), "1m".to_string()),
            ("typed_keys".to_string(), "false".to_string())
        ]
    );
}

#[tokio::test]
async fn test_server_error_maps_to_query_error() {
    let client = client(MockTransport::replying(
        404,
        json!({
            "error": {"type": "index_not_found_exception", "reason": "no such index [missing]"},
            "status": 404
        }),
    ));

    let err = client
        .search::<Value>(SearchRequest::new("missing"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert!(err.to_string().contains("no such index [missing]"));
}

#[tokio::test]
async fn test_invalid_json_body_is_a_serialization_error() {
    let transport = Arc::new(MockTransport::default());
    transport.responses.lock().unwrap().push_back(TransportResponse {
        status: 200,
        body: r#"{"hits": {"hits": []}, "aggregations": {"a": {"value": 1.0}"#.to_string(),
    });
    let client = client(transport);

    let err = client.search::<Value>(SearchRequest::default()).await.unwrap_err();
    assert!(matches!(err, OpenSearchError::Serialization(_)));
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let client = client(Arc::new(MockTransport::default()));
    let err = client.search::<Value>(SearchRequest::default()).await.unwrap_err();
    assert!(matches!(err, OpenSearchError::Transport(_)));
}

#[tokio::test]
async fn test_scroll_and_clear_scroll() {
    let transport = Arc::new(MockTransport::default());
    transport.push(200, json!({
        "_scroll_id": "next",
        "hits": {"hits": [{"_index": "logs", "_id": "9", "_source": {"n": 9}}]}
    }));
    transport.push(200, json!({"succeeded": true, "num_freed": 1}));
    let client = client(transport.clone());

    let page = client.scroll::<Value>("first", "1m").await.unwrap();
    assert_eq!(page.scroll_id.as_deref(), Some("next"));
    assert_eq!(page.hits.hits[0].id, "9");

    client.clear_scroll("next").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].path, "/_search/scroll");
    assert_eq!(requests[0].body, Some(json!({"scroll": "1m", "scroll_id": "first"})));
    assert_eq!(requests[1].method, Method::Delete);
}

#[tokio::test]
async fn test_ping() {
    let transport = MockTransport::replying(200, json!({}));
    assert!(client(transport.clone()).ping().await.unwrap());
    assert_eq!(transport.requests()[0].method, Method::Head);

    assert!(!client(Arc::new(MockTransport::default())).ping().await.unwrap());
}

#[tokio::test]
async fn test_multi_terms_through_client() {
    let client = client(MockTransport::replying(200, json!({
        "hits": {"hits": []},
        "aggregations": {"multi_terms#pairs": {"buckets": [
            {"key": ["paid", 2024], "key_as_string": "paid|2024", "doc_count": 7}
        ]}}
    })));

    let response = client.search::<Value>(SearchRequest::new("orders")).await.unwrap();
    let pairs = response.aggregations.multi_terms::<BucketKey>("pairs").unwrap().unwrap();
    assert_eq!(
        pairs.buckets[0].key,
        vec![BucketKey::String("paid".into()), BucketKey::Long(2024)]
    );
}
