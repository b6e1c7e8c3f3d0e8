//! Integration tests for ApiClient against an in-process HTTP server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use constellation_client::{ApiClient, ClientConfig, ClientError, CmdbApi};
use constellation_models::{
    Criticality, DirectionFilter, Endpoints, ItemDraft, ItemId, ItemQuery,
    ItemWithRelationshipsDraft, NewRelationship, RelationshipId, RelationshipSpec,
    RelationshipType,
};

/// A request as seen by the fake server.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: Option<String>,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct FakeState {
    routes: Arc<Mutex<HashMap<String, Canned>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

struct FakeServer {
    base_url: String,
    state: FakeState,
}

impl FakeServer {
    async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    fn respond(&self, method: &str, path: &str, status: StatusCode, body: Value) {
        self.insert(method, path, status, Some(body.to_string()), None);
    }

    fn respond_raw(&self, method: &str, path: &str, status: StatusCode, body: &str) {
        self.insert(method, path, status, Some(body.to_string()), None);
    }

    fn respond_empty(&self, method: &str, path: &str, status: StatusCode) {
        self.insert(method, path, status, None, None);
    }

    fn respond_slowly(&self, method: &str, path: &str, delay: Duration, body: Value) {
        self.insert(method, path, StatusCode::OK, Some(body.to_string()), Some(delay));
    }

    fn insert(
        &self,
        method: &str,
        path: &str,
        status: StatusCode,
        body: Option<String>,
        delay: Option<Duration>,
    ) {
        self.state.routes.lock().unwrap().insert(
            format!("{} {}", method, path),
            Canned {
                status,
                body,
                delay,
            },
        );
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(ClientConfig::new(&self.base_url)).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    fn last_request(&self) -> Recorded {
        self.requests().last().cloned().expect("no request recorded")
    }
}

async fn handle(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = state
        .routes
        .lock()
        .unwrap()
        .get(&format!("{} {}", method, path))
        .cloned();
    let Some(canned) = canned else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response();
    };
    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }
    match canned.body {
        Some(body) => (
            canned.status,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        None => canned.status.into_response(),
    }
}

fn item_json(id: &str, name: &str, criticality: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "ci_type": "SERVER",
        "environment": "PROD",
        "criticality": criticality,
        "created_at": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_list_items_sends_query_and_parses_page() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/cis/",
        StatusCode::OK,
        json!({
            "cis": [item_json("ci-1", "web-01", "HIGH"), item_json("ci-2", "db-01", "CRITICAL")],
            "total_count": 2,
            "limit": 5,
            "offset": 0
        }),
    );

    let page = server
        .client()
        .list_items(&ItemQuery::new().search("web").limit(5))
        .await
        .unwrap();

    assert_eq!(page.total_count, 2);
    assert_eq!(page.cis.len(), 2);
    assert_eq!(page.cis[1].criticality, Criticality::Critical);

    let request = server.last_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/api/v1/cis/");
    assert_eq!(request.query.as_deref(), Some("search=web&limit=5"));
}

#[tokio::test]
async fn test_list_items_without_filters_sends_no_query() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/cis/",
        StatusCode::OK,
        json!({"cis": [], "total_count": 0}),
    );

    let page = server.client().list_items(&ItemQuery::new()).await.unwrap();
    assert!(page.cis.is_empty());
    let query = server.last_request().query;
    assert!(query.map_or(true, |q| q.is_empty()));
}

#[tokio::test]
async fn test_get_item() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/cis/ci-7",
        StatusCode::OK,
        item_json("ci-7", "cache-01", "LOW"),
    );

    let item = server.client().get_item(&ItemId::from("ci-7")).await.unwrap();
    assert_eq!(item.id, "ci-7");
    assert_eq!(item.name, "cache-01");
}

#[tokio::test]
async fn test_ids_are_encoded_within_their_path_segment() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/cis/rack%201%2Fslot%3Fx=1",
        StatusCode::OK,
        item_json("rack 1/slot?x=1", "slot", "LOW"),
    );
    let client = server.client();

    let item = client.get_item(&ItemId::from("rack 1/slot?x=1")).await.unwrap();
    assert_eq!(item.name, "slot");
    let request = server.last_request();
    assert_eq!(request.path, "/api/v1/cis/rack%201%2Fslot%3Fx=1");
    assert_eq!(request.query, None);

    let _ = client
        .list_relationships(&ItemId::from("a#b"), DirectionFilter::Both)
        .await;
    let request = server.last_request();
    assert_eq!(request.path, "/api/v1/cis/a%23b/relationships");
    assert_eq!(request.query.as_deref(), Some("direction=both"));

    let _ = client.delete_relationship(&RelationshipId::from("r/1")).await;
    assert_eq!(server.last_request().path, "/api/v1/relationships/r%2F1");
}

#[tokio::test]
async fn test_create_item_posts_draft() {
    let server = FakeServer::start().await;
    server.respond(
        "POST",
        "/api/v1/cis/",
        StatusCode::CREATED,
        item_json("ci-new", "api-gateway", "HIGH"),
    );

    let draft = ItemDraft::named("api-gateway")
        .ci_type("SERVER")
        .criticality(Criticality::High);
    let item = server.client().create_item(&draft).await.unwrap();
    assert_eq!(item.id, "ci-new");

    let request = server.last_request();
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.body,
        Some(json!({"name": "api-gateway", "ci_type": "SERVER", "criticality": "HIGH"}))
    );
}

#[tokio::test]
async fn test_create_item_with_relationships_reports_partial_failure() {
    let server = FakeServer::start().await;
    server.respond(
        "POST",
        "/api/v1/cis/with-relationships",
        StatusCode::OK,
        json!({
            "ci": item_json("ci-9", "orders-svc", "MEDIUM"),
            "created_relationships": [
                {"target_ci_id": "ci-1", "relationship_type": "DEPENDS_ON", "description": null}
            ],
            "failed_relationships": [
                {"target_ci_id": "ci-missing", "relationship_type": "USES", "error": "Target CI not found"}
            ],
            "success": true
        }),
    );

    let draft = ItemWithRelationshipsDraft::new(ItemDraft::named("orders-svc"))
        .relate(RelationshipSpec::new("ci-1", RelationshipType::DependsOn))
        .relate(RelationshipSpec::new("ci-missing", RelationshipType::Uses));
    let result = server
        .client()
        .create_item_with_relationships(&draft)
        .await
        .unwrap();

    assert_eq!(result.ci.id, "ci-9");
    assert_eq!(result.created_relationships.len(), 1);
    assert_eq!(result.failed_relationships[0].error, "Target CI not found");
    assert!(!result.is_complete());

    let body = server.last_request().body.unwrap();
    assert_eq!(body["name"], "orders-svc");
    assert_eq!(body["relationships"][0]["target_ci_id"], "ci-1");
    assert_eq!(body["relationships"][1]["relationship_type"], "USES");
}

#[tokio::test]
async fn test_update_item_puts_changes() {
    let server = FakeServer::start().await;
    server.respond(
        "PUT",
        "/api/v1/cis/ci-3",
        StatusCode::OK,
        item_json("ci-3", "web-03", "CRITICAL"),
    );

    let draft = ItemDraft::default().criticality(Criticality::Critical);
    let item = server
        .client()
        .update_item(&ItemId::from("ci-3"), &draft)
        .await
        .unwrap();
    assert_eq!(item.criticality, Criticality::Critical);

    let request = server.last_request();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.body, Some(json!({"criticality": "CRITICAL"})));
}

#[tokio::test]
async fn test_delete_item_accepts_empty_body() {
    let server = FakeServer::start().await;
    server.respond_empty("DELETE", "/api/v1/cis/ci-3", StatusCode::NO_CONTENT);

    server
        .client()
        .delete_item(&ItemId::from("ci-3"))
        .await
        .unwrap();
    assert_eq!(server.last_request().method, "DELETE");
}

#[tokio::test]
async fn test_delete_item_accepts_message_body() {
    let server = FakeServer::start().await;
    server.respond(
        "DELETE",
        "/api/v1/cis/ci-3",
        StatusCode::OK,
        json!({"message": "CI ci-3 deleted successfully"}),
    );

    assert!(server
        .client()
        .delete_item(&ItemId::from("ci-3"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_list_relationships_sends_direction() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/cis/ci-1/relationships",
        StatusCode::OK,
        json!([
            {
                "id": "rel-1",
                "type": "DEPENDS_ON",
                "direction": "incoming",
                "related_ci": {"id": "ci-2", "name": "web-02"},
                "created_at": "2024-05-01T10:00:00Z"
            }
        ]),
    );

    let relationships = server
        .client()
        .list_relationships(&ItemId::from("ci-1"), DirectionFilter::Incoming)
        .await
        .unwrap();

    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].relationship_type, RelationshipType::DependsOn);
    assert!(matches!(
        relationships[0].endpoints,
        Endpoints::Relative { .. }
    ));
    assert_eq!(
        server.last_request().query.as_deref(),
        Some("direction=incoming")
    );
}

#[tokio::test]
async fn test_list_all_relationships_sends_paging() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/relationships",
        StatusCode::OK,
        json!([
            {
                "id": "rel-1",
                "type": "HOSTS",
                "from_ci": {"id": "ci-1", "name": "host-01"},
                "to_ci": {"id": "ci-2", "name": "vm-01"},
                "created_at": null
            }
        ]),
    );

    let relationships = server
        .client()
        .list_all_relationships(1000, 0)
        .await
        .unwrap();

    assert!(relationships[0].involves(&ItemId::from("ci-2")));
    assert_eq!(
        server.last_request().query.as_deref(),
        Some("limit=1000&offset=0")
    );
}

#[tokio::test]
async fn test_create_relationship_posts_body() {
    let server = FakeServer::start().await;
    server.respond(
        "POST",
        "/api/v1/relationships",
        StatusCode::OK,
        json!({
            "message": "Relationship created successfully",
            "from_ci": "ci-1",
            "to_ci": "ci-2",
            "type": "DEPENDS_ON"
        }),
    );

    let request = NewRelationship::new("ci-1", "ci-2", RelationshipType::DependsOn)
        .with_description("checkout calls payments");
    let created = server.client().create_relationship(&request).await.unwrap();
    assert_eq!(created.from_ci, "ci-1");
    assert_eq!(created.relationship_type, "DEPENDS_ON");

    assert_eq!(
        server.last_request().body,
        Some(json!({
            "from_ci_id": "ci-1",
            "to_ci_id": "ci-2",
            "relationship_type": "DEPENDS_ON",
            "description": "checkout calls payments"
        }))
    );
}

#[tokio::test]
async fn test_delete_relationship() {
    let server = FakeServer::start().await;
    server.respond_empty("DELETE", "/api/v1/relationships/rel-4", StatusCode::NO_CONTENT);

    server
        .client()
        .delete_relationship(&RelationshipId::from("rel-4"))
        .await
        .unwrap();
    assert_eq!(server.last_request().path, "/api/v1/relationships/rel-4");
}

#[tokio::test]
async fn test_impact_and_dependency_analysis_send_depth() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/impact/ci-1",
        StatusCode::OK,
        json!({
            "source_ci": "ci-1",
            "total_impacted": 1,
            "impacted_cis": [
                {"ci_id": "ci-2", "ci_name": "web-02", "criticality": "HIGH", "distance": 1, "relationship_chain": ["DEPENDS_ON"]}
            ],
            "criticality_breakdown": {"HIGH": 1},
            "risk_score": 4.5,
            "max_depth_analyzed": 3
        }),
    );
    server.respond(
        "GET",
        "/api/v1/dependencies/ci-1",
        StatusCode::OK,
        json!({
            "source_ci": "ci-1",
            "total_dependencies": 0,
            "dependencies": [],
            "max_depth_analyzed": 2
        }),
    );

    let client = server.client();
    let impact = client
        .impact_analysis(&ItemId::from("ci-1"), 3)
        .await
        .unwrap();
    assert_eq!(impact.total_impacted, 1);
    assert_eq!(impact.impacted_at(Criticality::High), 1);
    assert_eq!(server.last_request().query.as_deref(), Some("max_depth=3"));

    let dependencies = client
        .dependency_analysis(&ItemId::from("ci-1"), 2)
        .await
        .unwrap();
    assert_eq!(dependencies.max_depth_analyzed, 2);
    assert_eq!(server.last_request().query.as_deref(), Some("max_depth=2"));
}

#[tokio::test]
async fn test_bus_factor_stats_and_health() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/busfactor",
        StatusCode::OK,
        json!({
            "high_risk_cis": [
                {"ci_id": "ci-1", "ci_name": "db-01", "ci_type": "DATABASE", "criticality": "CRITICAL", "dependency_count": 12, "risk_score": 9.1}
            ],
            "total_analyzed": 40,
            "analysis_date": "2024-05-01T10:00:00Z"
        }),
    );
    server.respond(
        "GET",
        "/api/v1/graph/stats",
        StatusCode::OK,
        json!({
            "total_cis": 42,
            "total_relationships": 57,
            "unique_relationship_types": 6,
            "relationship_type_breakdown": {"DEPENDS_ON": 30}
        }),
    );
    server.respond(
        "GET",
        "/health",
        StatusCode::OK,
        json!({"status": "healthy", "service": "constellation-api", "version": "0.1.0"}),
    );

    let client = server.client();
    let bus = client.bus_factor_analysis().await.unwrap();
    assert_eq!(bus.high_risk_cis[0].dependency_count, 12);

    let stats = client.graph_stats().await.unwrap();
    assert_eq!(stats.total_cis, 42);

    let health = client.health().await.unwrap();
    assert!(health.is_healthy());

    let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/api/v1/busfactor", "/api/v1/graph/stats", "/health"]);
}

#[tokio::test]
async fn test_not_found_carries_detail() {
    let server = FakeServer::start().await;
    server.respond(
        "GET",
        "/api/v1/cis/ghost",
        StatusCode::NOT_FOUND,
        json!({"detail": "CI not found: ghost"}),
    );

    let err = server
        .client()
        .get_item(&ItemId::from("ghost"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match &err {
        ClientError::Status { status, detail } => {
            assert_eq!(*status, 404);
            assert_eq!(detail.as_deref(), Some("CI not found: ghost"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.message().unwrap().contains("CI not found: ghost"));
}

#[tokio::test]
async fn test_server_error_without_body_has_no_message() {
    let server = FakeServer::start().await;
    server.respond_empty("GET", "/api/v1/graph/stats", StatusCode::INTERNAL_SERVER_ERROR);

    let err = server.client().graph_stats().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.message().is_none());
}

#[tokio::test]
async fn test_plain_text_error_body_becomes_detail() {
    let server = FakeServer::start().await;
    server.respond_raw("POST", "/api/v1/cis/", StatusCode::BAD_GATEWAY, "upstream down");

    let err = server
        .client()
        .create_item(&ItemDraft::named("x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status { status: 502, detail: Some(ref d) } if d == "upstream down"
    ));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = FakeServer::start().await;
    server.respond("GET", "/api/v1/cis/ci-1", StatusCode::OK, json!({"unexpected": true}));

    let err = server
        .client()
        .get_item(&ItemId::from("ci-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = FakeServer::start().await;
    server.respond_slowly(
        "GET",
        "/health",
        Duration::from_millis(1500),
        json!({"status": "healthy"}),
    );

    let client = ApiClient::new(
        ClientConfig::new(&server.base_url).with_timeout(Duration::from_millis(100)),
    )
    .unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_millis(100)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ClientConfig::new(format!("http://{}", addr))).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.message().is_some());
}
