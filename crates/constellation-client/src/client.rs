//! HTTP implementation of [`CmdbApi`] over `reqwest`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use constellation_models::{
    BusFactorAnalysis, DependencyAnalysis, DirectionFilter, GraphStats, HealthStatus,
    ImpactAnalysis, Item, ItemDraft, ItemId, ItemPage, ItemQuery, ItemWithRelationships,
    ItemWithRelationshipsDraft, NewRelationship, Relationship, RelationshipCreated,
    RelationshipId,
};

use crate::api::CmdbApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// CMDB API client.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ClientError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// URL for a path that embeds caller-supplied ids.
    fn resource_url(&self, segments: &[&str]) -> Result<String> {
        self.config.resource(segments).map(String::from)
    }

    /// Sends a request and rejects non-2xx responses.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build request: {}", e)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(method = %method, url = %url, "Sending API request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        trace!(method = %method, url = %url, status = status.as_u16(), "API response");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = extract_detail(&text);
            debug!(
                status = status.as_u16(),
                detail = detail.as_deref().unwrap_or(""),
                "API request rejected"
            );
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.execute(builder).await?;
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::Decode(format!("failed to parse response: {}", e)))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.execute(builder).await?;
        Ok(())
    }

    fn transport_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(self.config.timeout)
        } else {
            ClientError::Transport(error.to_string())
        }
    }
}

/// Pulls a readable message out of an error body: a `detail` field, then an
/// `error` field, then the raw text.
fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail").or_else(|| map.get("error")) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => Some(body.to_string()),
            Some(other) => Some(other.to_string()),
        },
        Ok(Value::String(s)) => Some(s),
        _ => Some(body.to_string()),
    }
}

#[async_trait]
impl CmdbApi for ApiClient {
    async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage> {
        self.fetch(self.http.get(self.url("/api/v1/cis/")).query(query))
            .await
    }

    async fn get_item(&self, id: &ItemId) -> Result<Item> {
        let url = self.resource_url(&["api", "v1", "cis", id.as_str()])?;
        self.fetch(self.http.get(url)).await
    }

    async fn create_item(&self, draft: &ItemDraft) -> Result<Item> {
        self.fetch(self.http.post(self.url("/api/v1/cis/")).json(draft))
            .await
    }

    async fn create_item_with_relationships(
        &self,
        draft: &ItemWithRelationshipsDraft,
    ) -> Result<ItemWithRelationships> {
        self.fetch(
            self.http
                .post(self.url("/api/v1/cis/with-relationships"))
                .json(draft),
        )
        .await
    }

    async fn update_item(&self, id: &ItemId, draft: &ItemDraft) -> Result<Item> {
        let url = self.resource_url(&["api", "v1", "cis", id.as_str()])?;
        self.fetch(self.http.put(url).json(draft)).await
    }

    async fn delete_item(&self, id: &ItemId) -> Result<()> {
        let url = self.resource_url(&["api", "v1", "cis", id.as_str()])?;
        self.send_empty(self.http.delete(url)).await
    }

    async fn list_relationships(
        &self,
        id: &ItemId,
        direction: DirectionFilter,
    ) -> Result<Vec<Relationship>> {
        let url = self.resource_url(&["api", "v1", "cis", id.as_str(), "relationships"])?;
        self.fetch(
            self.http
                .get(url)
                .query(&[("direction", direction.as_str())]),
        )
        .await
    }

    async fn list_all_relationships(&self, limit: u32, offset: u32) -> Result<Vec<Relationship>> {
        self.fetch(
            self.http
                .get(self.url("/api/v1/relationships"))
                .query(&[("limit", limit), ("offset", offset)]),
        )
        .await
    }

    async fn create_relationship(&self, request: &NewRelationship) -> Result<RelationshipCreated> {
        self.fetch(self.http.post(self.url("/api/v1/relationships")).json(request))
            .await
    }

    async fn delete_relationship(&self, id: &RelationshipId) -> Result<()> {
        let url = self.resource_url(&["api", "v1", "relationships", id.as_str()])?;
        self.send_empty(self.http.delete(url)).await
    }

    async fn impact_analysis(&self, id: &ItemId, max_depth: u32) -> Result<ImpactAnalysis> {
        let url = self.resource_url(&["api", "v1", "impact", id.as_str()])?;
        self.fetch(self.http.get(url).query(&[("max_depth", max_depth)]))
            .await
    }

    async fn dependency_analysis(
        &self,
        id: &ItemId,
        max_depth: u32,
    ) -> Result<DependencyAnalysis> {
        let url = self.resource_url(&["api", "v1", "dependencies", id.as_str()])?;
        self.fetch(self.http.get(url).query(&[("max_depth", max_depth)]))
            .await
    }

    async fn bus_factor_analysis(&self) -> Result<BusFactorAnalysis> {
        self.fetch(self.http.get(self.url("/api/v1/busfactor"))).await
    }

    async fn graph_stats(&self) -> Result<GraphStats> {
        self.fetch(self.http.get(self.url("/api/v1/graph/stats"))).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.fetch(self.http.get(self.url("/health"))).await
    }
}
