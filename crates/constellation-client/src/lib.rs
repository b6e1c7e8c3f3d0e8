//! HTTP client for the Constellation CMDB API.
//!
//! [`CmdbApi`] is the async seam consumed by the store; [`ApiClient`]
//! implements it over `reqwest` against the fixed `/api/v1` paths.
//!
//! # Example
//!
//! ```ignore
//! use constellation_client::{ApiClient, ClientConfig, CmdbApi};
//! use constellation_models::ItemQuery;
//!
//! let client = ApiClient::new(ClientConfig::new("http://localhost:8000"))?;
//! let page = client.list_items(&ItemQuery::new().limit(50)).await?;
//! println!("{} of {} items", page.cis.len(), page.total_count);
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;

pub use api::CmdbApi;
pub use client::ApiClient;
pub use config::{
    ClientConfig, API_TIMEOUT_ENV, API_URL_ENV, DEFAULT_API_URL, DEFAULT_TIMEOUT,
};
pub use error::{ClientError, Result};
