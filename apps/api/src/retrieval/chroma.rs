//! HTTP client for a Chroma vector store (REST API v2).
//!
//! The collection is resolved by name on first use (get-or-create) under the
//! configured tenant and database, and its id cached for the life of the
//! process. Chroma stores vectors but does not compute them over REST, so
//! documents and queries are embedded through an `Embedder` first.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::embeddings::Embedder;
use super::{IndexError, IndexHit, SemanticIndex};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the collection lives on the Chroma server.
#[derive(Debug, Clone)]
pub struct ChromaLocation {
    pub base_url: String,
    pub tenant: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    ids: [&'a str; 1],
    embeddings: [Vec<f32>; 1],
    documents: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: [Vec<f32>; 1],
    n_results: usize,
    include: [&'static str; 2],
}

/// Chroma returns one inner list per query embedding.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    ids: Vec<String>,
}

impl QueryResponse {
    /// Hits for the first query. Entries without a document text or without
    /// a distance cannot be shown or scored, so they are dropped.
    fn into_hits(self) -> Vec<IndexHit> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let documents = self
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let distances = self
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        let returned = ids.len();
        let hits: Vec<IndexHit> = ids
            .into_iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let document = documents
                    .get(i)
                    .cloned()
                    .flatten()
                    .filter(|d| !d.trim().is_empty())?;
                let distance = distances.get(i).copied().flatten()?;
                Some(IndexHit {
                    id,
                    document,
                    distance,
                })
            })
            .collect();

        if hits.len() < returned {
            debug!(
                "Dropped {} index hits without document or distance",
                returned - hits.len()
            );
        }
        hits
    }
}

pub struct ChromaIndex {
    client: Client,
    collections_url: String,
    collection_name: String,
    collection_id: OnceCell<String>,
    embedder: Arc<dyn Embedder>,
}

impl ChromaIndex {
    pub fn new(location: &ChromaLocation, embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            collections_url: collections_url(location),
            collection_name: location.collection.clone(),
            collection_id: OnceCell::new(),
            embedder,
        })
    }

    async fn collection_id(&self) -> Result<&str, IndexError> {
        self.collection_id
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .post(&self.collections_url)
                    .json(&json!({ "name": self.collection_name, "get_or_create": true }))
                    .send()
                    .await?;
                let info: CollectionInfo = read_json(response).await?;
                info!(
                    "Vector collection '{}' resolved (id: {})",
                    self.collection_name, info.id
                );
                Ok::<_, IndexError>(info.id)
            })
            .await
            .map(String::as_str)
    }

    async fn send(&self, action: &str, body: &impl Serialize) -> Result<Response, IndexError> {
        let id = self.collection_id().await?;
        let url = format!("{}/{id}/{action}", self.collections_url);
        Ok(self.client.post(&url).json(body).send().await?)
    }
}

fn collections_url(location: &ChromaLocation) -> String {
    format!(
        "{}/api/v2/tenants/{}/databases/{}/collections",
        location.base_url.trim_end_matches('/'),
        location.tenant,
        location.database
    )
}

async fn check_status(response: Response) -> Result<Response, IndexError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(IndexError::Store {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, IndexError> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|e| IndexError::Malformed(e.to_string()))
}

#[async_trait]
impl SemanticIndex for ChromaIndex {
    async fn add(&self, id: &str, document: &str) -> Result<(), IndexError> {
        let embedding = self.embedder.embed(document).await?;
        let request = AddRequest {
            ids: [id],
            embeddings: [embedding],
            documents: [document],
        };
        check_status(self.send("add", &request).await?).await?;
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<IndexHit>, IndexError> {
        let request = QueryRequest {
            query_embeddings: [self.embedder.embed(text).await?],
            n_results: top_k,
            include: ["documents", "distances"],
        };
        let response: QueryResponse = read_json(self.send("query", &request).await?).await?;
        let mut hits = response.into_hits();
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn exists(&self, id: &str) -> Result<bool, IndexError> {
        let response: GetResponse =
            read_json(self.send("get", &json!({ "ids": [id], "include": [] })).await?).await?;
        Ok(!response.ids.is_empty())
    }

    async fn all_ids(&self) -> Result<HashSet<String>, IndexError> {
        let response: GetResponse =
            read_json(self.send("get", &json!({ "include": [] })).await?).await?;
        Ok(response.ids.into_iter().collect())
    }
}
