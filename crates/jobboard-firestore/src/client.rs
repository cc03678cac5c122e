//! Firestore REST API client.
//!
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - One transparent retry when the access token expired mid-flight
//! - Observability (tracing spans, metrics)
//! - Emulator mode without authentication

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, info_span, Instrument};

use jobboard_models::{DeleteResult, Fields, UpdateResult};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_request;
use crate::query::Query;
use crate::store::{DocumentStore, StoredDocument};
use crate::token_cache::TokenCache;
use crate::types::{
    fields_from_firestore, fields_to_firestore, BatchGetDocumentsRequest,
    BatchGetDocumentsResponse, CommitRequest, Document, DocumentTransform, FieldTransform,
    Precondition, RunQueryRequest, RunQueryResponse, Value, Write,
};

/// Firestore caps batchGet at this many documents per call.
const BATCH_GET_LIMIT: usize = 100;

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// `host:port` of a Firestore emulator; disables authentication
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.is_empty()),
        })
    }

    /// Resource path of the database's document root.
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    fn origin(&self) -> String {
        match &self.emulator_host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("http://{}", host),
            None => "https://firestore.googleapis.com".to_string(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    /// `None` when talking to the emulator.
    token_cache: Option<Arc<TokenCache>>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let token_cache = match &config.emulator_host {
            Some(host) => {
                info!(emulator_host = %host, "Using Firestore emulator without authentication");
                None
            }
            None => Some(Arc::new(TokenCache::new(Self::create_auth_provider().await?))),
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobboard-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let base_url = format!("{}/v1/{}", config.origin(), config.documents_root());

        Ok(Self {
            http,
            config,
            base_url,
            token_cache,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Service account file when GOOGLE_APPLICATION_CREDENTIALS is set,
    /// application default credentials otherwise.
    async fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => gcp_auth::provider().await.map_err(|e| {
                FirestoreError::auth_error(format!(
                    "No Google credentials found. Set GOOGLE_APPLICATION_CREDENTIALS \
                     to a service account JSON file: {}",
                    e
                ))
            }),
        }
    }

    /// Project this client is bound to.
    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// REST URL of a document; the id is percent-encoded as one path segment.
    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    fn document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_root(), collection, doc_id)
    }

    // =========================================================================
    // REST Operations
    // =========================================================================

    /// Get a document.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_url(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            let response = self.send(&url, |http| http.get(&url)).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Create a document with a server-assigned identifier.
    pub async fn create_document(&self, collection: &str, fields: &Fields) -> FirestoreResult<Document> {
        let url = format!("{}/{}", self.base_url, collection);
        let body = Document::new(fields_to_firestore(fields));

        self.execute_request("create_document", collection, None, async {
            let response = self.send(&url, |http| http.post(&url).json(&body)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Merge the given top-level fields into an existing document.
    ///
    /// Returns `None` when the document does not exist.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: &Fields,
    ) -> FirestoreResult<Option<Document>> {
        let mut params: Vec<String> = fields
            .keys()
            .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
            .collect();
        params.push("currentDocument.exists=true".to_string());
        let url = format!("{}?{}", self.document_url(collection, doc_id), params.join("&"));
        let body = Document::new(fields_to_firestore(fields));

        self.execute_request("update_document", collection, Some(doc_id), async {
            let response = self.send(&url, |http| http.patch(&url).json(&body)).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                status => {
                    let err = Self::handle_error_response(status, &url, response).await;
                    if err.is_missing_document() {
                        Ok(None)
                    } else {
                        Err(err)
                    }
                }
            }
        })
        .await
    }

    /// Atomically add `delta` to an integer field via a commit transform.
    ///
    /// Returns `false` when the document does not exist.
    pub async fn increment_field(
        &self,
        collection: &str,
        doc_id: &str,
        field: &str,
        delta: i64,
    ) -> FirestoreResult<bool> {
        let url = format!("{}:commit", self.base_url);
        let request = CommitRequest {
            writes: vec![Write {
                transform: DocumentTransform {
                    document: self.document_name(collection, doc_id),
                    field_transforms: vec![FieldTransform {
                        field_path: field.to_string(),
                        increment: Value::IntegerValue(delta.to_string()),
                    }],
                },
                current_document: Some(Precondition::must_exist()),
            }],
        };

        self.execute_request("increment_field", collection, Some(doc_id), async {
            let response = self.send(&url, |http| http.post(&url).json(&request)).await?;
            match response.status() {
                StatusCode::OK => Ok(true),
                status => {
                    let err = Self::handle_error_response(status, &url, response).await;
                    if err.is_missing_document() {
                        Ok(false)
                    } else {
                        Err(err)
                    }
                }
            }
        })
        .await
    }

    /// Delete a document. Returns `false` when it did not exist.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<bool> {
        let url = format!(
            "{}?currentDocument.exists=true",
            self.document_url(collection, doc_id)
        );

        self.execute_request("delete_document", collection, Some(doc_id), async {
            let response = self.send(&url, |http| http.delete(&url)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(true),
                status => {
                    let err = Self::handle_error_response(status, &url, response).await;
                    if err.is_missing_document() {
                        Ok(false)
                    } else {
                        Err(err)
                    }
                }
            }
        })
        .await
    }

    /// Fetch up to 100 documents by full resource name in one round trip.
    pub async fn batch_get_documents(
        &self,
        full_document_names: Vec<String>,
    ) -> FirestoreResult<Vec<Document>> {
        if full_document_names.is_empty() {
            return Ok(vec![]);
        }
        if full_document_names.len() > BATCH_GET_LIMIT {
            return Err(FirestoreError::request_failed(format!(
                "Batch get exceeds {} document limit",
                BATCH_GET_LIMIT
            )));
        }

        let url = format!("{}:batchGet", self.base_url);
        let request = BatchGetDocumentsRequest {
            documents: full_document_names,
        };

        self.execute_request("batch_get_documents", "batch", None, async {
            let response = self.send(&url, |http| http.post(&url).json(&request)).await?;
            match response.status() {
                StatusCode::OK => {
                    let responses: Vec<BatchGetDocumentsResponse> =
                        Self::parse_array(response, "batchGet").await?;
                    Ok(responses.into_iter().filter_map(|r| r.found).collect())
                }
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Run a filtered query over one top-level collection.
    pub async fn run_query(&self, collection: &str, query: &Query) -> FirestoreResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.base_url);
        let request = RunQueryRequest {
            structured_query: query.to_structured(collection),
        };

        self.execute_request("run_query", collection, None, async {
            let response = self.send(&url, |http| http.post(&url).json(&request)).await?;
            match response.status() {
                StatusCode::OK => {
                    // runQuery streams one element per document plus a trailing readTime
                    let responses: Vec<RunQueryResponse> =
                        Self::parse_array(response, "runQuery").await?;
                    Ok(responses.into_iter().filter_map(|r| r.document).collect())
                }
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send a request, attaching a bearer token unless running against the emulator.
    async fn send<F>(&self, url: &str, build: F) -> FirestoreResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let Some(tokens) = &self.token_cache else {
            return Ok(build(&self.http).send().await?);
        };

        let token = tokens.get_token().await?;
        let response = build(&self.http).bearer_auth(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&body) {
            return Err(FirestoreError::from_http_status(
                StatusCode::UNAUTHORIZED.as_u16(),
                format!("{} failed: {}", url, body),
            ));
        }

        debug!("Firestore access token expired, refreshing once");
        tokens.invalidate().await;
        let token = tokens.get_token().await?;
        Ok(build(&self.http).bearer_auth(&token).send().await?)
    }

    async fn parse_array<T: DeserializeOwned>(
        response: Response,
        operation: &str,
    ) -> FirestoreResult<Vec<T>> {
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str(&body).map_err(|e| {
            FirestoreError::InvalidResponse(format!(
                "Failed to parse {} response: {} (body prefix: {})",
                operation,
                e,
                body.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("firestore_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

fn into_stored(doc: Document) -> FirestoreResult<StoredDocument> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::InvalidResponse("document without a name".to_string()))?
        .to_string();
    Ok(StoredDocument {
        id,
        fields: doc.fields.as_ref().map(fields_from_firestore).unwrap_or_default(),
    })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    fn backend_name(&self) -> &'static str {
        "firestore"
    }

    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<StoredDocument>> {
        self.get_document(collection, id)
            .await?
            .map(into_stored)
            .transpose()
    }

    async fn get_many(
        &self,
        collection: &str,
        ids: &[String],
    ) -> FirestoreResult<Vec<StoredDocument>> {
        let mut found = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_GET_LIMIT) {
            let names = chunk
                .iter()
                .map(|id| self.document_name(collection, id))
                .collect();
            for doc in self.batch_get_documents(names).await? {
                found.push(into_stored(doc)?);
            }
        }
        Ok(found)
    }

    async fn insert(&self, collection: &str, fields: Fields) -> FirestoreResult<String> {
        let doc = self.create_document(collection, &fields).await?;
        Ok(into_stored(doc)?.id)
    }

    async fn find(&self, collection: &str, query: &Query) -> FirestoreResult<Vec<StoredDocument>> {
        self.run_query(collection, query)
            .await?
            .into_iter()
            .map(into_stored)
            .collect()
    }

    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> FirestoreResult<UpdateResult> {
        // Firestore does not report whether values changed
        Ok(match self.update_document(collection, id, &fields).await? {
            Some(_) => UpdateResult::new(1, 1),
            None => UpdateResult::unmatched(),
        })
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> FirestoreResult<UpdateResult> {
        Ok(if self.increment_field(collection, id, field, delta).await? {
            UpdateResult::new(1, 1)
        } else {
            UpdateResult::unmatched()
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<DeleteResult> {
        let deleted = self.delete_document(collection, id).await?;
        Ok(DeleteResult::new(u64::from(deleted)))
    }
}
