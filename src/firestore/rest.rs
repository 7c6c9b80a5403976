//! Cloud Firestore document store over the v1 REST API
//!
//! # REST Reference
//! - `projects.databases.documents.get`
//! - `projects.databases.documents.createDocument`
//! - `projects.databases.documents.patch`
//! - `projects.databases.documents.delete`
//! - `projects.databases.documents.runQuery`

use super::credentials::TokenProvider;
use super::document_snapshot::DocumentSnapshot;
use super::field_value::{set_field, Record};
use super::query::QueryState;
use super::settings::ClientConfig;
use super::store::{DocumentStore, DocumentStream};
use super::wire::{decode_fields, encode_fields, quote_field_path, structured_query, RunQueryResponse, WireDocument};
use crate::error::{FirebaseError, FirestoreError};
use async_stream::stream;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde_json::json;
use std::sync::Arc;

/// Document store backed by Cloud Firestore (or its emulator)
///
/// Cloning is cheap; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct RestStore {
    http: reqwest::Client,
    /// e.g. `https://firestore.googleapis.com/v1`
    base_url: Url,
    /// `projects/{project}/databases/{database}`
    database_path: String,
    tokens: Arc<TokenProvider>,
}

impl RestStore {
    /// Build the HTTP client and resolve credentials
    ///
    /// Key files are read here; no request is sent until the first
    /// operation.
    pub async fn connect(config: &ClientConfig) -> Result<Self, FirebaseError> {
        let http = reqwest::Client::builder()
            .timeout(config.settings.timeout)
            .connect_timeout(config.settings.connect_timeout)
            .build()?;
        let tokens = TokenProvider::from_source(&config.credentials).await?;
        let base_url = config.settings.base_url();
        let base_url = Url::parse(&base_url)
            .map_err(|err| FirebaseError::internal(format!("invalid base url '{}': {}", base_url, err)))?;
        if base_url.cannot_be_a_base() {
            return Err(FirebaseError::internal(format!("base url '{}' cannot carry a path", base_url)));
        }

        Ok(Self {
            http,
            base_url,
            database_path: config.database_path(),
            tokens: Arc::new(tokens),
        })
    }

    /// Resource name prefix for documents in this database
    fn documents_root(&self) -> String {
        format!("{}/documents", self.database_path)
    }

    fn document_url(&self, path: &str) -> Url {
        self.resource_url(path, "")
    }

    fn run_query_url(&self, parent_path: &str) -> Url {
        self.resource_url(parent_path, ":runQuery")
    }

    /// URL of `path` under the documents root, `suffix` appended to the last segment
    ///
    /// Every segment is percent-encoded, so ids may carry `?`, `#` or `%`.
    fn resource_url(&self, path: &str, suffix: &str) -> Url {
        let path = path.trim_matches('/');
        let root = self.documents_root();
        let mut segments: Vec<&str> = root.split('/').collect();
        if !path.is_empty() {
            segments.extend(path.split('/'));
        }
        let last = segments.pop().map(|segment| format!("{}{}", segment, suffix));

        let mut url = self.base_url.clone();
        // checked in connect
        if let Ok(mut url_segments) = url.path_segments_mut() {
            url_segments.pop_if_empty().extend(segments).extend(last);
        }
        url
    }

    /// Strip the database prefix from a document resource name
    fn relative_path(&self, name: &str) -> String {
        let root = self.documents_root();
        name.strip_prefix(&root)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_else(|| name.to_string())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, FirebaseError> {
        let token = self.tokens.token(&self.http).await?;
        let response = request.bearer_auth(token).send().await?;
        Ok(response)
    }

    fn snapshot(&self, document: WireDocument) -> DocumentSnapshot {
        let path = self.relative_path(&document.name);
        DocumentSnapshot::found(path, decode_fields(document.fields))
    }

    async fn fetch_query(&self, query: &QueryState) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        let request = self
            .http
            .post(self.run_query_url(&query.parent_path))
            .json(&structured_query(query));
        let response = error_for_status(self.send(request).await?).await?;
        let results: Vec<RunQueryResponse> = response.json().await?;

        Ok(results
            .into_iter()
            .filter_map(|result| result.document)
            .map(|document| self.snapshot(document))
            .collect())
    }
}

/// Turn a non-success response into a [`FirestoreError`]
///
/// Error bodies are `{"error": {...}}`, or a one-element array of that
/// shape for streaming methods.
async fn error_for_status(response: Response) -> Result<Response, FirebaseError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let error = body
        .get("error")
        .or_else(|| body.get(0).and_then(|item| item.get("error")))
        .cloned()
        .unwrap_or_default();
    let status_name = error["status"].as_str().unwrap_or_default();
    let message = error["message"].as_str().unwrap_or_default();

    tracing::debug!(status = status.as_u16(), status_name, message, "request failed");
    Err(FirestoreError::from_status(status_name, message, status.as_u16()).into())
}

impl DocumentStore for RestStore {
    async fn get_document(&self, path: &str) -> Result<DocumentSnapshot, FirebaseError> {
        tracing::debug!(path, "get document");
        let response = self.send(self.http.get(self.document_url(path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DocumentSnapshot::missing(path.trim_matches('/')));
        }
        let document: WireDocument = error_for_status(response).await?.json().await?;
        Ok(self.snapshot(document))
    }

    async fn create_document(
        &self,
        collection_path: &str,
        document_id: Option<&str>,
        data: Record,
    ) -> Result<String, FirebaseError> {
        tracing::debug!(collection_path, document_id, "create document");
        let mut request = self
            .http
            .post(self.document_url(collection_path))
            .json(&json!({ "fields": encode_fields(&data) }));
        if let Some(id) = document_id {
            request = request.query(&[("documentId", id)]);
        }

        let document: WireDocument = error_for_status(self.send(request).await?).await?.json().await?;
        Ok(self.relative_path(&document.name))
    }

    async fn update_document(&self, path: &str, data: Record) -> Result<(), FirebaseError> {
        tracing::debug!(path, fields = data.len(), "update document");
        let mut params: Vec<(&str, String)> = data
            .keys()
            .map(|field| ("updateMask.fieldPaths", quote_field_path(field)))
            .collect();
        params.push(("currentDocument.exists", "true".to_string()));

        // dotted keys address nested fields; the body must carry them nested
        let mut fields = Record::new();
        for (field, value) in data {
            set_field(&mut fields, &field, value);
        }

        let request = self
            .http
            .patch(self.document_url(path))
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }));
        error_for_status(self.send(request).await?).await?;
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), FirebaseError> {
        tracing::debug!(path, "delete document");
        let response = self.send(self.http.delete(self.document_url(path))).await?;
        error_for_status(response).await?;
        Ok(())
    }

    fn run_query(&self, query: QueryState) -> DocumentStream {
        let store = self.clone();
        Box::pin(stream! {
            match store.fetch_query(&query).await {
                Ok(documents) => {
                    for document in documents {
                        yield Ok(document);
                    }
                }
                Err(err) => yield Err(err),
            }
        })
    }
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .field("database_path", &self.database_path)
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn emulator_store() -> RestStore {
        RestStore::connect(&ClientConfig::emulator("demo", "localhost:8080"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_urls() {
        let store = emulator_store().await;
        assert_eq!(
            store.document_url("users/a").as_str(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users/a"
        );
        assert_eq!(
            store.document_url("/users/a/").as_str(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users/a"
        );
        assert_eq!(
            store.run_query_url("").as_str(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents:runQuery"
        );
        assert_eq!(
            store.run_query_url("users/a").as_str(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users/a:runQuery"
        );
    }

    #[tokio::test]
    async fn test_urls_encode_ids() {
        let store = emulator_store().await;
        let url = store.document_url("users/x?y#z w%");
        assert_eq!(url.path(), "/v1/projects/demo/databases/(default)/documents/users/x%3Fy%23z%20w%25");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = store.run_query_url("users/a?b");
        assert_eq!(url.path(), "/v1/projects/demo/databases/(default)/documents/users/a%3Fb:runQuery");
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn test_relative_path() {
        let store = emulator_store().await;
        assert_eq!(
            store.relative_path("projects/demo/databases/(default)/documents/users/a/posts/p1"),
            "users/a/posts/p1"
        );
    }

    #[tokio::test]
    async fn test_query_stream_is_lazy() {
        // building the stream must not touch the network
        let store = emulator_store().await;
        let stream = store.run_query(QueryState::collection("users"));
        drop(stream);

        let mut stream = store.run_query(QueryState::collection("users"));
        // with no emulator listening the first poll reports a transport error
        if let Some(Err(err)) = stream.next().await {
            assert!(matches!(err, FirebaseError::Network(_) | FirebaseError::Firestore(_)));
        }
    }
}
