//! Cloud Firestore adapter over the REST API.
//!
//! Implements the `DocumentStore` port against
//! `projects/{project}/databases/(default)/documents`. The REST API has no
//! push channel, so listeners are emulated: each subscription runs a
//! polling task that re-reads its query or document at a fixed interval and
//! forwards the result only when it differs from the last one sent.
//! Dropping the [`Listener`] aborts the task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::codec::{decode_document, encode_fields};
use super::identity::IdTokenSource;
use crate::domain::foundation::DocumentId;
use crate::ports::{
    Direction, Document, DocumentPath, DocumentSnapshot, DocumentStore, Fields, Listener,
    ListenerRegistration, Query, QuerySnapshot, StoreError,
};

/// Default Firestore REST endpoint.
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Configuration for the Firestore adapter.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,

    /// REST base URL (overridden for the emulator).
    pub base_url: String,

    /// How often listeners re-read their target.
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            base_url: DEFAULT_FIRESTORE_URL.to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resource name of the database's document root.
    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_root(), collection)
    }

    fn document_url(&self, path: &DocumentPath) -> String {
        format!("{}/{}/{}", self.documents_root(), path.collection, path.id)
    }

    fn run_query_url(&self) -> String {
        format!("{}:runQuery", self.documents_root())
    }
}

/// Shared request state, cloned into every polling task.
struct Client {
    config: FirestoreConfig,
    http_client: reqwest::Client,
    tokens: Arc<dyn IdTokenSource>,
}

impl Client {
    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.id_token().await {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let request = self.authorized(request).await;
        let response = request.send().await.map_err(|e| {
            tracing::error!("Firestore request failed: {}", e);
            StoreError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    async fn json(&self, request: reqwest::RequestBuilder) -> Result<Value, StoreError> {
        self.send(request)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Internal(format!("Malformed Firestore response: {}", e)))
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let request = self.http_client.get(self.config.document_url(path));
        match self.json(request).await {
            Ok(body) => decode_document(&body).map(Some),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let request = self
            .http_client
            .post(self.config.run_query_url())
            .json(&structured_query(query));
        let rows = self.json(request).await?;

        let mut documents = rows
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect::<Result<Vec<_>, _>>()?;
        query.sort(&mut documents);
        Ok(documents)
    }
}

/// Firestore REST implementation of `DocumentStore`.
pub struct FirestoreDocumentStore {
    client: Arc<Client>,
}

impl FirestoreDocumentStore {
    pub fn new(
        config: FirestoreConfig,
        http_client: reqwest::Client,
        tokens: Arc<dyn IdTokenSource>,
    ) -> Self {
        Self {
            client: Arc::new(Client {
                config,
                http_client,
                tokens,
            }),
        }
    }

    /// Replaces the whole document, creating it when absent.
    fn set_request(&self, path: &DocumentPath, fields: &Fields) -> reqwest::RequestBuilder {
        self.client
            .http_client
            .patch(self.client.config.document_url(path))
            .json(&json!({ "fields": encode_fields(fields) }))
    }

    /// Writes only the named fields and fails when the document is absent.
    fn update_request(&self, path: &DocumentPath, fields: &Fields) -> reqwest::RequestBuilder {
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", name.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        self.client
            .http_client
            .patch(self.client.config.document_url(path))
            .query(&params)
            .json(&json!({ "fields": encode_fields(fields) }))
    }

    /// Starts a polling task that forwards changed results.
    fn poll<T, F>(&self, resource: String, fetch: F) -> Listener<Result<T, StoreError>>
    where
        T: PartialEq + Clone + Send + 'static,
        F: Fn(Arc<Client>) -> BoxFuture<'static, Result<T, StoreError>> + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::error!(%resource, "Cannot start listener outside a tokio runtime");
                return Listener::once(Err(StoreError::Internal(
                    "no async runtime available for listener".to_string(),
                )));
            }
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let client = Arc::clone(&self.client);
        let interval = client.config.poll_interval;
        tracing::debug!(%resource, "Listener opened");

        let task = handle.spawn(async move {
            let mut last: Option<Result<T, StoreError>> = None;
            loop {
                let result = fetch(Arc::clone(&client)).await;
                if last.as_ref() != Some(&result) {
                    if let Err(e) = &result {
                        tracing::warn!(%resource, "Listener read failed: {}", e);
                    }
                    if sender.send(result.clone()).is_err() {
                        break;
                    }
                    last = Some(result);
                }
                tokio::time::sleep(interval).await;
            }
        });

        let registration = ListenerRegistration::new(move || {
            task.abort();
            tracing::debug!("Listener closed");
        });
        Listener::new(receiver, registration)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.client.get(path).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        let request = self
            .client
            .http_client
            .post(self.client.config.collection_url(collection))
            .json(&json!({ "fields": encode_fields(&fields) }));
        let body = self.client.json(request).await?;
        let document = decode_document(&body)?;
        DocumentId::new(document.id)
            .map_err(|e| StoreError::Internal(format!("Server assigned an invalid key: {}", e)))
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let request = self.set_request(path, &fields);
        self.client.send(request).await.map(|_| ())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let request = self.update_request(path, &fields);
        self.client.send(request).await.map(|_| ())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let request = self
            .client
            .http_client
            .delete(self.client.config.document_url(path));
        match self.client.send(request).await {
            Ok(_) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn listen_query(&self, query: Query) -> Listener<QuerySnapshot> {
        let resource = query.collection.clone();
        self.poll(resource, move |client| {
            let query = query.clone();
            async move { client.run_query(&query).await }.boxed()
        })
    }

    fn listen_document(&self, path: DocumentPath) -> Listener<DocumentSnapshot> {
        let resource = path.to_string();
        self.poll(resource, move |client| {
            let path = path.clone();
            async move { client.get(&path).await }.boxed()
        })
    }
}

/// Builds the `runQuery` request body for a query.
fn structured_query(query: &Query) -> Value {
    let mut structured = json!({ "from": [{ "collectionId": query.collection }] });

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|filter| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": filter.field },
                    "op": "EQUAL",
                    "value": super::codec::encode_value(&filter.value),
                }
            })
        })
        .collect();
    match filters.len() {
        0 => {}
        1 => structured["where"] = filters[0].clone(),
        _ => {
            structured["where"] = json!({ "compositeFilter": { "op": "AND", "filters": filters } })
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{ "field": { "fieldPath": order.field }, "direction": direction }]);
    }

    json!({ "structuredQuery": structured })
}

fn status_error(status: reqwest::StatusCode, body: String) -> StoreError {
    use reqwest::StatusCode;

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied(message),
        StatusCode::BAD_REQUEST => StoreError::InvalidArgument(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            StoreError::Unavailable(message)
        }
        s if s.is_server_error() => StoreError::Unavailable(message),
        _ => StoreError::Internal(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use secrecy::SecretString;

    struct NoToken;

    #[async_trait]
    impl IdTokenSource for NoToken {
        async fn id_token(&self) -> Option<SecretString> {
            None
        }
    }

    fn store(base_url: &str) -> FirestoreDocumentStore {
        FirestoreDocumentStore::new(
            FirestoreConfig::new("masarat")
                .with_base_url(base_url)
                .with_poll_interval(Duration::from_millis(10)),
            reqwest::Client::new(),
            Arc::new(NoToken),
        )
    }

    fn user_fields() -> Fields {
        match json!({"totalXP": 20, "currentStreak": 2}) {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        }
    }

    #[test]
    fn update_masks_written_fields_and_requires_existing_document() {
        let store = store("http://localhost:8080/v1");
        let path = DocumentPath::new("users", DocumentId::new("u1").unwrap());

        let request = store.update_request(&path, &user_fields()).build().unwrap();

        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert_eq!(
            request.url().path(),
            "/v1/projects/masarat/databases/(default)/documents/users/u1"
        );
        let mut pairs: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("currentDocument.exists".to_string(), "true".to_string()),
                ("updateMask.fieldPaths".to_string(), "currentStreak".to_string()),
                ("updateMask.fieldPaths".to_string(), "totalXP".to_string()),
            ]
        );
    }

    #[test]
    fn set_replaces_without_mask_or_precondition() {
        let store = store("http://localhost:8080/v1");
        let path = DocumentPath::new("users", DocumentId::new("u1").unwrap());

        let request = store.set_request(&path, &user_fields()).build().unwrap();

        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert!(request.url().query().is_none());
        let body: Value = serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(body["fields"]["totalXP"], json!({"integerValue": "20"}));
    }

    #[test]
    fn urls_follow_resource_names() {
        let config = FirestoreConfig::new("masarat").with_base_url("http://localhost:8080/v1/");
        let path = DocumentPath::new("topics", DocumentId::new("t1").unwrap());

        assert_eq!(
            config.document_url(&path),
            "http://localhost:8080/v1/projects/masarat/databases/(default)/documents/topics/t1"
        );
        assert!(config.run_query_url().ends_with("/documents:runQuery"));
    }

    #[test]
    fn single_filter_is_not_wrapped() {
        let query = Query::collection("topics")
            .where_eq("categoryId", "c1")
            .order_by("order", Direction::Ascending);

        let body = structured_query(&query);

        assert_eq!(
            body["structuredQuery"]["where"]["fieldFilter"]["field"]["fieldPath"],
            "categoryId"
        );
        assert_eq!(body["structuredQuery"]["orderBy"][0]["direction"], "ASCENDING");
    }

    #[test]
    fn multiple_filters_are_and_composed() {
        let query = Query::collection("lessons")
            .where_eq("topicId", "t1")
            .where_eq("status", "PUBLISHED");

        let body = structured_query(&query);

        assert_eq!(body["structuredQuery"]["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(
            body["structuredQuery"]["where"]["compositeFilter"]["filters"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn http_statuses_map_to_store_errors() {
        use reqwest::StatusCode;

        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new()),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            status_error(
                StatusCode::FORBIDDEN,
                r#"{"error":{"message":"Missing or insufficient permissions."}}"#.to_string()
            ),
            StoreError::PermissionDenied(m) if m == "Missing or insufficient permissions."
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, String::new()),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn listener_outside_runtime_yields_error() {
        let store = store("http://127.0.0.1:1");
        let mut listener = store.listen_query(Query::collection("categories"));

        let first = futures::executor::block_on(listener.next());

        assert!(matches!(first, Some(Err(StoreError::Internal(_)))));
    }

    #[tokio::test]
    async fn unreachable_server_surfaces_as_unavailable_item() {
        let store = store("http://127.0.0.1:1");
        let mut listener = store.listen_document(DocumentPath::new(
            "users",
            DocumentId::new("u1").unwrap(),
        ));

        let first = listener.next().await;

        assert!(matches!(first, Some(Err(StoreError::Unavailable(_)))));
    }
}
