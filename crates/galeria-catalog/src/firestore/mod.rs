//! Firestore destination over the REST API
//!
//! Writes go through `documents:commit` so the document body and the
//! server-side `migrado_el` transform land atomically. Upsert lookups use
//! `documents:runQuery` on the `source_id` field.

pub mod value;

use crate::error::{CatalogError, CatalogResult};
use crate::traits::DestinationCatalogWriter;
use async_trait::async_trait;
use galeria_core::constants::{MIGRATED_AT_FIELD, SOURCE_ID_FIELD};
use galeria_core::{DestinationConfig, DestinationRecord, RecordId};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct FirestoreCatalogWriter {
    client: Client,
    base_url: String,
    access_token: String,
    /// `projects/{project}/databases/{database}/documents`
    documents_root: String,
    collection: String,
}

impl FirestoreCatalogWriter {
    pub fn new(client: Client, config: &DestinationConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            documents_root: format!(
                "projects/{}/databases/{}/documents",
                config.project_id, config.database
            ),
            collection: config.collection.clone(),
        }
    }

    fn document_name(&self, document_id: &str) -> String {
        format!("{}/{}/{}", self.documents_root, self.collection, document_id)
    }

    /// Body for a single-write commit that stores `record` under
    /// `document_name` and stamps the migration time server-side.
    fn commit_body(
        document_name: &str,
        record: &DestinationRecord,
        must_not_exist: bool,
    ) -> CatalogResult<JsonValue> {
        let document = serde_json::to_value(record)
            .map_err(|e| CatalogError::Encode(e.to_string()))?;
        let fields = match &document {
            JsonValue::Object(map) => value::encode_fields(map),
            _ => {
                return Err(CatalogError::Encode(
                    "destination record is not a JSON object".to_string(),
                ))
            }
        };

        let mut write = json!({
            "update": {
                "name": document_name,
                "fields": fields,
            },
            "updateTransforms": [{
                "fieldPath": MIGRATED_AT_FIELD,
                "setToServerValue": "REQUEST_TIME",
            }],
        });
        if must_not_exist {
            write["currentDocument"] = json!({ "exists": false });
        }

        Ok(json!({ "writes": [write] }))
    }

    async fn post(&self, action: &str, body: &JsonValue) -> CatalogResult<JsonValue> {
        let url = format!("{}/{}:{}", self.base_url, self.documents_root, action);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(body)
            .send()
            .await
            .map_err(|e| CatalogError::request(&url, e))?;

        if !response.status().is_success() {
            return Err(CatalogError::from_response(&url, response).await);
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| CatalogError::Decode(format!("{} response: {}", action, e)))
    }
}

#[async_trait]
impl DestinationCatalogWriter for FirestoreCatalogWriter {
    async fn insert(&self, record: &DestinationRecord) -> CatalogResult<String> {
        let document_id = Uuid::new_v4().simple().to_string();
        let body = Self::commit_body(&self.document_name(&document_id), record, true)?;
        self.post("commit", &body).await?;

        tracing::debug!(
            collection = %self.collection,
            document_id = %document_id,
            source_id = %record.source_id,
            "Firestore document created"
        );

        Ok(document_id)
    }

    async fn find_by_source_id(&self, source_id: &RecordId) -> CatalogResult<Option<String>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": SOURCE_ID_FIELD },
                        "op": "EQUAL",
                        "value": { "stringValue": source_id.as_str() },
                    }
                },
                "limit": 1,
            }
        });

        let results = self.post("runQuery", &body).await?;
        let rows = results
            .as_array()
            .ok_or_else(|| CatalogError::Decode("runQuery response is not an array".to_string()))?;

        // Rows without a `document` only carry a read time
        let document_id = rows
            .iter()
            .filter_map(|row| row.pointer("/document/name").and_then(JsonValue::as_str))
            .filter_map(|name| name.rsplit('/').next())
            .next()
            .map(str::to_string);

        Ok(document_id)
    }

    async fn replace(&self, document_id: &str, record: &DestinationRecord) -> CatalogResult<()> {
        let body = Self::commit_body(&self.document_name(document_id), record, false)?;
        self.post("commit", &body).await?;

        tracing::debug!(
            collection = %self.collection,
            document_id = %document_id,
            source_id = %record.source_id,
            "Firestore document replaced"
        );

        Ok(())
    }
}
