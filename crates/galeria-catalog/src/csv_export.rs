//! CSV export source: the source table dumped to a file (`productos_rows.csv`)

use crate::error::{CatalogError, CatalogResult};
use crate::supabase::public_object_url;
use crate::traits::SourceCatalogReader;
use async_trait::async_trait;
use galeria_core::{AssetRef, CatalogRecord, SourceConfig};
use serde_json::{Map, Value as JsonValue};
use std::path::PathBuf;

/// Lists records from a CSV export of the source table.
///
/// Images are still resolved against the Supabase storage bucket.
#[derive(Clone, Debug)]
pub struct CsvCatalogReader {
    path: PathBuf,
    base_url: String,
    bucket: String,
}

impl CsvCatalogReader {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            path: config.csv_path.clone(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
        }
    }

    fn parse(&self, data: &[u8]) -> CatalogResult<Vec<CatalogRecord>> {
        let mut reader = csv::ReaderBuilder::new().from_reader(data);
        let headers = reader
            .headers()
            .map_err(|e| CatalogError::Decode(format!("{} header: {}", self.path.display(), e)))?
            .clone();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %self.path.display(),
                        "Skipping unreadable CSV row"
                    );
                    continue;
                }
            };
            let line = row.position().map(|p| p.line()).unwrap_or_default();

            let object: Map<String, JsonValue> = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.to_string(), cell_value(header, cell)))
                .collect();

            match serde_json::from_value::<CatalogRecord>(JsonValue::Object(object)) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %self.path.display(),
                        line,
                        "Skipping undecodable source row"
                    );
                }
            }
        }

        Ok(records)
    }
}

/// Turn a CSV cell back into the JSON value the table held.
///
/// Empty cells are null and `imagenes` holds a JSON array. Booleans and numbers
/// whose text round-trips exactly become JSON scalars, so `007` stays text.
fn cell_value(header: &str, cell: &str) -> JsonValue {
    if cell.is_empty() {
        return JsonValue::Null;
    }
    if header == "imagenes" {
        return serde_json::from_str(cell).unwrap_or_else(|_| JsonValue::String(cell.to_string()));
    }
    match serde_json::from_str::<JsonValue>(cell) {
        Ok(value @ (JsonValue::Bool(_) | JsonValue::Number(_))) if value.to_string() == cell => {
            value
        }
        _ => JsonValue::String(cell.to_string()),
    }
}

#[async_trait]
impl SourceCatalogReader for CsvCatalogReader {
    async fn list_records(&self) -> CatalogResult<Vec<CatalogRecord>> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CatalogError::Read {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        let records = self.parse(&data)?;

        tracing::info!(
            path = %self.path.display(),
            record_count = records.len(),
            "Source catalog listed"
        );

        Ok(records)
    }

    fn resolve_asset_address(&self, asset: &AssetRef) -> CatalogResult<String> {
        public_object_url(&self.base_url, &self.bucket, asset)
    }
}
