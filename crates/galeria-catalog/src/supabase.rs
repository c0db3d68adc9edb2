//! Supabase source: PostgREST table listing and public bucket addresses

use crate::error::{CatalogError, CatalogResult};
use crate::traits::SourceCatalogReader;
use async_trait::async_trait;
use galeria_core::{AssetRef, CatalogRecord, SourceConfig};
use reqwest::Client;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug)]
pub struct SupabaseCatalogReader {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
    bucket: String,
    page_size: usize,
}

impl SupabaseCatalogReader {
    pub fn new(client: Client, config: &SourceConfig) -> Self {
        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_key.clone(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
            page_size: config.page_size.max(1),
        }
    }

    async fn fetch_page(&self, offset: usize) -> CatalogResult<Vec<JsonValue>> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        let query = [
            ("select", "*".to_string()),
            ("order", "id.asc".to_string()),
            ("limit", self.page_size.to_string()),
            ("offset", offset.to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(&query)
            .send()
            .await
            .map_err(|e| CatalogError::request(&url, e))?;

        if !response.status().is_success() {
            return Err(CatalogError::from_response(&url, response).await);
        }

        response
            .json::<Vec<JsonValue>>()
            .await
            .map_err(|e| CatalogError::Decode(format!("{} listing: {}", self.table, e)))
    }
}

#[async_trait]
impl SourceCatalogReader for SupabaseCatalogReader {
    async fn list_records(&self) -> CatalogResult<Vec<CatalogRecord>> {
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(offset).await?;
            let page_len = page.len();

            for row in page {
                match serde_json::from_value::<CatalogRecord>(row) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            table = %self.table,
                            offset,
                            "Skipping undecodable source row"
                        );
                    }
                }
            }

            // PostgREST may cap a page below `limit` (max-rows), so only an empty
            // page ends the listing.
            if page_len == 0 {
                break;
            }
            offset += page_len;
        }

        tracing::info!(
            table = %self.table,
            record_count = records.len(),
            "Source catalog listed"
        );

        Ok(records)
    }

    fn resolve_asset_address(&self, asset: &AssetRef) -> CatalogResult<String> {
        public_object_url(&self.base_url, &self.bucket, asset)
    }
}

/// Public URL of `asset` in a Supabase storage bucket.
pub(crate) fn public_object_url(
    base_url: &str,
    bucket: &str,
    asset: &AssetRef,
) -> CatalogResult<String> {
    let locator = asset
        .locator()
        .ok_or_else(|| CatalogError::MalformedAssetRef("missing path".to_string()))?;

    let encoded: Vec<String> = locator
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();

    Ok(format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        bucket,
        encoded.join("/")
    ))
}
