use crate::error::{CatalogError, CatalogResult};
use crate::traits::AssetFetcher;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;

/// Downloads source assets over HTTP(S), refusing bodies above `max_bytes`.
#[derive(Clone, Debug)]
pub struct HttpAssetFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpAssetFetcher {
    pub fn new(client: Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, address: &str) -> CatalogResult<Bytes> {
        let start = std::time::Instant::now();

        let mut response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(|e| CatalogError::request(address, e))?;

        if !response.status().is_success() {
            return Err(CatalogError::from_response(address, response).await);
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(CatalogError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CatalogError::request(address, e))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(CatalogError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            address = %address,
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset fetched"
        );

        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/storage/v1/object/public/imagenes/a.jpg")
            .with_status(200)
            .with_body(b"\xFF\xD8jpeg-bytes")
            .create_async()
            .await;

        let fetcher = HttpAssetFetcher::new(Client::new(), 1024);
        let address = format!("{}/storage/v1/object/public/imagenes/a.jpg", server.url());
        let body = fetcher.fetch(&address).await.unwrap();
        assert_eq!(&body[..], b"\xFF\xD8jpeg-bytes");
    }

    #[tokio::test]
    async fn test_missing_object() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/storage/v1/object/public/imagenes/gone.jpg")
            .with_status(404)
            .with_body(r#"{"error":"not_found"}"#)
            .create_async()
            .await;

        let fetcher = HttpAssetFetcher::new(Client::new(), 1024);
        let address = format!("{}/storage/v1/object/public/imagenes/gone.jpg", server.url());
        let err = fetcher.fetch(&address).await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_size_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.jpg")
            .with_status(200)
            .with_body(vec![0u8; 2048])
            .create_async()
            .await;

        let fetcher = HttpAssetFetcher::new(Client::new(), 1024);
        let err = fetcher
            .fetch(&format!("{}/big.jpg", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::TooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let fetcher = HttpAssetFetcher::new(Client::new(), 1024);
        let err = fetcher.fetch("http://127.0.0.1:1/a.jpg").await.unwrap_err();
        assert!(matches!(err, CatalogError::Request { .. }));
    }
}
