use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::settings::MediaConfig;
use crate::error::AppError;

/// A file hosted by the external media service.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
    /// Duration in seconds, present for video uploads
    pub duration: Option<f64>,
}

/// Client for the external media upload/transcode service. Files are
/// forwarded as-is; the service answers with the hosted URL and a public id
/// used for later deletion.
#[derive(Clone)]
pub struct MediaClient {
    http: Client,
    upload_url: String,
    api_key: String,
}

impl MediaClient {
    pub fn new(config: &MediaConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300)) // video uploads can be slow
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Upload a file and return the hosted asset.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<MediaAsset, AppError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.upload_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Media upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Media upload rejected: status={}, body={}", status, body);
            return Err(AppError::External(format!(
                "Media service rejected upload with status {}",
                status
            )));
        }

        response
            .json::<MediaAsset>()
            .await
            .map_err(|e| AppError::External(format!("Media upload response malformed: {}", e)))
    }

    /// Delete a previously uploaded asset by its public id. Best-effort
    /// callers may ignore the result.
    pub async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .delete(format!("{}/assets/{}", self.upload_url, public_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Media delete request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "Media service rejected delete with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server_url: &str) -> MediaClient {
        MediaClient::new(&MediaConfig {
            upload_url: server_url.to_string(),
            api_key: "test-key".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_parses_asset_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"url":"https://cdn.example/v/abc.mp4","public_id":"abc","duration":12.5}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let asset = client.upload("clip.mp4", vec![1, 2, 3]).await.unwrap();

        assert_eq!(asset.url, "https://cdn.example/v/abc.mp4");
        assert_eq!(asset.public_id, "abc");
        assert_eq!(asset.duration, Some(12.5));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_failure_is_external_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client.upload("clip.mp4", vec![1]).await.unwrap_err();
        assert!(matches!(err, AppError::External(_)));
    }

    #[tokio::test]
    async fn test_delete_hits_asset_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/assets/abc")
            .with_status(200)
            .create_async()
            .await;

        let client = client_for(&server.url());
        client.delete("abc").await.unwrap();
        mock.assert_async().await;
    }
}
