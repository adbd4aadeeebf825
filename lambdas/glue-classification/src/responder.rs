use std::time::Duration;

use async_trait::async_trait;
use domain::{classification::Response, Error};
use reqwest::header::CONTENT_TYPE;

/// Delivers the terminal response of a lifecycle event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(&self, url: &str, response: &Response) -> Result<(), Error>;
}

pub struct HttpResponseSender {
    client: reqwest::Client,
}

impl HttpResponseSender {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ResponseSender for HttpResponseSender {
    async fn send(&self, url: &str, response: &Response) -> Result<(), Error> {
        let body = serde_json::to_vec(response)?;

        // The presigned response URL is signed without a content type.
        let reply = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Delivery {
                message: format!("HTTP error: {}", e),
            })?;

        let status = reply.status();
        if !status.is_success() {
            let text = reply.text().await.unwrap_or_default();
            return Err(Error::Delivery {
                message: format!("{} from response URL: {}", status, text),
            });
        }

        tracing::info!(
            "Delivered {:?} for {}",
            response.status,
            response.logical_resource_id
        );
        Ok(())
    }
}
