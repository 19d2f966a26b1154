pub mod cancel;
pub mod error_detail;
pub mod image_client;

use crate::{
    config::StabilityConfig,
    error::{Result, StabilityError},
    models::{Credential, GenerationRequest, ImageResult, RefinementRequest},
};
use async_trait::async_trait;
use std::sync::Arc;

pub use cancel::CancelHandle;
pub use image_client::ImageClient;

/// Image generation as seen by callers, so a fake can stand in for the
/// provider in tests of the surrounding application.
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
        cancel: Option<&CancelHandle>,
    ) -> Result<ImageResult>;

    async fn refine(
        &self,
        credential: &Credential,
        request: &RefinementRequest,
        cancel: Option<&CancelHandle>,
    ) -> Result<ImageResult>;
}

#[async_trait]
impl ImageGeneration for ImageClient {
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
        cancel: Option<&CancelHandle>,
    ) -> Result<ImageResult> {
        ImageClient::generate(self, credential, request, cancel).await
    }

    async fn refine(
        &self,
        credential: &Credential,
        request: &RefinementRequest,
        cancel: Option<&CancelHandle>,
    ) -> Result<ImageResult> {
        ImageClient::refine(self, credential, request, cancel).await
    }
}

/// Entry point owning the shared HTTP transport. Cheap to clone; clones
/// share the connection pool.
#[derive(Clone)]
pub struct StabilityClient {
    config: Arc<StabilityConfig>,
    image_client: ImageClient,
}

impl StabilityClient {
    pub fn new(config: StabilityConfig) -> Result<Self> {
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            StabilityError::ConfigError(format!("invalid base URL {}: {}", config.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                StabilityError::ConfigError(format!("failed to build HTTP client: {}", e))
            })?;

        log::debug!("Stability client ready for {}", config.base_url);

        let config = Arc::new(config);
        Ok(Self {
            image_client: ImageClient::new(http, config.clone()),
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(StabilityConfig::from_env())
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// The key configured through `STABILITY_API_KEY` or `with_api_key`, if any.
    pub fn default_credential(&self) -> Option<Credential> {
        self.config.api_key.as_deref().map(Credential::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = StabilityClient::new(StabilityConfig::new().with_base_url("not a url"));
        assert!(matches!(result, Err(StabilityError::ConfigError(_))));
    }

    #[test]
    fn test_default_credential() {
        let client = StabilityClient::new(StabilityConfig::new().with_api_key("sk-abc")).unwrap();
        assert_eq!(
            client.default_credential().map(|c| c.expose().to_string()),
            Some("sk-abc".to_string())
        );

        let anonymous = StabilityClient::new(StabilityConfig::new()).unwrap();
        assert!(anonymous.default_credential().is_none());
    }

    #[test]
    fn test_client_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<StabilityClient>();
        assert_send_sync::<ImageClient>();
    }
}
