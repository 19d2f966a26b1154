//! Async client for the Stability AI image generation API.
//!
//! ```no_run
//! use rstability::{CancelHandle, Credential, GenerationRequest, StabilityClient, StabilityConfig};
//!
//! # async fn run() -> rstability::Result<()> {
//! let client = StabilityClient::new(StabilityConfig::from_env())?;
//! let credential = Credential::new("sk-...");
//! let request = GenerationRequest::new("a lighthouse on a cliff", "photographic");
//! let cancel = CancelHandle::new();
//!
//! let image = client.image().generate(&credential, &request, Some(&cancel)).await?;
//! image.save("lighthouse.png").await.ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod stability;

pub use config::StabilityConfig;
pub use error::{Result, StabilityError};
pub use models::{Credential, GenerationRequest, ImageResult, RefinementRequest};
pub use stability::{CancelHandle, ImageClient, ImageGeneration, StabilityClient};
