use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_STRENGTH: f32 = 0.65;

/// Text-to-image request. `prompt` is expected to be non-empty; the client
/// forwards it as-is and lets the provider reject empty prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub style_preset: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

fn default_aspect_ratio() -> String {
    DEFAULT_ASPECT_RATIO.to_string()
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, style_preset: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style_preset: style_preset.into(),
            aspect_ratio: default_aspect_ratio(),
            negative_prompt: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }
}

/// Image-to-image request. `strength` is meant to lie in (0, 1]; values
/// outside that range are sent unchanged and rejected by the provider.
#[derive(Clone, PartialEq)]
pub struct RefinementRequest {
    pub init_image: Vec<u8>,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub strength: f32,
}

impl RefinementRequest {
    pub fn new(init_image: impl Into<Vec<u8>>, prompt: impl Into<String>) -> Self {
        Self {
            init_image: init_image.into(),
            prompt: prompt.into(),
            negative_prompt: None,
            strength: DEFAULT_STRENGTH,
        }
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }
}

// Image bytes are elided so request logging stays readable.
impl std::fmt::Debug for RefinementRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinementRequest")
            .field("init_image", &format_args!("<{} bytes>", self.init_image.len()))
            .field("prompt", &self.prompt)
            .field("negative_prompt", &self.negative_prompt)
            .field("strength", &self.strength)
            .finish()
    }
}

/// Raw PNG payload exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    bytes: Vec<u8>,
}

impl ImageResult {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URL suitable for embedding in an `<img>` tag.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.bytes))
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.bytes).await
    }
}

impl AsRef<[u8]> for ImageResult {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults() {
        let request = GenerationRequest::new("a lighthouse", "photographic");
        assert_eq!(request.aspect_ratio, "16:9");
        assert!(request.negative_prompt.is_none());
    }

    #[test]
    fn test_generation_request_from_json_fills_defaults() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"prompt":"fox","style_preset":"anime"}"#).unwrap();
        assert_eq!(request.aspect_ratio, DEFAULT_ASPECT_RATIO);
        assert_eq!(request.negative_prompt, None);
    }

    #[test]
    fn test_refinement_defaults() {
        let request = RefinementRequest::new(vec![1u8, 2, 3], "sharper");
        assert_eq!(request.strength, DEFAULT_STRENGTH);
        assert_eq!(
            format!("{:?}", request),
            "RefinementRequest { init_image: <3 bytes>, prompt: \"sharper\", negative_prompt: None, strength: 0.65 }"
        );
    }

    #[test]
    fn test_data_url() {
        let image = ImageResult::new(vec![0x89, b'P', b'N', b'G']);
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw==");
        assert_eq!(image.len(), 4);
    }

    #[tokio::test]
    async fn test_save_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = ImageResult::new(vec![9u8, 8, 7, 6]);
        image.save(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![9u8, 8, 7, 6]);
    }
}
