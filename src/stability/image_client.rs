use crate::{
    config::StabilityConfig,
    error::{Result, StabilityError},
    logger,
    models::{non_blank, Credential, GenerationRequest, ImageResult, RefinementRequest},
    stability::{
        cancel::{run_cancellable, CancelHandle},
        error_detail::{compose_message, extract_detail},
    },
};
use hyper::ext::ReasonPhrase;
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION},
    multipart::{Form, Part},
    Client, Response,
};
use std::sync::Arc;
use uuid::Uuid;

const GENERATE_PATH: &str = "generate/sd3";
const REFINE_PATH: &str = "image-to-image";
const GENERATE_MODEL: &str = "sd3";
const REFINE_MODE: &str = "image-to-image";
const OUTPUT_FORMAT: &str = "png";
const ACCEPT_PNG: &str = "image/png";

const STYLE_PRESETS: &[&str] = &[
    "3d-model",
    "analog-film",
    "anime",
    "cinematic",
    "comic-book",
    "digital-art",
    "enhance",
    "fantasy-art",
    "isometric",
    "line-art",
    "low-poly",
    "modeling-compound",
    "neon-punk",
    "origami",
    "photographic",
    "pixel-art",
    "tile-texture",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Generate,
    Refine,
}

impl Operation {
    fn path(self) -> &'static str {
        match self {
            Operation::Generate => GENERATE_PATH,
            Operation::Refine => REFINE_PATH,
        }
    }

    fn error_prefix(self) -> &'static str {
        match self {
            Operation::Generate => "Stability AI Error",
            Operation::Refine => "Stability AI Image Refinement Error",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Operation::Generate => "generate",
            Operation::Refine => "refine",
        }
    }
}

#[derive(Clone)]
pub struct ImageClient {
    http: Client,
    config: Arc<StabilityConfig>,
}

impl ImageClient {
    pub fn new(http: Client, config: Arc<StabilityConfig>) -> Self {
        Self { http, config }
    }

    /// Style presets accepted by the provider's `style_preset` field.
    pub fn supported_style_presets() -> &'static [&'static str] {
        STYLE_PRESETS
    }

    /// Text-to-image. Returns the provider's PNG bytes untouched.
    pub async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
        cancel: Option<&CancelHandle>,
    ) -> Result<ImageResult> {
        let request_id = new_request_id();
        let auth = authorization(credential, Operation::Generate, &request_id)?;

        log::info!(
            "[req:{}] Generating image (style: {}, aspect ratio: {})",
            request_id,
            request.style_preset,
            request.aspect_ratio
        );
        log::debug!("[req:{}] Generation request: {:?}", request_id, request);

        let form = generation_form(request);
        self.execute(Operation::Generate, auth, form, cancel, &request_id)
            .await
    }

    /// Image-to-image. Unlike `generate`, no model identifier is sent.
    pub async fn refine(
        &self,
        credential: &Credential,
        request: &RefinementRequest,
        cancel: Option<&CancelHandle>,
    ) -> Result<ImageResult> {
        let request_id = new_request_id();
        let auth = authorization(credential, Operation::Refine, &request_id)?;

        log::info!(
            "[req:{}] Refining image ({} bytes, strength: {})",
            request_id,
            request.init_image.len(),
            request.strength
        );
        log::debug!("[req:{}] Refinement request: {:?}", request_id, request);

        let form = refinement_form(request).map_err(|e| {
            log::error!("[req:{}] {}", request_id, e);
            e
        })?;
        self.execute(Operation::Refine, auth, form, cancel, &request_id)
            .await
    }

    async fn execute(
        &self,
        operation: Operation,
        auth: HeaderValue,
        form: Form,
        cancel: Option<&CancelHandle>,
        request_id: &str,
    ) -> Result<ImageResult> {
        let _timer = logger::timer(&format!("[req:{}] {}", request_id, operation.label()));

        let result = run_cancellable(cancel, self.send(operation, auth, form)).await;

        match &result {
            Ok(image) => log::info!(
                "[req:{}] {} succeeded ({} bytes)",
                request_id,
                operation.label(),
                image.len()
            ),
            Err(StabilityError::Cancelled) => {
                log::debug!("[req:{}] {} cancelled by caller", request_id, operation.label())
            }
            Err(e) => log::error!("[req:{}] {}", request_id, e),
        }

        result
    }

    async fn send(&self, operation: Operation, auth: HeaderValue, form: Form) -> Result<ImageResult> {
        let url = self.config.endpoint(operation.path());

        let response = self
            .http
            .post(&url)
            .header(ACCEPT, ACCEPT_PNG)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StabilityError::TransportError(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status_text(&response);
            // An unreadable body only costs the detail, never the failure kind.
            let body = response.text().await.ok();
            let detail = body.as_deref().and_then(extract_detail);
            let message = compose_message(
                operation.error_prefix(),
                status.as_u16(),
                &reason,
                detail.as_deref(),
            );
            return Err(StabilityError::provider(
                message,
                status.as_u16(),
                body.as_deref(),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            StabilityError::TransportError(format!("failed to read image body: {}", e))
        })?;

        Ok(ImageResult::new(bytes.to_vec()))
    }
}

/// Reason phrase the provider actually sent. hyper only records it when it
/// differs from the canonical one, and HTTP/2 has none at all.
fn status_text(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string(),
    }
}

fn new_request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn authorization(
    credential: &Credential,
    operation: Operation,
    request_id: &str,
) -> Result<HeaderValue> {
    let error = |message: &str| {
        log::error!(
            "[req:{}] {} rejected: {}",
            request_id,
            operation.label(),
            message
        );
        StabilityError::ConfigError(message.to_string())
    };

    if credential.is_blank() {
        return Err(error("API Key is required"));
    }

    let mut value = HeaderValue::from_str(&credential.bearer())
        .map_err(|_| error("API Key contains characters not allowed in a header"))?;
    value.set_sensitive(true);
    Ok(value)
}

fn generation_form(request: &GenerationRequest) -> Form {
    let form = Form::new()
        .text("prompt", request.prompt.clone())
        .text("aspect_ratio", request.aspect_ratio.clone())
        .text("model", GENERATE_MODEL)
        .text("style_preset", request.style_preset.clone())
        .text("output_format", OUTPUT_FORMAT);

    match non_blank(request.negative_prompt.as_deref()) {
        Some(negative) => form.text("negative_prompt", negative.to_string()),
        None => form,
    }
}

fn refinement_form(request: &RefinementRequest) -> Result<Form> {
    let mut image = Part::bytes(request.init_image.clone()).file_name("init_image");
    if let Some(kind) = infer::get(&request.init_image) {
        image = image.mime_str(kind.mime_type()).map_err(|e| {
            StabilityError::ConfigError(format!("invalid init_image content type: {}", e))
        })?;
    }

    let mut form = Form::new()
        .part("init_image", image)
        .text("prompt", request.prompt.clone());
    if let Some(negative) = non_blank(request.negative_prompt.as_deref()) {
        form = form.text("negative_prompt", negative.to_string());
    }

    Ok(form
        .text("mode", REFINE_MODE)
        .text("strength", request.strength.to_string())
        .text("output_format", OUTPUT_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_paths_and_prefixes() {
        assert_eq!(Operation::Generate.path(), "generate/sd3");
        assert_eq!(Operation::Refine.path(), "image-to-image");
        assert_eq!(Operation::Generate.error_prefix(), "Stability AI Error");
        assert_eq!(
            Operation::Refine.error_prefix(),
            "Stability AI Image Refinement Error"
        );
    }

    #[test]
    fn test_blank_credential_is_config_error() {
        let err = authorization(&Credential::new("  "), Operation::Generate, "t").unwrap_err();
        assert!(matches!(err, StabilityError::ConfigError(ref m) if m == "API Key is required"));
    }

    #[test]
    fn test_header_is_bearer_and_sensitive() {
        let value = authorization(&Credential::new("sk-1"), Operation::Refine, "t").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer sk-1");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_control_characters_rejected() {
        let err = authorization(&Credential::new("sk\n1"), Operation::Generate, "t").unwrap_err();
        assert!(matches!(err, StabilityError::ConfigError(_)));
    }

    #[test]
    fn test_request_ids_are_short_and_distinct() {
        let a = new_request_id();
        let b = new_request_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_style_presets_include_photographic() {
        assert!(ImageClient::supported_style_presets().contains(&"photographic"));
    }
}
