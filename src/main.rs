use rstability::{
    logger::{self, LoggerConfig},
    CancelHandle, GenerationRequest, ImageClient, RefinementRequest, StabilityClient,
    StabilityConfig,
};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // RSTABILITY_LOG=production switches to JSON lines appended to a file.
    logger::init_with_config(LoggerConfig::from_env())?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let config = StabilityConfig::from_env();
    logger::log_config_info(&config);

    let client = StabilityClient::new(config)?;
    let credential = match client.default_credential() {
        Some(credential) => credential,
        None => {
            log::error!("❌ STABILITY_API_KEY is not set");
            return Err("STABILITY_API_KEY is required".into());
        }
    };

    log::info!("🎨 Available style presets:");
    for preset in ImageClient::supported_style_presets() {
        log::info!("  {}", preset);
    }

    let prompt = env::args()
        .nth(1)
        .unwrap_or_else(|| "A serene landscape with mountains and a lake at sunset".to_string());
    let style = env::var("STABILITY_STYLE_PRESET").unwrap_or_else(|_| "digital-art".to_string());
    let mut request = GenerationRequest::new(prompt, style);
    if let Ok(aspect_ratio) = env::var("STABILITY_ASPECT_RATIO") {
        request = request.with_aspect_ratio(aspect_ratio);
    }
    if let Ok(negative) = env::var("STABILITY_NEGATIVE_PROMPT") {
        request = request.with_negative_prompt(negative);
    }

    // Ctrl-C abandons whatever call is in flight.
    let cancel = CancelHandle::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("⚠️  Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });
    if let Some(secs) = env::var("STABILITY_DEADLINE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        cancel.cancel_after(Duration::from_secs(secs));
    }

    let image = client
        .image()
        .generate(&credential, &request, Some(&cancel))
        .await?;

    let filename = format!("generated_{}.png", chrono::Utc::now().timestamp());
    image.save(&filename).await?;
    log::info!("💾 Image saved to: {} ({} bytes)", filename, image.len());

    if let Ok(refine_prompt) = env::var("STABILITY_REFINE_PROMPT") {
        let strength = env::var("STABILITY_REFINE_STRENGTH")
            .ok()
            .and_then(|s| s.parse::<f32>().ok());
        let mut refinement = RefinementRequest::new(image.into_bytes(), refine_prompt);
        if let Some(strength) = strength {
            refinement = refinement.with_strength(strength);
        }

        let refined = client
            .image()
            .refine(&credential, &refinement, Some(&cancel))
            .await?;
        let refined_name = filename.replace(".png", "_refined.png");
        refined.save(&refined_name).await?;
        log::info!("💾 Refined image saved to: {}", refined_name);
    }

    Ok(())
}
