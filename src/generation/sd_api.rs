use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{GenerationError, Result},
    generation::{GenerationRequest, ImageGenerator},
    imaging::{self, ImageKind},
};

/// Path of the img2img route on AUTOMATIC1111-compatible servers
pub const IMG2IMG_PATH: &str = "/sdapi/v1/img2img";

/// Client for a Stable Diffusion web API exposing `/sdapi/v1/img2img`
///
/// The server owns the loaded checkpoint; this side only ships the
/// normalized image, the optional mask and the sampling parameters.
pub struct StableDiffusionApi {
    client: Client,
    endpoint: String,
    model: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Img2ImgPayload {
    pub init_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    pub prompt: String,
    pub negative_prompt: String,
    pub denoising_strength: f32,
    pub cfg_scale: f32,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub batch_size: u32,
    pub n_iter: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_settings: Option<OverrideSettings>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OverrideSettings {
    pub sd_model_checkpoint: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Img2ImgResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

impl StableDiffusionApi {
    /// Create a client for the server at `base_url`
    ///
    /// `model` overrides the server's active checkpoint per request; `timeout`
    /// bounds the whole HTTP exchange (no limit when `None`).
    pub fn new(base_url: &str, model: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| GenerationError::RequestFailed {
            reason: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), IMG2IMG_PATH),
            model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn build_payload(&self, request: &GenerationRequest) -> Result<Img2ImgPayload> {
        let (width, height) = request.image.dimensions();
        let init_image = encode_base64_png(&DynamicImage::ImageRgb8(request.image.clone()))?;
        let mask = request
            .mask
            .as_ref()
            .map(|mask| encode_base64_png(&DynamicImage::ImageLuma8(mask.clone())))
            .transpose()?;

        Ok(Img2ImgPayload {
            init_images: vec![init_image],
            mask,
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            denoising_strength: request.strength,
            cfg_scale: request.guidance_scale,
            steps: request.steps,
            width,
            height,
            batch_size: 1,
            n_iter: 1,
            override_settings: self.model.clone().map(|sd_model_checkpoint| OverrideSettings {
                sd_model_checkpoint,
            }),
        })
    }
}

#[async_trait]
impl ImageGenerator for StableDiffusionApi {
    fn name(&self) -> &str {
        "sdapi"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage> {
        let payload = self.build_payload(request)?;
        let start = Instant::now();

        debug!("POST {} (strength {:.2}, cfg {:.1}, {} steps, mask: {})",
               self.endpoint, payload.denoising_strength, payload.cfg_scale,
               payload.steps, payload.mask.is_some());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::BackendStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body: Img2ImgResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        let image = first_image(body)?;
        info!("Backend produced {}x{} image in {:.1}s",
              image.width(), image.height(), start.elapsed().as_secs_f32());

        Ok(image)
    }
}

fn encode_base64_png(image: &DynamicImage) -> Result<String> {
    let bytes = imaging::encode(image, ImageKind::Png)?;
    Ok(STANDARD.encode(bytes))
}

/// Decode the first image of a backend response
pub(crate) fn first_image(response: Img2ImgResponse) -> Result<DynamicImage> {
    let encoded = response
        .images
        .into_iter()
        .next()
        .ok_or(GenerationError::EmptyResponse)?;

    // Some forks return data URLs instead of bare base64
    let encoded = match encoded.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data.to_string(),
        _ => encoded,
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| GenerationError::InvalidResponse {
            reason: format!("invalid base64 image: {}", e),
        })?;

    imaging::decode_generated(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StylizerError;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn request(mask: Option<GrayImage>) -> GenerationRequest {
        GenerationRequest {
            prompt: "pop art style".to_string(),
            negative_prompt: "realism".to_string(),
            image: RgbImage::from_pixel(16, 16, Rgb([10, 20, 30])),
            mask,
            strength: 0.6,
            guidance_scale: 7.5,
            steps: 60,
        }
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let api = StableDiffusionApi::new("http://gpu-box:7860/", None, None).unwrap();
        assert_eq!(api.endpoint(), "http://gpu-box:7860/sdapi/v1/img2img");
    }

    #[test]
    fn test_payload_fields() {
        let api = StableDiffusionApi::new("http://localhost:7860", None, None).unwrap();
        let payload = api.build_payload(&request(None)).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["prompt"], "pop art style");
        assert_eq!(json["negative_prompt"], "realism");
        assert_eq!(json["steps"], 60);
        assert_eq!(json["width"], 16);
        assert_eq!(json["height"], 16);
        assert!((json["denoising_strength"].as_f64().unwrap() - 0.6).abs() < 1e-6);
        assert!((json["cfg_scale"].as_f64().unwrap() - 7.5).abs() < 1e-6);
        assert!(json.get("mask").is_none());
        assert!(json.get("override_settings").is_none());

        let init = STANDARD
            .decode(json["init_images"][0].as_str().unwrap())
            .unwrap();
        let decoded = image::load_from_memory(&init).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(3, 3), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_payload_with_mask_and_model() {
        let api = StableDiffusionApi::new(
            "http://localhost:7860",
            Some("sd_xl_base_1.0.safetensors".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        let mask = GrayImage::from_pixel(16, 16, Luma([255]));
        let payload = api.build_payload(&request(Some(mask))).unwrap();

        let mask_bytes = STANDARD.decode(payload.mask.unwrap()).unwrap();
        let mask = image::load_from_memory(&mask_bytes).unwrap().to_luma8();
        assert_eq!(mask.get_pixel(0, 0), &Luma([255]));

        assert_eq!(
            payload.override_settings.unwrap().sd_model_checkpoint,
            "sd_xl_base_1.0.safetensors"
        );
    }

    #[test]
    fn test_first_image_decodes() {
        let png = imaging::encode(
            &DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 7, Rgb([1, 2, 3]))),
            ImageKind::Png,
        )
        .unwrap();
        let response: Img2ImgResponse = serde_json::from_value(serde_json::json!({
            "images": [STANDARD.encode(&png), "ignored"],
            "info": "{}"
        }))
        .unwrap();

        let image = first_image(response).unwrap();
        assert_eq!((image.width(), image.height()), (5, 7));
    }

    #[test]
    fn test_first_image_accepts_data_url() {
        let png = imaging::encode(
            &DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([7]))),
            ImageKind::Png,
        )
        .unwrap();
        let response = Img2ImgResponse {
            images: vec![format!("data:image/png;base64,{}", STANDARD.encode(&png))],
        };

        assert!(first_image(response).is_ok());
    }

    #[test]
    fn test_first_image_errors() {
        let empty = Img2ImgResponse { images: vec![] };
        assert!(matches!(
            first_image(empty),
            Err(StylizerError::Generation(GenerationError::EmptyResponse))
        ));

        let garbage = Img2ImgResponse {
            images: vec!["%%%not-base64%%%".to_string()],
        };
        assert!(matches!(
            first_image(garbage),
            Err(StylizerError::Generation(GenerationError::InvalidResponse { .. }))
        ));
    }
}
