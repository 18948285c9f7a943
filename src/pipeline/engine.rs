use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use tracing::{debug, info, warn};

use crate::{
    config::GenerationConfig,
    error::{Result, StylizerError, UploadError},
    generation::{GenerationRequest, ImageGenerator},
    imaging::{self, ImageKind},
    pipeline::{GeneratedArtifact, Upload, DEFAULT_STYLE},
    storage::{self, ArtifactStore, GENERATED_ROUTE},
    styles::{Style, StyleRegistry},
};

/// Orchestrates one upload through the style transfer pipeline
///
/// The pipeline is linear:
/// 1. Validation - file present, allowed extension, usable filename
/// 2. Normalization - decode, convert to RGB, resize to the working square
/// 3. Style resolution - registry preset or custom prompt fallback
/// 4. Generation - optional face mask, one img2img call on the backend
/// 5. Post-processing - grayscale for manga, passthrough otherwise
/// 6. Persistence - `generated_<style>_<filename>` plus its public URL
pub struct TransformEngine {
    registry: StyleRegistry,
    generator: Arc<dyn ImageGenerator>,
    store: ArtifactStore,
    working_size: u32,
    steps: u32,
}

impl TransformEngine {
    /// Create an engine around a shared generator handle
    pub fn new(generator: Arc<dyn ImageGenerator>, store: ArtifactStore, settings: &GenerationConfig) -> Self {
        Self {
            registry: StyleRegistry::new(),
            generator,
            store,
            working_size: settings.working_size,
            steps: settings.steps,
        }
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn working_size(&self) -> u32 {
        self.working_size
    }

    /// Run a full upload request and persist the result
    ///
    /// `base_url` is the externally visible origin used to build the
    /// artifact URL.
    pub async fn process_upload(&self, upload: Upload, base_url: &str) -> Result<GeneratedArtifact> {
        let Upload { filename, bytes, style, custom_prompt } = upload;
        let style_name = style.as_deref().unwrap_or(DEFAULT_STYLE);

        // Step 1: Validation
        let original_name = filename.as_deref().ok_or(UploadError::MissingFile)?;
        let (filename, kind) = validate_filename(original_name)?;

        info!("🖼️  Upload '{}' ({} bytes), style '{}'", filename, bytes.len(), style_name);

        self.store.save_upload(&filename, &bytes).await?;

        // Step 2: Normalization
        let image = self.normalize(bytes).await?;

        // Step 3: Style resolution
        let style = self.registry.resolve(style_name, custom_prompt.as_deref())?;

        // Steps 4-5: Generation and post-processing
        let generated = self.stylize(image, &style).await.map_err(|e| {
            warn!("Generation for '{}' failed: {}", filename, e);
            e
        })?;

        // Step 6: Persistence
        let bytes = run_blocking(move || imaging::encode(&generated, kind)).await?;
        let file_name = storage::generated_name(style.name(), &filename);
        let path = self.store.save_generated(&file_name, &bytes).await?;
        let url = storage::public_url(base_url, GENERATED_ROUTE, &file_name);

        info!("✅ Stored {} ({} bytes)", file_name, bytes.len());

        Ok(GeneratedArtifact {
            style: style.name().to_string(),
            file_name,
            path,
            url,
        })
    }

    /// Decode raw upload bytes into the normalized working image
    pub async fn normalize(&self, bytes: Vec<u8>) -> Result<RgbImage> {
        let size = self.working_size;
        run_blocking(move || imaging::normalize(&bytes, size)).await
    }

    /// Generate and post-process a normalized image in the given style
    pub async fn stylize(&self, image: RgbImage, style: &Style) -> Result<DynamicImage> {
        let config = style.config();
        let (width, height) = image.dimensions();

        let mask = config
            .use_mask
            .then(|| imaging::face_mask(width, height));

        debug!("Style '{}': strength {:.2}, guidance {:.1}, mask {}, custom {}",
               style.name(), config.strength, config.guidance_scale,
               mask.is_some(), style.is_custom());

        let request = GenerationRequest {
            prompt: config.prompt,
            negative_prompt: config.negative_prompt,
            image,
            mask,
            strength: config.strength,
            guidance_scale: config.guidance_scale,
            steps: self.steps,
        };

        info!("🎨 Generating '{}' rendition with {} ({} steps)",
              style.name(), self.generator.name(), self.steps);
        let generated = self.generator.generate(&request).await?;

        let post_process = style.post_process();
        run_blocking(move || Ok(imaging::apply_post_process(generated, post_process))).await
    }
}

/// Check the client filename and derive the stored name and output format
fn validate_filename(original: &str) -> Result<(String, ImageKind)> {
    let disallowed = || UploadError::DisallowedType {
        filename: original.to_string(),
    };

    if !storage::is_allowed_file(original) {
        return Err(disallowed().into());
    }

    let kind = ImageKind::from_filename(original).ok_or_else(disallowed)?;
    let filename = storage::secure_filename(original);
    if filename.is_empty() {
        return Err(disallowed().into());
    }

    Ok((filename, kind))
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StylizerError::generic(format!("image task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, StyleError};
    use async_trait::async_trait;
    use image::{ColorType, GenericImageView, Rgb};
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Records every request and answers with an RGBA copy of the input
    #[derive(Default)]
    struct RecordingGenerator {
        requests: Mutex<Vec<GenerationRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageGenerator for RecordingGenerator {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<DynamicImage> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(GenerationError::BackendStatus {
                    status: 500,
                    body: "CUDA out of memory".to_string(),
                }
                .into());
            }

            let rgba = DynamicImage::ImageRgb8(request.image.clone()).to_rgba8();
            Ok(DynamicImage::ImageRgba8(rgba))
        }
    }

    fn engine(generator: Arc<RecordingGenerator>) -> (TransformEngine, TempDir) {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::open(dir.path().join("uploads"), dir.path().join("generated")).unwrap();
        let settings = GenerationConfig {
            working_size: 32,
            ..GenerationConfig::default()
        };
        (TransformEngine::new(generator, store, &settings), dir)
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
        imaging::encode(&DynamicImage::ImageRgb8(image), ImageKind::Png).unwrap()
    }

    #[tokio::test]
    async fn test_anime_upload_uses_mask() {
        let generator = Arc::new(RecordingGenerator::default());
        let (engine, _dir) = engine(generator.clone());

        let upload = Upload::new("Me Selfie.png", png_bytes(40, 20));
        let artifact = engine.process_upload(upload, "http://localhost:5000").await.unwrap();

        assert_eq!(artifact.style, "anime");
        assert_eq!(artifact.file_name, "generated_anime_Me_Selfie.png");
        assert_eq!(artifact.url, "http://localhost:5000/static/generated/generated_anime_Me_Selfie.png");
        assert!(artifact.path.is_file());
        assert!(engine.store().upload_dir().join("Me_Selfie.png").is_file());

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.image.dimensions(), (32, 32));
        assert_eq!(request.steps, 60);
        assert_eq!(request.strength, 0.55);
        assert_eq!(request.guidance_scale, 7.5);

        let mask = request.mask.as_ref().expect("anime is mask-guided");
        assert_eq!(mask.dimensions(), (32, 32));
        assert_eq!(mask.get_pixel(8, 6)[0], 255);
        assert_eq!(mask.get_pixel(7, 6)[0], 0);
        assert_eq!(mask.get_pixel(8, 5)[0], 0);
    }

    #[tokio::test]
    async fn test_manga_output_is_grayscale() {
        let generator = Arc::new(RecordingGenerator::default());
        let (engine, _dir) = engine(generator.clone());

        let upload = Upload::new("portrait.jpg", png_bytes(16, 16)).with_style("MANGA");
        let artifact = engine.process_upload(upload, "http://h").await.unwrap();

        assert_eq!(artifact.file_name, "generated_manga_portrait.jpg");
        let stored = image::open(&artifact.path).unwrap();
        assert_eq!(stored.color(), ColorType::L8);
        assert_eq!(stored.dimensions(), (32, 32));

        assert!(generator.requests.lock().unwrap()[0].mask.is_none());
    }

    #[tokio::test]
    async fn test_stylize_passthrough_keeps_generator_mode() {
        let generator = Arc::new(RecordingGenerator::default());
        let (engine, _dir) = engine(generator);

        let style = engine.registry().resolve("popart", None).unwrap();
        let output = engine.stylize(RgbImage::new(8, 8), &style).await.unwrap();
        assert_eq!(output.color(), ColorType::Rgba8);

        let manga = engine.registry().resolve("manga", None).unwrap();
        let output = engine.stylize(RgbImage::new(8, 8), &manga).await.unwrap();
        assert_eq!(output.color(), ColorType::L8);
    }

    #[tokio::test]
    async fn test_custom_prompt_request() {
        let generator = Arc::new(RecordingGenerator::default());
        let (engine, _dir) = engine(generator.clone());

        let upload = Upload::new("cat.jpeg", png_bytes(8, 8))
            .with_style("Vaporwave")
            .with_custom_prompt("  vaporwave sunset cat ");
        let artifact = engine.process_upload(upload, "http://h").await.unwrap();
        assert_eq!(artifact.file_name, "generated_vaporwave_cat.jpeg");

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests[0].prompt, "vaporwave sunset cat");
        assert_eq!(requests[0].negative_prompt, "");
        assert_eq!(requests[0].strength, 0.6);
        assert_eq!(requests[0].guidance_scale, 7.5);
        assert!(requests[0].mask.is_none());
    }

    #[tokio::test]
    async fn test_rejections_skip_generation() {
        let generator = Arc::new(RecordingGenerator::default());
        let (engine, _dir) = engine(generator.clone());

        let missing = Upload::default();
        assert!(matches!(
            engine.process_upload(missing, "http://h").await,
            Err(StylizerError::Upload(UploadError::MissingFile))
        ));

        let gif = Upload::new("anim.gif", png_bytes(8, 8));
        assert!(matches!(
            engine.process_upload(gif, "http://h").await,
            Err(StylizerError::Upload(UploadError::DisallowedType { .. }))
        ));

        let no_extension = Upload::new("selfie", png_bytes(8, 8));
        assert!(matches!(
            engine.process_upload(no_extension, "http://h").await,
            Err(StylizerError::Upload(UploadError::DisallowedType { .. }))
        ));

        let unknown = Upload::new("me.png", png_bytes(8, 8))
            .with_style("cubism")
            .with_custom_prompt("   ");
        match engine.process_upload(unknown, "http://h").await {
            Err(StylizerError::Style(StyleError::Unknown { name })) => assert_eq!(name, "cubism"),
            other => panic!("expected unknown style, got {other:?}"),
        }

        let corrupt = Upload::new("broken.png", b"not a png".to_vec());
        assert!(matches!(
            engine.process_upload(corrupt, "http://h").await,
            Err(StylizerError::Upload(UploadError::DecodeFailed { .. }))
        ));

        assert!(generator.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_no_artifact() {
        let generator = Arc::new(RecordingGenerator {
            fail: true,
            ..Default::default()
        });
        let (engine, _dir) = engine(generator);

        let upload = Upload::new("me.png", png_bytes(8, 8)).with_style("real");
        let result = engine.process_upload(upload, "http://h").await;
        assert!(matches!(result, Err(StylizerError::Generation(_))));

        // The upload itself is kept
        assert!(engine.store().upload_dir().join("me.png").is_file());
        assert!(!engine.store().generated_dir().join("generated_real_me.png").exists());
    }
}
