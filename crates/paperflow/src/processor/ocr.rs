use std::io::Cursor;
use std::sync::{Mutex, MutexGuard};

use image::GrayImage;
use leptess::{LepTess, Variable};

use crate::config::OcrConfig;
use crate::error::RecognitionError;

/// Character recognition over a single, ideally pre-binarized, page image.
pub trait RecognitionEngine {
    fn recognize(
        &self,
        image: &GrayImage,
        language: &str,
        whitelist: &str,
    ) -> Result<String, RecognitionError>;

    /// Releases any loaded model. The next call re-initializes it.
    fn shutdown(&self) {}
}

/// Tesseract through leptess. The model is loaded on first use and kept
/// for the rest of the process (re-loaded only if the language changes).
pub struct TesseractEngine {
    tessdata: Option<String>,
    dpi: u32,
    page_seg_mode: u32,
    handle: Mutex<Option<LoadedModel>>,
}

struct LoadedModel {
    language: String,
    api: LepTess,
}

impl TesseractEngine {
    pub fn new(tessdata: Option<String>, dpi: u32, page_seg_mode: u32) -> Self {
        Self {
            tessdata,
            dpi,
            page_seg_mode,
            handle: Mutex::new(None),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.tessdata.clone(), config.dpi, config.page_seg_mode)
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_model().is_some()
    }

    /// A panic inside Tesseract poisons the lock while the model may be
    /// half-way through a page. The model is dropped so the next call
    /// loads a fresh one.
    fn lock_model(&self) -> MutexGuard<'_, Option<LoadedModel>> {
        self.handle.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recognition engine recovered after a panic, discarding model");
            let mut guard = poisoned.into_inner();
            *guard = None;
            self.handle.clear_poison();
            guard
        })
    }

    fn load(&self, language: &str) -> Result<LoadedModel, RecognitionError> {
        let _span = tracing::info_span!("ocr.load_model", language).entered();

        let mut api = LepTess::new(self.tessdata.as_deref(), language).map_err(|e| {
            RecognitionError::EngineUnavailable(format!("Failed to initialize Tesseract: {}", e))
        })?;
        api.set_variable(Variable::TesseditPagesegMode, &self.page_seg_mode.to_string())
            .map_err(|e| {
                RecognitionError::EngineUnavailable(format!("Failed to set page mode: {}", e))
            })?;

        tracing::info!(language, "Recognition model loaded");
        Ok(LoadedModel {
            language: language.to_string(),
            api,
        })
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &GrayImage,
        language: &str,
        whitelist: &str,
    ) -> Result<String, RecognitionError> {
        let _span = tracing::info_span!("processor.ocr").entered();

        let mut png_data = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| RecognitionError::Failed(format!("Failed to encode image: {}", e)))?;

        let mut guard = self.lock_model();

        let reload = !matches!(guard.as_ref(), Some(model) if model.language == language);
        if reload {
            *guard = Some(self.load(language)?);
        }
        let Some(model) = guard.as_mut() else {
            return Err(RecognitionError::EngineUnavailable(
                "Model not loaded".to_string(),
            ));
        };

        model
            .api
            .set_variable(Variable::TesseditCharWhitelist, whitelist)
            .map_err(|e| RecognitionError::Failed(format!("Failed to set whitelist: {}", e)))?;

        model
            .api
            .set_image_from_mem(&png_data)
            .map_err(|e| RecognitionError::Failed(format!("Failed to set image: {}", e)))?;
        model.api.set_source_resolution(self.dpi as i32);

        model
            .api
            .get_utf8_text()
            .map_err(|e| RecognitionError::Failed(format!("OCR failed: {}", e)))
    }

    fn shutdown(&self) {
        if self.lock_model().take().is_some() {
            tracing::debug!("Recognition model released");
        }
    }
}
