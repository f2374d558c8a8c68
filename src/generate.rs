use std::future::Future;

use crate::error::CarrosselResult;
use crate::model::{CarouselDefaults, GenerationResult, Language, PhraseRow};

/// Structured parameters for an AI-authored generation run.
#[derive(Clone, Debug)]
pub struct GenerationBrief {
    pub niche: String,
    pub context: Option<String>,
    pub carousel_count: u32,
    pub slides_per_carousel: u32,
    pub language: Language,
    pub style: CarouselDefaults,
}

/// Boundary to the generative text/image collaborator.
///
/// Implementations are expected to be slow and failure-prone network
/// clients; the core only depends on this contract, so tests substitute a
/// fake. Constructed and passed explicitly, never a module-level singleton.
pub trait GenerationService {
    /// Author a full carousel set from a brief.
    fn generate_from_brief(
        &self,
        brief: &GenerationBrief,
    ) -> impl Future<Output = CarrosselResult<GenerationResult>> + Send;

    /// Shape user-supplied phrase rows into a carousel set.
    fn generate_from_phrase_rows(
        &self,
        rows: &[PhraseRow],
        defaults: &CarouselDefaults,
    ) -> impl Future<Output = CarrosselResult<GenerationResult>> + Send;

    /// Generate one background image for a prompt, returned as a data URI.
    ///
    /// Never errors; a failed or refused generation is `None` and the slide
    /// falls back to its palette background.
    fn generate_image(&self, prompt: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Run a brief generation and enforce schema conformance.
///
/// A malformed reply surfaces as one error for the whole attempt; no partial
/// carousel set is returned.
pub async fn generate_validated<S: GenerationService>(
    service: &S,
    brief: &GenerationBrief,
) -> CarrosselResult<GenerationResult> {
    let result = service.generate_from_brief(brief).await?;
    result.validate()?;
    Ok(result)
}

/// Run a phrase-row generation and enforce schema conformance.
pub async fn generate_from_rows_validated<S: GenerationService>(
    service: &S,
    rows: &[PhraseRow],
    defaults: &CarouselDefaults,
) -> CarrosselResult<GenerationResult> {
    let result = service.generate_from_phrase_rows(rows, defaults).await?;
    result.validate()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarrosselError;
    use crate::model::{Carousel, GenerationMode, Slide, SlideKind};

    struct FixedService {
        result: GenerationResult,
    }

    impl GenerationService for FixedService {
        async fn generate_from_brief(
            &self,
            _brief: &GenerationBrief,
        ) -> CarrosselResult<GenerationResult> {
            Ok(self.result.clone())
        }

        async fn generate_from_phrase_rows(
            &self,
            _rows: &[PhraseRow],
            _defaults: &CarouselDefaults,
        ) -> CarrosselResult<GenerationResult> {
            Err(CarrosselError::generation("not used in this test"))
        }

        async fn generate_image(&self, _prompt: &str) -> Option<String> {
            None
        }
    }

    fn brief() -> GenerationBrief {
        GenerationBrief {
            niche: "fitness".to_string(),
            context: None,
            carousel_count: 1,
            slides_per_carousel: 1,
            language: Language::En,
            style: CarouselDefaults::default(),
        }
    }

    fn result_with_slide_order(order: u32) -> GenerationResult {
        GenerationResult {
            mode: GenerationMode::AiAuthored,
            language: Language::En,
            carousels: vec![Carousel {
                id: "c1".to_string(),
                niche: None,
                context: None,
                background_style_token: None,
                color_palette_token: None,
                typography_token: None,
                cta_on_last_slide: None,
                slides: vec![Slide {
                    order,
                    kind: SlideKind::Cover,
                    text: "hi".to_string(),
                    layout_notes: String::new(),
                    image_prompt: String::new(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn conformant_reply_passes_through() {
        let service = FixedService {
            result: result_with_slide_order(1),
        };
        let result = generate_validated(&service, &brief()).await.unwrap();
        assert_eq!(result.carousels.len(), 1);
    }

    #[tokio::test]
    async fn malformed_reply_is_one_top_level_error() {
        let service = FixedService {
            result: result_with_slide_order(0),
        };
        let err = generate_validated(&service, &brief()).await.unwrap_err();
        assert!(err.to_string().contains("validation error:"));
    }
}
