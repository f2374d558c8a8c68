use std::collections::BTreeSet;

use crate::error::{CarrosselError, CarrosselResult};

/// One generated carousel set: the unit exported to JSON and driving export.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub mode: GenerationMode,
    pub language: Language,
    pub carousels: Vec<Carousel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationMode {
    AiAuthored,
    CsvSourced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pt,
    En,
    Es,
}

/// An ordered set of slides sharing one visual style, exported together.
///
/// Read-only after generation; style tokens are free-form strings resolved
/// on demand by the style resolver.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carousel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_style_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_palette_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_on_last_slide: Option<bool>,
    pub slides: Vec<Slide>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// 1-based position, unique within the carousel; defines display and
    /// export sequence.
    pub order: u32,
    pub kind: SlideKind,
    /// Display phrase drawn onto the slide.
    pub text: String,
    /// Free-form design guidance; descriptive only, never machine-enforced.
    #[serde(default)]
    pub layout_notes: String,
    /// Description fed to the image-generation collaborator.
    #[serde(default)]
    pub image_prompt: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlideKind {
    Cover,
    Content,
    CallToAction,
}

/// One already-parsed CSV row. CSV tokenization happens upstream; the core
/// only ever sees shaped rows.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PhraseRow {
    #[serde(rename = "carrossel_id")]
    pub carousel_id: String,
    #[serde(rename = "ordem_slide")]
    pub slide_order: u32,
    #[serde(rename = "frase")]
    pub phrase: String,
}

/// Style tokens applied to every carousel built from phrase rows.
#[derive(Clone, Debug, Default)]
pub struct CarouselDefaults {
    pub background_style_token: Option<String>,
    pub color_palette_token: Option<String>,
    pub typography_token: Option<String>,
    pub cta_on_last_slide: bool,
}

impl GenerationResult {
    /// Schema conformance check for generation-service replies.
    ///
    /// A violation fails the whole result; callers must not show a partial
    /// carousel set.
    pub fn validate(&self) -> CarrosselResult<()> {
        if self.carousels.is_empty() {
            return Err(CarrosselError::validation(
                "generation result must contain at least one carousel",
            ));
        }
        let mut seen_ids = BTreeSet::new();
        for carousel in &self.carousels {
            if !seen_ids.insert(carousel.id.as_str()) {
                return Err(CarrosselError::validation(format!(
                    "duplicate carousel id '{}'",
                    carousel.id
                )));
            }
            carousel.validate()?;
        }
        Ok(())
    }
}

impl Carousel {
    pub fn validate(&self) -> CarrosselResult<()> {
        if self.id.trim().is_empty() {
            return Err(CarrosselError::validation("carousel id must be non-empty"));
        }
        if self.slides.is_empty() {
            return Err(CarrosselError::validation(format!(
                "carousel '{}' must contain at least one slide",
                self.id
            )));
        }
        let mut seen_orders = BTreeSet::new();
        for slide in &self.slides {
            if slide.order == 0 {
                return Err(CarrosselError::validation(format!(
                    "carousel '{}' has a slide with order 0 (orders are 1-based)",
                    self.id
                )));
            }
            if !seen_orders.insert(slide.order) {
                return Err(CarrosselError::validation(format!(
                    "carousel '{}' has duplicate slide order {}",
                    self.id, slide.order
                )));
            }
        }
        Ok(())
    }

    /// Slides sorted by ascending `order`, independent of storage order.
    pub fn slides_in_order(&self) -> Vec<&Slide> {
        let mut slides: Vec<&Slide> = self.slides.iter().collect();
        slides.sort_by_key(|s| s.order);
        slides
    }
}

/// Group shaped CSV rows into carousels.
///
/// Carousels appear in first-seen row order; slides within each carousel are
/// sorted by `slide_order` regardless of input row order. The first slide
/// becomes the cover; the last becomes a call to action when the defaults ask
/// for one; everything else is content.
pub fn group_phrase_rows(rows: &[PhraseRow], defaults: &CarouselDefaults) -> Vec<Carousel> {
    let mut order_of_ids = Vec::new();
    for row in rows {
        if !order_of_ids.contains(&row.carousel_id) {
            order_of_ids.push(row.carousel_id.clone());
        }
    }

    order_of_ids
        .into_iter()
        .map(|id| {
            let mut rows_for: Vec<&PhraseRow> =
                rows.iter().filter(|r| r.carousel_id == id).collect();
            rows_for.sort_by_key(|r| r.slide_order);

            let last = rows_for.len().saturating_sub(1);
            let slides = rows_for
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    let kind = if i == 0 {
                        SlideKind::Cover
                    } else if i == last && defaults.cta_on_last_slide {
                        SlideKind::CallToAction
                    } else {
                        SlideKind::Content
                    };
                    Slide {
                        order: row.slide_order,
                        kind,
                        text: row.phrase.clone(),
                        layout_notes: String::new(),
                        image_prompt: String::new(),
                    }
                })
                .collect();

            Carousel {
                id,
                niche: None,
                context: None,
                background_style_token: defaults.background_style_token.clone(),
                color_palette_token: defaults.color_palette_token.clone(),
                typography_token: defaults.typography_token.clone(),
                cta_on_last_slide: Some(defaults.cta_on_last_slide),
                slides,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_result() -> GenerationResult {
        GenerationResult {
            mode: GenerationMode::AiAuthored,
            language: Language::Pt,
            carousels: vec![Carousel {
                id: "c1".to_string(),
                niche: Some("fitness".to_string()),
                context: None,
                background_style_token: Some("dark".to_string()),
                color_palette_token: Some("dark".to_string()),
                typography_token: None,
                cta_on_last_slide: Some(true),
                slides: vec![
                    Slide {
                        order: 1,
                        kind: SlideKind::Cover,
                        text: "Hello".to_string(),
                        layout_notes: String::new(),
                        image_prompt: String::new(),
                    },
                    Slide {
                        order: 2,
                        kind: SlideKind::CallToAction,
                        text: "Follow".to_string(),
                        layout_notes: String::new(),
                        image_prompt: String::new(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn json_roundtrip_uses_camel_case() {
        let result = basic_result();
        let s = serde_json::to_string_pretty(&result).unwrap();
        assert!(s.contains("\"aiAuthored\""));
        assert!(s.contains("\"callToAction\""));
        assert!(s.contains("\"backgroundStyleToken\""));
        let de: GenerationResult = serde_json::from_str(&s).unwrap();
        assert_eq!(de.carousels.len(), 1);
        assert_eq!(de.carousels[0].slides[1].order, 2);
    }

    #[test]
    fn validate_accepts_basic_result() {
        basic_result().validate().unwrap();
    }

    #[test]
    fn validate_rejects_duplicate_orders() {
        let mut result = basic_result();
        result.carousels[0].slides[1].order = 1;
        assert!(result.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_order() {
        let mut result = basic_result();
        result.carousels[0].slides[0].order = 0;
        assert!(result.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_carousel() {
        let mut result = basic_result();
        result.carousels[0].slides.clear();
        assert!(result.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_carousel_ids() {
        let mut result = basic_result();
        let dup = result.carousels[0].clone();
        result.carousels.push(dup);
        assert!(result.validate().is_err());
    }

    #[test]
    fn slides_in_order_sorts_by_order() {
        let mut result = basic_result();
        result.carousels[0].slides.reverse();
        let sorted = result.carousels[0].slides_in_order();
        assert_eq!(
            sorted.iter().map(|s| s.order).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn group_phrase_rows_sorts_rows_within_carousel() {
        let rows = vec![
            PhraseRow {
                carousel_id: "c1".to_string(),
                slide_order: 2,
                phrase: "B".to_string(),
            },
            PhraseRow {
                carousel_id: "c1".to_string(),
                slide_order: 1,
                phrase: "A".to_string(),
            },
        ];
        let carousels = group_phrase_rows(&rows, &CarouselDefaults::default());
        assert_eq!(carousels.len(), 1);
        let orders: Vec<u32> = carousels[0].slides.iter().map(|s| s.order).collect();
        let phrases: Vec<&str> = carousels[0]
            .slides
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(phrases, vec!["A", "B"]);
    }

    #[test]
    fn group_phrase_rows_assigns_kinds() {
        let rows: Vec<PhraseRow> = (1..=3)
            .map(|i| PhraseRow {
                carousel_id: "c1".to_string(),
                slide_order: i,
                phrase: format!("s{i}"),
            })
            .collect();
        let defaults = CarouselDefaults {
            cta_on_last_slide: true,
            ..CarouselDefaults::default()
        };
        let carousels = group_phrase_rows(&rows, &defaults);
        let kinds: Vec<SlideKind> = carousels[0].slides.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SlideKind::Cover, SlideKind::Content, SlideKind::CallToAction]
        );
    }

    #[test]
    fn group_phrase_rows_keeps_first_seen_carousel_order() {
        let rows = vec![
            PhraseRow {
                carousel_id: "b".to_string(),
                slide_order: 1,
                phrase: "x".to_string(),
            },
            PhraseRow {
                carousel_id: "a".to_string(),
                slide_order: 1,
                phrase: "y".to_string(),
            },
        ];
        let carousels = group_phrase_rows(&rows, &CarouselDefaults::default());
        let ids: Vec<&str> = carousels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn phrase_row_uses_portuguese_wire_names() {
        let row: PhraseRow =
            serde_json::from_str(r#"{"carrossel_id":"c1","ordem_slide":2,"frase":"B"}"#).unwrap();
        assert_eq!(row.carousel_id, "c1");
        assert_eq!(row.slide_order, 2);
        assert_eq!(row.phrase, "B");
    }
}
