use std::collections::BTreeMap;

use futures::future::join_all;

use crate::generate::GenerationService;
use crate::model::Carousel;
use crate::style::is_photographic;

/// Generated background references for one carousel, keyed by slide order.
///
/// An entry exists only for slides that requested a photo background and got
/// a non-null result. The owning carousel id travels with the map so stale
/// batches can be rejected at apply-time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundSet {
    carousel_id: String,
    images: BTreeMap<u32, String>,
}

impl BackgroundSet {
    pub fn empty(carousel_id: impl Into<String>) -> Self {
        Self {
            carousel_id: carousel_id.into(),
            images: BTreeMap::new(),
        }
    }

    pub fn carousel_id(&self) -> &str {
        &self.carousel_id
    }

    /// Record a successful generation for a slide order.
    pub fn insert(&mut self, order: u32, uri: impl Into<String>) {
        self.images.insert(order, uri.into());
    }

    pub fn image_for(&self, order: u32) -> Option<&str> {
        self.images.get(&order).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn orders(&self) -> impl Iterator<Item = u32> + '_ {
        self.images.keys().copied()
    }
}

/// Fetch background images for every slide of a photographic carousel.
///
/// One `generate_image` request per slide, issued concurrently and awaited
/// as one batch. Results are attributed by slide order, never by completion
/// order. Null results leave their slide absent from the map; nothing is
/// retried. Non-photographic styles issue no requests at all.
pub async fn load_backgrounds<S: GenerationService>(
    service: &S,
    carousel: &Carousel,
) -> BackgroundSet {
    let mut set = BackgroundSet::empty(carousel.id.clone());
    if !is_photographic(carousel.background_style_token.as_deref()) {
        return set;
    }

    let requests: Vec<(u32, String)> = carousel
        .slides_in_order()
        .iter()
        .map(|slide| (slide.order, slide.image_prompt.clone()))
        .collect();

    tracing::debug!(
        carousel = %carousel.id,
        slides = requests.len(),
        "fetching photographic backgrounds"
    );

    let results = join_all(
        requests
            .iter()
            .map(|(order, prompt)| async move { (*order, service.generate_image(prompt).await) }),
    )
    .await;

    for (order, uri) in results {
        if let Some(uri) = uri {
            set.insert(order, uri);
        }
    }
    set
}

/// Tracks the active carousel's background map and loading state for UI
/// consumption.
///
/// The map is mutated only by applying a completed batch; renderers read
/// from a snapshot. A batch started for a carousel that is no longer active
/// is discarded when applied.
#[derive(Debug, Default)]
pub struct ImageOrchestrator {
    active_id: Option<String>,
    loading: bool,
    backgrounds: Option<BackgroundSet>,
}

impl ImageOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `carousel` as the active one.
    ///
    /// Returns true when the identity changed and the style is photographic,
    /// meaning the caller should start a [`load_backgrounds`] batch. Loading
    /// is flagged until that batch applies.
    pub fn set_active(&mut self, carousel: &Carousel) -> bool {
        if self.active_id.as_deref() == Some(carousel.id.as_str()) {
            return false;
        }
        self.active_id = Some(carousel.id.clone());
        self.backgrounds = None;
        if is_photographic(carousel.background_style_token.as_deref()) {
            self.loading = true;
            true
        } else {
            self.loading = false;
            false
        }
    }

    /// Apply a completed batch. Stale batches (for a carousel that is no
    /// longer active) are discarded and do not touch the map or the loading
    /// flag of the current carousel.
    pub fn apply(&mut self, set: BackgroundSet) -> bool {
        if self.active_id.as_deref() != Some(set.carousel_id()) {
            tracing::debug!(
                batch = set.carousel_id(),
                active = self.active_id.as_deref().unwrap_or("<none>"),
                "discarding stale background batch"
            );
            return false;
        }
        self.backgrounds = Some(set);
        self.loading = false;
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Snapshot of the active carousel's backgrounds, once loaded.
    pub fn backgrounds(&self) -> Option<&BackgroundSet> {
        self.backgrounds.as_ref()
    }
}
