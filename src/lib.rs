#![forbid(unsafe_code)]

//! Carousel slide rendering and export.
//!
//! Turns structured carousel/slide records into deterministic 1080x1080 PNG
//! slides (dynamic font fitting, greedy word wrap, palette or photo
//! backgrounds) and packs each carousel into a downloadable zip archive.
//! The generative text/image collaborator is reached only through the
//! [`GenerationService`] trait.

pub mod error;
pub mod export;
pub mod fonts;
pub mod generate;
pub mod layout;
pub mod model;
pub mod orchestrate;
pub mod raster;
pub mod style;

pub use error::{CarrosselError, CarrosselResult};
pub use export::{DATA_JSON_NAME, ExportedArchive, export_carousel, export_result_json};
pub use fonts::FontCatalog;
pub use generate::{GenerationBrief, GenerationService, generate_from_rows_validated, generate_validated};
pub use model::{
    Carousel, CarouselDefaults, GenerationMode, GenerationResult, Language, PhraseRow, Slide,
    SlideKind, group_phrase_rows,
};
pub use orchestrate::{BackgroundSet, ImageOrchestrator, load_backgrounds};
pub use raster::{BackgroundImage, CANVAS_SIZE, SlideRasterizer, decode_background};
pub use style::{
    BackgroundPaint, ResolvedPalette, ResolvedTypography, TextCase, is_photographic,
    resolve_palette, resolve_typography,
};
