use std::io::{Cursor, Write as _};

use base64::Engine as _;
use zip::write::SimpleFileOptions;

use crate::error::{CarrosselError, CarrosselResult};
use crate::model::{Carousel, GenerationResult, Language};
use crate::orchestrate::BackgroundSet;
use crate::raster::{BackgroundImage, SlideRasterizer, decode_background};

/// File name of the serialized [`GenerationResult`] offered next to the
/// archives.
pub const DATA_JSON_NAME: &str = "carrossel_data.json";

pub fn slide_filename(order: u32) -> String {
    format!("slide_{order}.png")
}

pub fn archive_name(carousel_id: &str) -> String {
    format!("{carousel_id}.zip")
}

/// One packed carousel ready for download.
#[derive(Clone, Debug)]
pub struct ExportedArchive {
    /// Deterministic download name, `<carouselId>.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Orders of slides that made it into the archive.
    pub exported: Vec<u32>,
    /// Orders of slides whose rasterization failed and were skipped.
    pub skipped: Vec<u32>,
}

/// Render every slide of a carousel and pack the PNGs into one zip archive.
///
/// Slides are processed strictly in ascending order, one canvas and one
/// decode alive at a time. Best-effort semantics: a background that fails to
/// decode degrades to the palette background for that slide only, and a
/// slide that fails to rasterize is skipped while its siblings proceed. Only
/// archive packing itself (or every slide failing) fails the whole export.
pub fn export_carousel(
    rasterizer: &mut SlideRasterizer,
    carousel: &Carousel,
    language: Language,
    backgrounds: Option<&BackgroundSet>,
) -> CarrosselResult<ExportedArchive> {
    carousel.validate()?;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut exported = Vec::new();
    let mut skipped = Vec::new();

    for slide in carousel.slides_in_order() {
        let background = backgrounds
            .and_then(|set| set.image_for(slide.order))
            .and_then(|uri| decode_background_uri(slide.order, uri));

        let png = match rasterizer.rasterize(slide, carousel, language, background.as_ref()) {
            Ok(png) => png,
            Err(err) => {
                tracing::warn!(
                    carousel = %carousel.id,
                    order = slide.order,
                    error = %err,
                    "slide rasterization failed; skipping"
                );
                skipped.push(slide.order);
                continue;
            }
        };

        writer
            .start_file(slide_filename(slide.order), options)
            .map_err(|e| CarrosselError::export(format!("add archive entry: {e}")))?;
        writer
            .write_all(&png)
            .map_err(|e| CarrosselError::export(format!("write archive entry: {e}")))?;
        exported.push(slide.order);
    }

    if exported.is_empty() {
        return Err(CarrosselError::export(format!(
            "no slide of carousel '{}' could be rendered",
            carousel.id
        )));
    }

    let cursor = writer
        .finish()
        .map_err(|e| CarrosselError::export(format!("finalize archive: {e}")))?;

    Ok(ExportedArchive {
        file_name: archive_name(&carousel.id),
        bytes: cursor.into_inner(),
        exported,
        skipped,
    })
}

/// Serialize the full generation result verbatim for the optional
/// standalone JSON download.
pub fn export_result_json(result: &GenerationResult) -> CarrosselResult<Vec<u8>> {
    serde_json::to_vec_pretty(result)
        .map_err(|e| CarrosselError::serde(format!("serialize generation result: {e}")))
}

fn decode_background_uri(order: u32, uri: &str) -> Option<BackgroundImage> {
    match data_uri_bytes(uri).and_then(|bytes| decode_background(&bytes)) {
        Ok(bg) => Some(bg),
        Err(err) => {
            tracing::warn!(
                order,
                error = %err,
                "background decode failed; falling back to palette background"
            );
            None
        }
    }
}

/// Extract the binary payload of a `data:*;base64,` URI.
fn data_uri_bytes(uri: &str) -> CarrosselResult<Vec<u8>> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| CarrosselError::export("not a base64 data URI"))?;

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| CarrosselError::export(format!("decode data URI: {e}")))
}
