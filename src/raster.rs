use std::collections::HashMap;
use std::io::Cursor;

use image::ImageEncoder as _;

use crate::error::{CarrosselError, CarrosselResult};
use crate::fonts::FontCatalog;
use crate::layout::{RegisteredFont, TextBrush, TextShaper, line_centers, try_wrap_lines};
use crate::model::{Carousel, Language, Slide, SlideKind};
use crate::style::{self, BackgroundPaint, Rgba8};

/// Output edge length in pixels; preview and export must agree on this.
pub const CANVAS_SIZE: u32 = 1080;

/// Text wraps inside 85% of the canvas width.
const WRAP_WIDTH: f32 = CANVAS_SIZE as f32 * 0.85;

/// Coarse pre-shrink slack against the wrap target. Tunable visual-fit
/// parameter; verify by eye when changing.
const PRESHRINK_SLACK: f32 = 2.5;

const COVER_BASE_FONT_PX: f32 = 72.0;
const BODY_BASE_FONT_PX: f32 = 56.0;
const FONT_STEP_PX: f32 = 4.0;
const MIN_FONT_PX: f32 = 28.0;
const LINE_HEIGHT_FACTOR: f32 = 1.25;

/// Fixed darkening layer over photo backgrounds so text stays legible.
const PHOTO_OVERLAY: Rgba8 = [0, 0, 0, 115];

/// Decoded background photo in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct BackgroundImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

/// Decode an encoded image (PNG/JPEG/...) into a premultiplied background.
pub fn decode_background(bytes: &[u8]) -> CarrosselResult<BackgroundImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| CarrosselError::render(format!("decode background image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CarrosselError::render("background image has zero area"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(BackgroundImage {
        width,
        height,
        rgba8_premul,
    })
}

/// A font resolved and registered once, shared by every measure, layout,
/// and draw call that needs it.
#[derive(Clone)]
struct LoadedFont {
    registered: RegisteredFont,
    draw_font: vello_cpu::peniko::FontData,
}

/// Renders slides to fixed-size PNG bitmaps.
///
/// Stateless between calls apart from font/shaping caches; identical inputs
/// produce byte-identical PNGs.
pub struct SlideRasterizer {
    fonts: FontCatalog,
    shaper: TextShaper,
    loaded: HashMap<(String, u16), LoadedFont>,
}

impl SlideRasterizer {
    pub fn new(fonts: FontCatalog) -> Self {
        Self {
            fonts,
            shaper: TextShaper::new(),
            loaded: HashMap::new(),
        }
    }

    /// Resolve and register the font for a typography triple, once per
    /// family/weight pair for the lifetime of the rasterizer.
    fn load_font(&mut self, typography: &style::ResolvedTypography) -> CarrosselResult<LoadedFont> {
        let key = (typography.family.clone(), typography.weight);
        if let Some(font) = self.loaded.get(&key) {
            return Ok(font.clone());
        }

        let bytes = self.fonts.resolve(typography)?;
        let registered = self.shaper.register_font(&bytes)?;
        let draw_font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );

        let font = LoadedFont {
            registered,
            draw_font,
        };
        self.loaded.insert(key, font.clone());
        Ok(font)
    }

    /// Rasterize one slide to PNG bytes.
    ///
    /// A failure here is fatal for this slide only; callers export the
    /// remaining slides.
    pub fn rasterize(
        &mut self,
        slide: &Slide,
        carousel: &Carousel,
        language: Language,
        background: Option<&BackgroundImage>,
    ) -> CarrosselResult<Vec<u8>> {
        let palette = style::resolve_palette(carousel.color_palette_token.as_deref());
        let typography =
            style::resolve_typography(carousel.typography_token.as_deref(), language);

        let side = CANVAS_SIZE as usize;
        let mut pixels = vec![0u8; side * side * 4];
        match background {
            Some(bg) => {
                blit_cover(&mut pixels, CANVAS_SIZE, bg);
                overlay_in_place(&mut pixels, PHOTO_OVERLAY);
            }
            None => paint_background(&mut pixels, CANVAS_SIZE, palette.background),
        }

        let text = typography.case.apply(slide.text.trim());
        if !text.is_empty() {
            let font = self.load_font(&typography)?;

            let mut font_size = match slide.kind {
                SlideKind::Cover => COVER_BASE_FONT_PX,
                SlideKind::Content | SlideKind::CallToAction => BODY_BASE_FONT_PX,
            };

            // Coarse pre-shrink on the unwrapped width; exact fitting is the
            // wrap pass below.
            let mut unwrapped = self.shaper.measure_line(&text, &font.registered, font_size)?;
            while font_size > MIN_FONT_PX && unwrapped > WRAP_WIDTH * PRESHRINK_SLACK {
                font_size = (font_size - FONT_STEP_PX).max(MIN_FONT_PX);
                unwrapped = self.shaper.measure_line(&text, &font.registered, font_size)?;
            }

            let shaper = &mut self.shaper;
            let registered = &font.registered;
            let mut measure = |s: &str| shaper.measure_line(s, registered, font_size);
            let lines = try_wrap_lines(&text, WRAP_WIDTH, &mut measure)?;

            let line_height = font_size * LINE_HEIGHT_FACTOR;
            let centers = line_centers(CANVAS_SIZE as f32 / 2.0, lines.len(), line_height);

            let brush = TextBrush {
                r: palette.text_color[0],
                g: palette.text_color[1],
                b: palette.text_color[2],
                a: palette.text_color[3],
            };

            draw_text_lines(
                &mut pixels,
                &mut self.shaper,
                &lines,
                &centers,
                &font,
                font_size,
                brush,
            )?;
        }

        encode_png(&pixels, CANVAS_SIZE)
    }
}

fn draw_text_lines(
    pixels: &mut [u8],
    shaper: &mut TextShaper,
    lines: &[String],
    centers: &[f32],
    font: &LoadedFont,
    font_size: f32,
    brush: TextBrush,
) -> CarrosselResult<()> {
    let side: u16 = CANVAS_SIZE
        .try_into()
        .map_err(|_| CarrosselError::render("canvas size exceeds u16"))?;

    let mut pixmap = vello_cpu::Pixmap::new(side, side);
    pixmap.data_as_u8_slice_mut().copy_from_slice(pixels);

    let mut ctx = vello_cpu::RenderContext::new(side, side);
    for (line, center_y) in lines.iter().zip(centers) {
        let layout = shaper.layout_line(line, &font.registered, font_size, brush)?;
        let offset_x = (CANVAS_SIZE as f32 - layout.width()) / 2.0;
        let offset_y = center_y - layout.height() / 2.0;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(offset_x),
            f64::from(offset_y),
        )));

        for layout_line in layout.lines() {
            for item in layout_line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let b = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font.draw_font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    pixels.copy_from_slice(pixmap.data_as_u8_slice());
    Ok(())
}

fn paint_background(pixels: &mut [u8], size: u32, paint: BackgroundPaint) {
    match paint {
        BackgroundPaint::Solid(color) => {
            let px = premul_rgba8(color);
            for out in pixels.chunks_exact_mut(4) {
                out.copy_from_slice(&px);
            }
        }
        BackgroundPaint::LinearGradient { start, end } => {
            // 45-degree equivalent: blend factor follows x+y across the
            // canvas diagonal.
            let max = (2 * (size - 1)) as f32;
            for y in 0..size {
                for x in 0..size {
                    let t = if max > 0.0 { (x + y) as f32 / max } else { 0.0 };
                    let px = premul_rgba8(lerp_rgba8(start, end, t));
                    let i = ((y * size + x) * 4) as usize;
                    pixels[i..i + 4].copy_from_slice(&px);
                }
            }
        }
    }
}

/// Center-crop scale ("cover") blit of the background into the square
/// canvas, nearest-neighbor sampled.
fn blit_cover(pixels: &mut [u8], size: u32, bg: &BackgroundImage) {
    let scale = f32::max(
        size as f32 / bg.width as f32,
        size as f32 / bg.height as f32,
    );
    let crop_x = (bg.width as f32 - size as f32 / scale) / 2.0;
    let crop_y = (bg.height as f32 - size as f32 / scale) / 2.0;

    for y in 0..size {
        for x in 0..size {
            let src_x = ((x as f32 + 0.5) / scale + crop_x) as u32;
            let src_y = ((y as f32 + 0.5) / scale + crop_y) as u32;
            let src_x = src_x.min(bg.width - 1);
            let src_y = src_y.min(bg.height - 1);
            let src_i = ((src_y * bg.width + src_x) * 4) as usize;
            let dst_i = ((y * size + x) * 4) as usize;
            pixels[dst_i..dst_i + 4].copy_from_slice(&bg.rgba8_premul[src_i..src_i + 4]);
        }
    }
}

/// Composite a constant premultiplied color over every pixel.
fn overlay_in_place(pixels: &mut [u8], overlay: Rgba8) {
    let src = premul_rgba8(overlay);
    let inv = 255u16 - u16::from(src[3]);
    for px in pixels.chunks_exact_mut(4) {
        for i in 0..4 {
            px[i] = src[i].saturating_add(mul_div255(u16::from(px[i]), inv));
        }
    }
}

fn premul_rgba8(color: Rgba8) -> [u8; 4] {
    let a = u16::from(color[3]);
    if a == 255 {
        return color;
    }
    [
        mul_div255(u16::from(color[0]), a),
        mul_div255(u16::from(color[1]), a),
        mul_div255(u16::from(color[2]), a),
        color[3],
    ]
}

fn lerp_rgba8(a: Rgba8, b: Rgba8, t: f32) -> Rgba8 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| -> u8 {
        (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8
    };
    [
        mix(a[0], b[0]),
        mix(a[1], b[1]),
        mix(a[2], b[2]),
        mix(a[3], b[3]),
    ]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        px[0] = mul_div255(u16::from(px[0]), a);
        px[1] = mul_div255(u16::from(px[1]), a);
        px[2] = mul_div255(u16::from(px[2]), a);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn encode_png(pixels: &[u8], size: u32) -> CarrosselResult<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(Cursor::new(&mut out));
    encoder
        .write_image(pixels, size, size, image::ExtendedColorType::Rgba8)
        .map_err(|e| CarrosselError::render(format!("encode png: {e}")))?;
    Ok(out)
}
