use crate::model::Language;

/// Straight (non-premultiplied) RGBA8 color.
pub type Rgba8 = [u8; 4];

/// Concrete background fill derived from a palette token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundPaint {
    Solid(Rgba8),
    /// Two-stop gradient spanning the canvas diagonal (top-left to
    /// bottom-right).
    LinearGradient { start: Rgba8, end: Rgba8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedPalette {
    pub background: BackgroundPaint,
    pub text_color: Rgba8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextCase {
    None,
    Upper,
}

impl TextCase {
    pub fn apply(self, text: &str) -> String {
        match self {
            TextCase::None => text.to_string(),
            TextCase::Upper => text.to_uppercase(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTypography {
    pub family: String,
    /// CSS-style numeric weight (400 regular, 700 bold, ...).
    pub weight: u16,
    pub case: TextCase,
}

const DEFAULT_FAMILY: &str = "Inter";
const DEFAULT_WEIGHT: u16 = 600;

const SANS_FAMILY: &str = "Montserrat";
const SERIF_FAMILY: &str = "Playfair Display";
const DISPLAY_FAMILY: &str = "Archivo Black";

const DARK_BG: Rgba8 = [16, 16, 20, 255];
const DARK_TEXT: Rgba8 = [245, 245, 245, 255];
const VIBRANT_START: Rgba8 = [255, 81, 47, 255];
const VIBRANT_END: Rgba8 = [221, 36, 118, 255];
const NEUTRAL_BG: Rgba8 = [237, 234, 228, 255];
const NEUTRAL_TEXT: Rgba8 = [31, 31, 31, 255];
const LIGHT_BG: Rgba8 = [250, 250, 250, 255];
const LIGHT_TEXT: Rgba8 = [24, 24, 27, 255];
const WHITE: Rgba8 = [255, 255, 255, 255];

/// Fixed per-language typography catalog, keyed by the display names the
/// generation prompt offers. Unknown tokens are normal input and resolve to
/// the default triple.
fn typography_catalog(language: Language) -> &'static [(&'static str, &'static str, u16, TextCase)]
{
    match language {
        Language::Pt => &[
            ("Moderna (sem serifa)", SANS_FAMILY, 700, TextCase::None),
            ("Elegante (serifada)", SERIF_FAMILY, 600, TextCase::None),
            ("Impactante (caixa alta)", DISPLAY_FAMILY, 400, TextCase::Upper),
        ],
        Language::En => &[
            ("Modern (sans serif)", SANS_FAMILY, 700, TextCase::None),
            ("Elegant (serif)", SERIF_FAMILY, 600, TextCase::None),
            ("Bold (uppercase)", DISPLAY_FAMILY, 400, TextCase::Upper),
        ],
        Language::Es => &[
            ("Moderna (sin serifas)", SANS_FAMILY, 700, TextCase::None),
            ("Elegante (con serifas)", SERIF_FAMILY, 600, TextCase::None),
            (
                "Impactante (mayúsculas)",
                DISPLAY_FAMILY,
                400,
                TextCase::Upper,
            ),
        ],
    }
}

/// Map a typography token to a concrete family/weight/case triple.
///
/// Exact catalog identity wins; free-form AI-returned tokens fall through to
/// substring classification; anything unrecognized gets the default. This
/// never fails.
pub fn resolve_typography(token: Option<&str>, language: Language) -> ResolvedTypography {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return default_typography();
    };

    for (name, family, weight, case) in typography_catalog(language) {
        if *name == token {
            return ResolvedTypography {
                family: (*family).to_string(),
                weight: *weight,
                case: *case,
            };
        }
    }

    // Legacy fallback for free-form tokens.
    let lower = token.to_lowercase();
    let case = if has_uppercase_marker(&lower) {
        TextCase::Upper
    } else {
        TextCase::None
    };
    if lower.contains("elegan") || is_serif_marker(&lower) {
        return ResolvedTypography {
            family: SERIF_FAMILY.to_string(),
            weight: 600,
            case,
        };
    }
    if lower.contains("impact") || lower.contains("bold") {
        return ResolvedTypography {
            family: DISPLAY_FAMILY.to_string(),
            weight: 400,
            case,
        };
    }
    if lower.contains("modern") {
        return ResolvedTypography {
            family: SANS_FAMILY.to_string(),
            weight: 700,
            case,
        };
    }

    let mut typography = default_typography();
    typography.case = case;
    typography
}

fn default_typography() -> ResolvedTypography {
    ResolvedTypography {
        family: DEFAULT_FAMILY.to_string(),
        weight: DEFAULT_WEIGHT,
        case: TextCase::None,
    }
}

fn has_uppercase_marker(lower: &str) -> bool {
    lower.contains("uppercase") || lower.contains("caixa alta") || lower.contains("mayúscula")
        || lower.contains("mayuscula")
}

fn is_serif_marker(lower: &str) -> bool {
    // "serif" alone means the serif option unless negated by sans markers.
    lower.contains("serif")
        && !lower.contains("sans")
        && !lower.contains("sem serifa")
        && !lower.contains("sin serifa")
}

/// Map a palette token to background paint and text color.
///
/// Markers are matched in all supported languages; no match defaults to the
/// light palette. This never fails.
pub fn resolve_palette(token: Option<&str>) -> ResolvedPalette {
    let lower = token.map(|t| t.to_lowercase()).unwrap_or_default();

    if lower.contains("escur") || lower.contains("dark") || lower.contains("oscur") {
        return ResolvedPalette {
            background: BackgroundPaint::Solid(DARK_BG),
            text_color: DARK_TEXT,
        };
    }
    if lower.contains("vibrant") {
        return ResolvedPalette {
            background: BackgroundPaint::LinearGradient {
                start: VIBRANT_START,
                end: VIBRANT_END,
            },
            text_color: WHITE,
        };
    }
    if lower.contains("neutr") {
        return ResolvedPalette {
            background: BackgroundPaint::Solid(NEUTRAL_BG),
            text_color: NEUTRAL_TEXT,
        };
    }

    ResolvedPalette {
        background: BackgroundPaint::Solid(LIGHT_BG),
        text_color: LIGHT_TEXT,
    }
}

/// Whether a background style token asks for an AI-generated photo backdrop.
pub fn is_photographic(token: Option<&str>) -> bool {
    let Some(token) = token else {
        return false;
    };
    let lower = token.to_lowercase();
    lower.contains("foto") || lower.contains("photo")
}
