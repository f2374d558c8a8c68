use crate::error::{CarrosselError, CarrosselResult};

/// RGBA8 brush color carried through Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Greedy word wrap against a caller-supplied width measure.
///
/// Words accumulate into the current line while the measured width stays
/// within `max_width`; the word that would overflow starts the next line. A
/// single word wider than `max_width` is committed as its own overflowing
/// line, never split. Identical inputs always produce identical breaks, so
/// preview and export rendering agree.
pub fn wrap_lines(
    text: &str,
    max_width: f32,
    measure: &mut impl FnMut(&str) -> f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// [`wrap_lines`] over a measure that can fail.
///
/// The wrap callback itself is infallible, so the first measure error is
/// parked and returned after the pass instead of silently degrading into an
/// arbitrary break.
pub fn try_wrap_lines(
    text: &str,
    max_width: f32,
    measure: &mut impl FnMut(&str) -> CarrosselResult<f32>,
) -> CarrosselResult<Vec<String>> {
    let mut first_err = None;
    let lines = wrap_lines(text, max_width, &mut |s| match measure(s) {
        Ok(width) => width,
        Err(err) => {
            first_err.get_or_insert(err);
            f32::INFINITY
        }
    });
    match first_err {
        Some(err) => Err(err),
        None => Ok(lines),
    }
}

/// Vertical centers for a block of `n` lines stacked around `center_y`.
pub fn line_centers(center_y: f32, n: usize, line_height: f32) -> Vec<f32> {
    (0..n)
        .map(|i| center_y + (i as f32 - (n as f32 - 1.0) / 2.0) * line_height)
        .collect()
}

/// Stateful helper for shaping single lines with Parley from raw font bytes.
///
/// Each shaped line is an unwrapped layout; line breaking is decided by
/// [`wrap_lines`] before shaping, so measurement and drawing share one code
/// path.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a font family registered with a [`TextShaper`].
///
/// Obtained once per font via [`TextShaper::register_font`]; every
/// measure/layout call then reuses the already-registered family instead of
/// feeding the font bytes into the font context again.
#[derive(Clone, Debug)]
pub struct RegisteredFont {
    family_name: String,
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register font bytes with the shaper's font context, once.
    ///
    /// The returned handle is the only way to shape text with this shaper;
    /// callers hold on to it for the lifetime of the font so the context
    /// never accumulates duplicate copies of the same font.
    pub fn register_font(&mut self, font_bytes: &[u8]) -> CarrosselResult<RegisteredFont> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CarrosselError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CarrosselError::validation("registered font family has no name"))?
            .to_string();

        Ok(RegisteredFont { family_name })
    }

    /// Shape one line of text using a registered font.
    pub fn layout_line(
        &mut self,
        text: &str,
        font: &RegisteredFont,
        size_px: f32,
        brush: TextBrush,
    ) -> CarrosselResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CarrosselError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(
                font.family_name.clone(),
            )),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Measured width in pixels of one unwrapped line.
    pub fn measure_line(
        &mut self,
        text: &str,
        font: &RegisteredFont,
        size_px: f32,
    ) -> CarrosselResult<f32> {
        Ok(self
            .layout_line(text, font, size_px, TextBrush::default())?
            .width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10px per char keeps expected breaks easy to read.
    fn char_measure(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn wrap_breaks_greedily() {
        let lines = wrap_lines("aaa bbb ccc ddd", 70.0, &mut char_measure);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn wrap_empty_text_produces_no_lines() {
        assert!(wrap_lines("", 100.0, &mut char_measure).is_empty());
        assert!(wrap_lines("   ", 100.0, &mut char_measure).is_empty());
    }

    #[test]
    fn overlong_word_is_committed_unsplit() {
        let lines = wrap_lines("hi extraordinarily ok", 50.0, &mut char_measure);
        assert_eq!(lines, vec!["hi", "extraordinarily", "ok"]);
    }

    #[test]
    fn wrap_is_idempotent_on_its_own_output() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        let lines = wrap_lines(text, 120.0, &mut char_measure);
        for line in &lines {
            let rewrapped = wrap_lines(line, 120.0, &mut char_measure);
            assert_eq!(rewrapped, vec![line.clone()]);
        }
    }

    #[test]
    fn wrap_collapses_runs_of_whitespace() {
        let lines = wrap_lines("a   b\tc", 1000.0, &mut char_measure);
        assert_eq!(lines, vec!["a b c"]);
    }

    #[test]
    fn try_wrap_surfaces_the_first_measure_error() {
        let mut calls = 0usize;
        let mut measure = |s: &str| {
            calls += 1;
            if s.contains("bad") {
                Err(CarrosselError::render("glyph coverage missing"))
            } else {
                Ok(char_measure(s))
            }
        };
        let err = try_wrap_lines("aaa bad ccc", 70.0, &mut measure).unwrap_err();
        assert!(err.to_string().contains("glyph coverage missing"));
        // The pass still runs to completion instead of aborting mid-word.
        assert!(calls > 1);
    }

    #[test]
    fn try_wrap_matches_wrap_when_measure_succeeds() {
        let mut measure = |s: &str| Ok(char_measure(s));
        let lines = try_wrap_lines("aaa bbb ccc ddd", 70.0, &mut measure).unwrap();
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn register_rejects_non_font_bytes() {
        let mut shaper = TextShaper::new();
        assert!(shaper.register_font(b"definitely not a font").is_err());
    }

    #[test]
    fn line_centers_stack_around_anchor() {
        let centers = line_centers(500.0, 3, 100.0);
        assert_eq!(centers, vec![400.0, 500.0, 600.0]);

        let centers = line_centers(500.0, 2, 100.0);
        assert_eq!(centers, vec![450.0, 550.0]);

        let centers = line_centers(500.0, 1, 100.0);
        assert_eq!(centers, vec![500.0]);
    }
}
