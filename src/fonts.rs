use std::path::Path;
use std::sync::Arc;

use crate::error::{CarrosselError, CarrosselResult};
use crate::style::ResolvedTypography;

/// Font lookup over a `fontdb` database (system fonts plus optional
/// user-supplied directories).
///
/// Resolution prefers the requested family at the requested weight, then any
/// sans-serif face, then any face at all, so a slide renders with *some*
/// deterministic face whenever the machine has fonts. Only a fontless
/// database makes resolution fail.
pub struct FontCatalog {
    db: fontdb::Database,
}

impl FontCatalog {
    /// Catalog backed by the system font directories.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self { db }
    }

    /// Catalog with no faces. Useful for exercising fallback paths.
    pub fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
        }
    }

    /// Add every font file found under `dir` (recursively).
    pub fn load_fonts_dir(&mut self, dir: &Path) {
        self.db.load_fonts_dir(dir);
    }

    pub fn is_empty(&self) -> bool {
        self.db.len() == 0
    }

    /// Resolve a typography triple to raw font bytes.
    pub fn resolve(&self, typography: &ResolvedTypography) -> CarrosselResult<Arc<Vec<u8>>> {
        let weight = fontdb::Weight(typography.weight);

        let preferred = fontdb::Query {
            families: &[
                fontdb::Family::Name(&typography.family),
                fontdb::Family::SansSerif,
            ],
            weight,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };

        let id = self
            .db
            .query(&preferred)
            .or_else(|| self.db.faces().map(|face| face.id).next())
            .ok_or_else(|| {
                CarrosselError::render(format!(
                    "no font available for family '{}' (font database is empty)",
                    typography.family
                ))
            })?;

        let bytes = self
            .db
            .with_face_data(id, |data, _index| data.to_vec())
            .ok_or_else(|| CarrosselError::render("font face data could not be loaded"))?;

        if bytes.is_empty() {
            return Err(CarrosselError::render("font face data is empty"));
        }
        Ok(Arc::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Language;
    use crate::style::resolve_typography;

    #[test]
    fn empty_catalog_fails_to_resolve() {
        let catalog = FontCatalog::empty();
        let typography = resolve_typography(None, Language::En);
        assert!(catalog.resolve(&typography).is_err());
    }

    #[test]
    fn system_catalog_resolves_any_typography() {
        let catalog = FontCatalog::system();
        if catalog.is_empty() {
            eprintln!("no system fonts installed; skipping");
            return;
        }
        let typography = resolve_typography(Some("Elegante (serifada)"), Language::Pt);
        let bytes = catalog.resolve(&typography).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn resolution_is_deterministic() {
        let catalog = FontCatalog::system();
        if catalog.is_empty() {
            eprintln!("no system fonts installed; skipping");
            return;
        }
        let typography = resolve_typography(None, Language::En);
        let a = catalog.resolve(&typography).unwrap();
        let b = catalog.resolve(&typography).unwrap();
        assert_eq!(a, b);
    }
}
