pub type CarrosselResult<T> = Result<T, CarrosselError>;

#[derive(thiserror::Error, Debug)]
pub enum CarrosselError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CarrosselError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_constructors_keep_their_domain_prefix() {
        assert_eq!(
            CarrosselError::render("font missing").to_string(),
            "render error: font missing"
        );
        assert_eq!(
            CarrosselError::serde("bad json").to_string(),
            "serialization error: bad json"
        );
        for err in [
            CarrosselError::validation("m"),
            CarrosselError::generation("m"),
            CarrosselError::export("m"),
        ] {
            assert!(err.to_string().ends_with(": m"), "{err}");
        }
    }

    #[test]
    fn anyhow_converts_transparently() {
        fn fails() -> CarrosselResult<()> {
            Err(anyhow::anyhow!("upstream gave up"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        // No extra prefix layered on top of the wrapped message.
        assert_eq!(err.to_string(), "upstream gave up");
        assert!(matches!(err, CarrosselError::Other(_)));
    }
}
