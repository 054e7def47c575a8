use thiserror::Error;

/// Errors raised while building core data model values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fact context was not a flat map of scalars and scalar lists.
    #[error("invalid fact context: {0}")]
    InvalidFact(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = CoreError::InvalidFact("nested object under 'pillars'".into());
        assert_eq!(
            err.to_string(),
            "invalid fact context: nested object under 'pillars'"
        );
    }
}
