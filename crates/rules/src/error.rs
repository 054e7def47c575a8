use thiserror::Error;

/// Errors raised while compiling a stored rule into its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The condition tree has an unknown node kind or an invalid field reference.
    #[error("malformed condition at {path}: {reason}")]
    MalformedCondition {
        /// JSON path of the offending node (e.g. `$.all[1]`).
        path: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// The content block is not a valid static or dynamic payload.
    #[error("malformed content: {0}")]
    MalformedContent(String),

    /// Another enabled rule already uses the same code.
    #[error("duplicate rule code: {0}")]
    DuplicateCode(String),
}

impl RuleError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCondition {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving dynamic content through a query adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// No adapter is registered under the requested name.
    #[error("unknown adapter: {0}")]
    UnknownAdapter(String),

    /// The adapter does not implement the requested method.
    #[error("adapter '{adapter}' has no method '{method}'")]
    UnknownMethod {
        /// Adapter name.
        adapter: String,
        /// Requested method.
        method: String,
    },

    /// A fact the adapter keys on is absent from the context.
    #[error("adapter '{adapter}' requires fact '{field}'")]
    MissingFact {
        /// Adapter name.
        adapter: String,
        /// Missing fact name.
        field: String,
    },

    /// The adapter ran but could not produce a value.
    #[error("resolution failed: {0}")]
    Resolution(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = RuleError::malformed("$.all[0]", "unknown node kind: number");
        assert_eq!(
            err.to_string(),
            "malformed condition at $.all[0]: unknown node kind: number"
        );

        let err = RuleError::MalformedContent("dynamic block without method".into());
        assert_eq!(
            err.to_string(),
            "malformed content: dynamic block without method"
        );

        let err = AdapterError::UnknownMethod {
            adapter: "rizhu_gender".into(),
            method: "nope".into(),
        };
        assert_eq!(err.to_string(), "adapter 'rizhu_gender' has no method 'nope'");

        let err = AdapterError::UnknownAdapter("ghost".into());
        assert_eq!(err.to_string(), "unknown adapter: ghost");
    }
}
