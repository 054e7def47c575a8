use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[cfg_attr(feature = "openapi", schema(value_type = String))]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    RuleCode,
    "Unique, human-readable rule identifier, stable across versions."
);
newtype_string!(
    RuleType,
    "Rule category tag used to filter matches (e.g. `career`)."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_from_str() {
        let code = RuleCode::from("DYNAMIC_RIZHU_GENDER");
        assert_eq!(code.as_str(), "DYNAMIC_RIZHU_GENDER");
        assert_eq!(&*code, "DYNAMIC_RIZHU_GENDER");
    }

    #[test]
    fn newtype_serde_is_transparent() {
        let ty = RuleType::new("career");
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"career\"");
        let back: RuleType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn codes_order_lexicographically() {
        let mut codes = vec![RuleCode::new("B"), RuleCode::new("A2"), RuleCode::new("A1")];
        codes.sort();
        let rendered: Vec<&str> = codes.iter().map(RuleCode::as_str).collect();
        assert_eq!(rendered, ["A1", "A2", "B"]);
    }
}
