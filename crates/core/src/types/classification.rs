//! Classification tags recorded in registry entries

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Deref;

/// The type tag recorded for a stored value.
///
/// Primitive and container kinds use fixed tags; records use their schema name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classification(String);

impl Classification {
    pub const NULL: &'static str = "NULL";
    pub const BOOLEAN: &'static str = "boolean";
    pub const INTEGER: &'static str = "integer";
    pub const DOUBLE: &'static str = "double";
    pub const STRING: &'static str = "string";
    pub const ARRAY: &'static str = "array";
    pub const MAP: &'static str = "map";

    /// Wrap a tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory hint derived from the tag, with namespace separators folded to `/`
    pub fn storage_directory(&self) -> String {
        self.0.replace("\\", "/").replace("::", "/")
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Classification {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for Classification {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Classification {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_directory_folds_separators() {
        assert_eq!(
            Classification::new("acme\\model\\Invoice").storage_directory(),
            "acme/model/Invoice"
        );
        assert_eq!(
            Classification::new("app::model::User").storage_directory(),
            "app/model/User"
        );
        assert_eq!(Classification::new("string").storage_directory(), "string");
    }
}
