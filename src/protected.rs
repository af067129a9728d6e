use std::fmt::Debug;

use crate::engine::SubstitutionError;

/// The URL prefix the historical catalog used for product links.
pub const DEFAULT_PROTECTED_PREFIX: &str = "https://www.northcountryfire.com/products/";

/// A literal prefix that shields an identifier occurrence from substitution.
///
/// An occurrence starting at byte `start` is protected iff the text before it
/// ends with the prefix. This is a purely lexical check, equivalent to the
/// fixed-length negative lookbehind `(?<!prefix)`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProtectedContext {
    prefix: String,
}

impl ProtectedContext {
    pub fn new(prefix: impl Into<String>) -> Result<Self, SubstitutionError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(SubstitutionError::EmptyProtectedPrefix);
        }
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn protects(&self, text: &str, start: usize) -> bool {
        text.as_bytes()[..start].ends_with(self.prefix.as_bytes())
    }
}

impl Default for ProtectedContext {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PROTECTED_PREFIX.to_string(),
        }
    }
}

impl Debug for ProtectedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProtectedContext({:?})", self.prefix)
    }
}
