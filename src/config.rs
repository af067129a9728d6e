use crate::{directory::Columns, engine::Strategy, protected::DEFAULT_PROTECTED_PREFIX};

/// Settings for one rewrite run.
///
/// The defaults reproduce the historical catalog migration: `oldID`/`newID`
/// columns, the North Country Fire product URL as protected prefix and the
/// mark/restore strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceConfig {
    pub strategy: Strategy,
    pub protected_prefix: String,
    pub columns: Columns,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            protected_prefix: DEFAULT_PROTECTED_PREFIX.to_string(),
            columns: Columns::default(),
        }
    }
}
