use std::fmt;

use serde::{Deserialize, Serialize};

/// How raw identifiers are folded into a [`JoinKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyNormalization {
    /// Unicode lowercase folding.
    pub fold_case: bool,
    /// Trim both ends and collapse inner whitespace runs to one space.
    pub collapse_whitespace: bool,
}

impl KeyNormalization {
    pub fn exact() -> Self {
        Self {
            fold_case: false,
            collapse_whitespace: false,
        }
    }

    pub fn normalize(&self, raw: &str) -> JoinKey {
        let spaced = if self.collapse_whitespace {
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            raw.to_string()
        };
        let folded = if self.fold_case {
            spaced.to_lowercase()
        } else {
            spaced
        };
        JoinKey(folded)
    }
}

impl Default for KeyNormalization {
    fn default() -> Self {
        Self {
            fold_case: true,
            collapse_whitespace: true,
        }
    }
}

/// Normalized identifier shared by container rows and external rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JoinKey(String);

impl JoinKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
