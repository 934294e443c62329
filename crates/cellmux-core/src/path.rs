//! Stable addressing for storage cells

use crate::errors::StorageError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Identifies a cell by `(mechanism, cell)` name pair.
///
/// A path carries no reference to the cell it names. It stays meaningful
/// across muxer calls, whereas a cell handle may be replaced when its
/// mechanism is erased. Rendered as `<cell>@<mechanism>`, with `%` and `@`
/// in the mechanism name escaped as `%25` and `%40` so parsing is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageCellPath {
    mechanism: String,
    cell: String,
}

impl StorageCellPath {
    /// Create a path for `cell` inside `mechanism`
    pub fn new(mechanism: impl Into<String>, cell: impl Into<String>) -> Self {
        Self {
            mechanism: mechanism.into(),
            cell: cell.into(),
        }
    }

    /// Name of the mechanism owning the cell
    pub fn mechanism(&self) -> &str {
        &self.mechanism
    }

    /// Name of the cell within its mechanism
    pub fn cell(&self) -> &str {
        &self.cell
    }
}

impl fmt::Display for StorageCellPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.cell, escape_mechanism(&self.mechanism))
    }
}

impl FromStr for StorageCellPath {
    type Err = StorageError;

    // The rendered mechanism never contains a bare '@', so split on the last one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cell, mechanism) = s
            .rsplit_once('@')
            .ok_or_else(|| StorageError::invalid_path(format!("'{s}' has no '@' separator")))?;

        if cell.is_empty() || mechanism.is_empty() {
            return Err(StorageError::invalid_path(format!(
                "'{s}' must have the form <cell>@<mechanism>"
            )));
        }

        Ok(Self::new(unescape_mechanism(mechanism)?, cell))
    }
}

/// `%` becomes `%25` and `@` becomes `%40`; other names render unchanged.
fn escape_mechanism(name: &str) -> Cow<'_, str> {
    if name.contains(['%', '@']) {
        Cow::Owned(name.replace('%', "%25").replace('@', "%40"))
    } else {
        Cow::Borrowed(name)
    }
}

fn unescape_mechanism(rendered: &str) -> Result<String, StorageError> {
    let mut name = String::with_capacity(rendered.len());
    let mut chars = rendered.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            name.push(c);
            continue;
        }
        let escape: String = chars.by_ref().take(2).collect();
        match escape.as_str() {
            "25" => name.push('%'),
            "40" => name.push('@'),
            _ => {
                return Err(StorageError::invalid_path(format!(
                    "mechanism '{rendered}' has an invalid escape '%{escape}'"
                )))
            }
        }
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_display_puts_cell_first() {
        let path = StorageCellPath::new("idb", "v3");
        assert_eq!(path.to_string(), "v3@idb");
        assert_eq!(path.mechanism(), "idb");
        assert_eq!(path.cell(), "v3");
    }

    #[test]
    fn test_parse_splits_on_last_separator() {
        let path: StorageCellPath = "user@home@idb".parse().unwrap();
        assert_eq!(path.cell(), "user@home");
        assert_eq!(path.mechanism(), "idb");
    }

    #[test]
    fn test_mechanism_with_separator_is_escaped() {
        let path = StorageCellPath::new("local@disk", "v1");
        assert_eq!(path.to_string(), "v1@local%40disk");
        assert_eq!("v1@local%40disk".parse::<StorageCellPath>().unwrap(), path);

        let path = StorageCellPath::new("100%", "v1");
        assert_eq!(path.to_string(), "v1@100%25");
        assert_eq!(path.to_string().parse::<StorageCellPath>().unwrap(), path);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "v3", "@idb", "v3@", "v3@id%", "v3@id%4", "v3@id%zz"] {
            let err = bad.parse::<StorageCellPath>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidStorageCellPath, "input {bad:?}");
        }
    }

    #[test]
    fn test_paths_order_by_mechanism_then_cell() {
        let mut paths = vec![
            StorageCellPath::new("b", "a"),
            StorageCellPath::new("a", "z"),
            StorageCellPath::new("a", "c"),
        ];
        paths.sort();
        let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["c@a", "z@a", "a@b"]);
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(
            mechanism in "[a-z@%][a-z0-9@%_-]{0,12}",
            cell in "[a-zA-Z0-9@%._-]{1,16}",
        ) {
            let path = StorageCellPath::new(mechanism, cell);
            let parsed: StorageCellPath = path.to_string().parse().unwrap();
            prop_assert_eq!(parsed, path);
        }
    }
}
