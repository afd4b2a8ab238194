//! Key, expand and order-by values accumulated by a command.

use crate::model::Entry;
use crate::model::Value;
use crate::query::Direction;

/// Key values of a command: positional or named.
///
/// Exactly one representation is active; setting one replaces the other.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValues {
    /// Values matched to the declared key properties by position.
    Positional(Vec<Value>),
    /// Values matched to the declared key properties by name.
    Named(Entry),
}

impl KeyValues {
    /// Returns `true` if no value is set.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Positional(values) => values.is_empty(),
            Self::Named(entry) => entry.is_empty(),
        }
    }
}

/// How many levels a recursive expansion follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpandLevels {
    /// A fixed number of levels.
    Count(u32),
    /// As many levels as the service allows.
    Max,
}

/// Options of one expand association.
///
/// # Example
///
/// ```
/// use odata_lib::command::ExpandOptions;
///
/// let options = ExpandOptions::levels(2);
/// let everything = ExpandOptions::levels(0); // `$levels=max`
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExpandOptions {
    /// Recursive expansion depth.
    pub levels: Option<ExpandLevels>,
    /// Expand entity references (`$ref`) instead of entities.
    pub by_reference: bool,
}

impl ExpandOptions {
    /// Expands `levels` levels deep; `0` means as deep as allowed.
    pub fn levels(levels: u32) -> Self {
        let levels = if levels == 0 {
            ExpandLevels::Max
        } else {
            ExpandLevels::Count(levels)
        };
        Self {
            levels: Some(levels),
            by_reference: false,
        }
    }

    /// Expands entity references instead of entities.
    pub fn by_reference() -> Self {
        Self {
            levels: None,
            by_reference: true,
        }
    }

    /// Returns `true` if no option differs from the default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// One expand association: a navigation path and its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandAssociation {
    /// `/`-separated navigation path.
    pub path: String,
    /// Expansion options, applied to the last path segment.
    pub options: ExpandOptions,
}

/// One `$orderby` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByColumn {
    /// `/`-separated property path.
    pub path: String,
    /// Sort direction.
    pub direction: Direction,
}

/// Splits user input into elementary paths.
///
/// Each item may itself be a comma-separated group; path segments may be
/// separated by `/` or `.`.
pub(crate) fn split_paths<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(|part| {
                    part.trim()
                        .split(['/', '.'])
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .filter(|path| !path.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paths() {
        assert_eq!(
            split_paths(["ProductName, UnitPrice", "Category.CategoryName", "Orders/Customer"]),
            vec!["ProductName", "UnitPrice", "Category/CategoryName", "Orders/Customer"]
        );
    }

    #[test]
    fn test_split_paths_skips_empty_items() {
        assert_eq!(split_paths([" , Name,,"]), vec!["Name"]);
    }

    #[test]
    fn test_levels_zero_is_max() {
        assert_eq!(ExpandOptions::levels(0).levels, Some(ExpandLevels::Max));
        assert_eq!(ExpandOptions::levels(3).levels, Some(ExpandLevels::Count(3)));
        assert!(ExpandOptions::default().is_default());
    }
}
