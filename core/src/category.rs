//! Hardware category accumulator.
//!
//! Resolvers and test cases write their findings into a [`CategoryTable`].
//! Every flag on a [`CategoryStatus`] is set-only: once a category has been
//! resolved, or marked as warning or error, nothing later in the same parse
//! can clear it.

use std::collections::BTreeMap;

use crate::types::{CategoryEntry, Style, TestStatus};

/// Text shown for a category that nothing has described yet.
pub const UNRESOLVED_TEXT: &str = "Unresolved";

/// Key of the catch-all category for test cases without explicit categories.
pub const ISSUES_CATEGORY: &str = "issues";

const ISSUES_TYPE: &str = "Issues";
const ISSUES_TEXT: &str = "Issues were detected during testing!";

/// Hardware categories present in every report, as `(key, display type)`.
pub const HARDWARE_CATEGORIES: &[(&str, &str)] = &[
    ("graphics", "Graphics"),
    ("screen", "Screen"),
    ("bluetooth", "Bluetooth"),
    ("cpu", "CPU"),
    ("ethernet", "Ethernet"),
    ("wifi", "Wireless LAN"),
    ("usb", "USB"),
    ("pointer", "Pointer Devices"),
    ("battery", "Battery"),
    ("firmware", "Firmware"),
    ("fingerprint", "Fingerprint Reader"),
];

/// Derives the displayed status from the three category flags.
///
/// # Examples
///
/// ```
/// use hwgrid_core::{Style, derive_status};
///
/// assert_eq!(derive_status(false, true, true), Style::Warn);
/// assert_eq!(derive_status(true, true, true), Style::Bad);
/// assert_eq!(derive_status(true, false, true), Style::Warn);
/// assert_eq!(derive_status(true, false, false), Style::Good);
/// ```
pub fn derive_status(resolved: bool, error: bool, warn: bool) -> Style {
    if !resolved {
        Style::Warn
    } else if error {
        Style::Bad
    } else if warn {
        Style::Warn
    } else {
        Style::Good
    }
}

/// State of one hardware or test-area category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStatus {
    kind: String,
    text: String,
    resolved: bool,
    error: bool,
    warn: bool,
}

impl CategoryStatus {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: UNRESOLVED_TEXT.to_string(),
            resolved: false,
            error: false,
            warn: false,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn has_warning(&self) -> bool {
        self.warn
    }

    /// Replaces the description and marks the category as resolved.
    pub fn resolve(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.resolved = true;
    }

    /// Replaces the description without touching any flag.
    pub fn describe(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn flag_error(&mut self) {
        self.error = true;
    }

    pub fn flag_warning(&mut self) {
        self.warn = true;
    }

    pub fn status(&self) -> Style {
        derive_status(self.resolved, self.error, self.warn)
    }

    pub fn to_entry(&self) -> CategoryEntry {
        CategoryEntry {
            kind: self.kind.clone(),
            status: self.status(),
            text: self.text.clone(),
        }
    }
}

/// Mapping from category key to its accumulated status.
///
/// # Examples
///
/// ```
/// use hwgrid_core::{CategoryTable, Style, TestStatus};
///
/// let mut table = CategoryTable::with_hardware_categories();
/// table.get_mut("battery").unwrap().resolve("1 battery");
/// table.mark("battery", &TestStatus::Fail);
/// table.mark("battery", &TestStatus::Pass);
/// assert_eq!(table.get("battery").unwrap().status(), Style::Bad);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    categories: BTreeMap<String, CategoryStatus>,
}

impl CategoryTable {
    /// Creates a table holding every entry of [`HARDWARE_CATEGORIES`], all
    /// unresolved.
    pub fn with_hardware_categories() -> Self {
        let categories = HARDWARE_CATEGORIES
            .iter()
            .map(|(key, kind)| (key.to_string(), CategoryStatus::new(*kind)))
            .collect();
        Self { categories }
    }

    pub fn get(&self, key: &str) -> Option<&CategoryStatus> {
        self.categories.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CategoryStatus> {
        self.categories.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.categories.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryStatus)> {
        self.categories.iter().map(|(key, status)| (key.as_str(), status))
    }

    /// Returns the category for `key`, creating it on first use.
    ///
    /// The issues category gets its fixed type and description; any other
    /// unknown key uses the key itself as display type.
    pub fn entry(&mut self, key: &str) -> &mut CategoryStatus {
        self.categories.entry(key.to_string()).or_insert_with(|| {
            if key == ISSUES_CATEGORY {
                let mut issues = CategoryStatus::new(ISSUES_TYPE);
                issues.describe(ISSUES_TEXT);
                issues
            } else {
                CategoryStatus::new(key)
            }
        })
    }

    /// Folds one test outcome into a category: failures set the error flag,
    /// warnings set the warning flag, everything else leaves it untouched.
    pub fn mark(&mut self, key: &str, status: &TestStatus) {
        let category = self.entry(key);
        match status {
            TestStatus::Fail => category.flag_error(),
            TestStatus::Warn => category.flag_warning(),
            _ => {}
        }
    }

    /// Snapshot of the table in its serialized form.
    pub fn to_entries(&self) -> BTreeMap<String, CategoryEntry> {
        self.categories
            .iter()
            .map(|(key, status)| (key.clone(), status.to_entry()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_all_combinations() {
        for resolved in [false, true] {
            for error in [false, true] {
                for warn in [false, true] {
                    let expected = match (resolved, error, warn) {
                        (false, _, _) => Style::Warn,
                        (true, true, _) => Style::Bad,
                        (true, false, true) => Style::Warn,
                        (true, false, false) => Style::Good,
                    };
                    assert_eq!(
                        derive_status(resolved, error, warn),
                        expected,
                        "resolved={resolved} error={error} warn={warn}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_new_table_has_all_hardware_categories_unresolved() {
        let table = CategoryTable::with_hardware_categories();
        assert_eq!(table.len(), HARDWARE_CATEGORIES.len());
        let wifi = table.get("wifi").unwrap();
        assert_eq!(wifi.kind(), "Wireless LAN");
        assert_eq!(wifi.text(), UNRESOLVED_TEXT);
        assert_eq!(wifi.status(), Style::Warn);
        assert!(!table.contains(ISSUES_CATEGORY));
    }

    #[test]
    fn test_flags_are_never_cleared() {
        let mut table = CategoryTable::with_hardware_categories();
        table.get_mut("usb").unwrap().resolve("2.0 root hub");
        table.mark("usb", &TestStatus::Warn);
        table.mark("usb", &TestStatus::Pass);
        table.mark("usb", &TestStatus::Skip);
        assert_eq!(table.get("usb").unwrap().status(), Style::Warn);

        table.mark("usb", &TestStatus::Fail);
        table.mark("usb", &TestStatus::Cancelled);
        let usb = table.get("usb").unwrap();
        assert!(usb.has_error());
        assert!(usb.has_warning());
        assert_eq!(usb.status(), Style::Bad);

        table.get_mut("usb").unwrap().describe("replaced");
        assert!(table.get("usb").unwrap().is_resolved());
    }

    #[test]
    fn test_issues_category_created_lazily() {
        let mut table = CategoryTable::with_hardware_categories();
        table.mark(ISSUES_CATEGORY, &TestStatus::Pass);
        let issues = table.get(ISSUES_CATEGORY).unwrap();
        assert_eq!(issues.kind(), "Issues");
        assert_eq!(issues.text(), "Issues were detected during testing!");
        assert!(!issues.has_error());
    }

    #[test]
    fn test_unknown_category_uses_key_as_type() {
        let mut table = CategoryTable::with_hardware_categories();
        table.mark("audio", &TestStatus::Fail);
        let audio = table.get("audio").unwrap();
        assert_eq!(audio.kind(), "audio");
        assert!(audio.has_error());
        // Never resolved by hardware data, so the status stays a warning.
        assert_eq!(audio.status(), Style::Warn);
    }
}
