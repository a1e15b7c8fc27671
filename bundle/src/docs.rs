//! Test documentation lookup.
//!
//! Test cases can carry a title and category tags in the documentation of
//! the class that implements them. The test sources are not part of the
//! bundle, so lookup is a pluggable capability; every failure maps to
//! absence.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Resolves the leading documentation text of a test class.
pub trait DocLookup: Send + Sync {
    /// Returns the documentation of `class` defined in `file`, if known.
    fn class_doc(&self, file: &str, class: &str) -> Option<String>;
}

/// Lookup that never finds documentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocs;

impl DocLookup for NoDocs {
    fn class_doc(&self, _file: &str, _class: &str) -> Option<String> {
        None
    }
}

/// Lookup against a checked-out test source tree.
///
/// Reads `<root>/<file>`, finds a top-level `class <Name>` definition and
/// returns its docstring with indentation cleaned up.
#[derive(Debug, Clone)]
pub struct SourceTreeDocs {
    root: PathBuf,
}

impl SourceTreeDocs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocLookup for SourceTreeDocs {
    fn class_doc(&self, file: &str, class: &str) -> Option<String> {
        if file.is_empty() || file.contains(['/', '\\']) || file == ".." {
            return None;
        }
        let path = self.root.join(file);
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Test source not readable");
                return None;
            }
        };
        class_docstring(&source, class)
    }
}

static CLASS_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*(?:\([^)]*\))?\s*:")
        .expect("static regex must compile")
});

/// Extracts the docstring of a top-level class from Python-style source.
///
/// Only a triple-quoted string literal that is the first statement of the
/// class body counts. Returns `None` when the class or its docstring is
/// missing.
///
/// # Examples
///
/// ```
/// use hwgrid_bundle::docs::class_docstring;
///
/// let source = "class Suspend(Test):\n    \"\"\"\n    .. title:: Suspend to RAM\n\n    :categories: battery\n    \"\"\"\n";
/// let doc = class_docstring(source, "Suspend").unwrap();
/// assert_eq!(doc, ".. title:: Suspend to RAM\n\n:categories: battery");
/// ```
pub fn class_docstring(source: &str, class: &str) -> Option<String> {
    let def = CLASS_DEF
        .captures_iter(source)
        .find(|caps| &caps["name"] == class)?;
    let body = source[def.get(0)?.end()..].trim_start();

    let quote = ["\"\"\"", "'''"]
        .into_iter()
        .find(|quote| body.starts_with(quote))?;
    let inner = &body[quote.len()..];
    let close = inner.find(quote)?;
    Some(clean_doc(&inner[..close]))
}

/// Normalizes docstring indentation: the first line is stripped, the common
/// indentation of the remaining lines removed, and blank lines at either end
/// dropped.
pub fn clean_doc(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let mut lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let indent = lines[1..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines.remove(0).trim().to_string());
    for line in lines {
        let cut = indent.min(line.len() - line.trim_start_matches(' ').len());
        cleaned.push(line[cut..].trim_end().to_string());
    }

    while cleaned.first().is_some_and(|line| line.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"import avocado

class Helper:
    pass


class BatteryDrain(avocado.Test):
    '''Battery drain while idle.

    :categories: battery, power
    :avocado: enable
    '''

    def test_drain(self):
        """Not the class doc."""


class NoDoc(avocado.Test):
    def test(self):
        pass
"#;

    #[test]
    fn test_class_docstring_found() {
        let doc = class_docstring(SOURCE, "BatteryDrain").unwrap();
        assert_eq!(
            doc,
            "Battery drain while idle.\n\n:categories: battery, power\n:avocado: enable"
        );
    }

    #[test]
    fn test_class_without_docstring() {
        assert_eq!(class_docstring(SOURCE, "NoDoc"), None);
        assert_eq!(class_docstring(SOURCE, "Helper"), None);
        assert_eq!(class_docstring(SOURCE, "Missing"), None);
    }

    #[test]
    fn test_class_name_must_match_exactly() {
        assert_eq!(class_docstring(SOURCE, "Battery"), None);
    }

    #[test]
    fn test_source_tree_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("battery.py"), SOURCE).unwrap();
        let docs = SourceTreeDocs::new(dir.path());

        assert!(docs.class_doc("battery.py", "BatteryDrain").is_some());
        assert!(docs.class_doc("missing.py", "BatteryDrain").is_none());
        assert!(docs.class_doc("../battery.py", "BatteryDrain").is_none());
        assert!(docs.class_doc("..", "BatteryDrain").is_none());
    }

    #[test]
    fn test_clean_doc_handles_single_line() {
        assert_eq!(clean_doc("  One liner.  "), "One liner.");
        assert_eq!(clean_doc(""), "");
    }
}
