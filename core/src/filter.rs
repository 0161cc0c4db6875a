use std::collections::BTreeSet;

pub const DEFAULT_EXTENSIONS: &[&str] = &[".txt", ".py", ".md", ".cpp", ".h", ".hpp", ".c"];

/// Case-insensitive allow-list of file suffixes.
///
/// Entries are stored lower-cased with a leading `.`. An empty filter allows
/// nothing: scanning is opt-in per extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        Self::from_list(DEFAULT_EXTENSIONS)
    }

    pub fn from_list<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for ext in extensions {
            filter.add(ext.as_ref());
        }
        filter
    }

    /// Adds an extension, returning `true` if it was not already present.
    /// Blank input is ignored.
    pub fn add(&mut self, ext: &str) -> bool {
        match canonical(ext) {
            Some(ext) => self.extensions.insert(ext),
            None => false,
        }
    }

    pub fn remove(&mut self, ext: &str) -> bool {
        match canonical(ext) {
            Some(ext) => self.extensions.remove(&ext),
            None => false,
        }
    }

    pub fn contains(&self, ext: &str) -> bool {
        canonical(ext).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Whether `filename` ends with one of the allowed suffixes. A name that
    /// consists solely of the suffix (a dotfile such as `.txt`) does not match.
    pub fn is_allowed(&self, filename: &str) -> bool {
        let name = filename.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
    }

    /// Sorted list of allowed extensions.
    pub fn list(&self) -> Vec<String> {
        self.extensions.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.extensions.clear();
    }

    pub fn reset<I, S>(&mut self, defaults: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clear();
        for ext in defaults {
            self.add(ext.as_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

fn canonical(ext: &str) -> Option<String> {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext == "." {
        return None;
    }
    if ext.starts_with('.') {
        Some(ext)
    } else {
        Some(format!(".{}", ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut filter = ExtensionFilter::new();
        assert!(filter.add(".py"));
        assert!(!filter.add(".py"));
        assert!(!filter.add("py"));
        assert!(!filter.add("PY"));
        assert_eq!(filter.list(), vec![".py".to_string()]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let filter = ExtensionFilter::from_list([".txt", "MD"]);
        assert!(filter.is_allowed("notes.TXT"));
        assert!(filter.is_allowed("README.md"));
        assert!(!filter.is_allowed("main.rs"));
        assert!(!filter.is_allowed("txt"));
        assert!(!filter.is_allowed(".txt"));
    }

    #[test]
    fn test_multi_part_suffix() {
        let filter = ExtensionFilter::from_list([".tar.gz"]);
        assert!(filter.is_allowed("backup.tar.gz"));
        assert!(!filter.is_allowed("backup.gz"));
    }

    #[test]
    fn test_empty_filter_allows_nothing() {
        let filter = ExtensionFilter::new();
        assert!(!filter.is_allowed("a.txt"));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_remove_clear_reset() {
        let mut filter = ExtensionFilter::with_defaults();
        assert_eq!(filter.len(), DEFAULT_EXTENSIONS.len());
        assert!(filter.remove("CPP"));
        assert!(!filter.contains(".cpp"));
        assert!(!filter.remove(".cpp"));

        filter.clear();
        assert!(filter.is_empty());

        filter.reset(["rs", ".toml"]);
        assert_eq!(filter.list(), vec![".rs".to_string(), ".toml".to_string()]);
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut filter = ExtensionFilter::new();
        assert!(!filter.add("  "));
        assert!(!filter.add("."));
        assert!(filter.is_empty());
    }
}
