//! Credential artifacts and the ordered path map the writer consumes

use std::fmt;

/// One file to persist on the node
///
/// Content may hold a bootstrap token, so `Debug` prints only its length.
#[derive(Clone, PartialEq, Eq)]
pub struct File {
    pub content: String,
    pub mode: u32,
}

impl File {
    pub fn new(content: impl Into<String>, mode: u32) -> Self {
        Self {
            content: content.into(),
            mode,
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("content_len", &self.content.len())
            .field("mode", &format_args!("{:o}", self.mode))
            .finish()
    }
}

/// Path to file, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: Vec<(String, File)>,
}

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced path keeps its original position
    pub fn insert(&mut self, path: impl Into<String>, file: File) {
        let path = path.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == path) {
            Some((_, slot)) => *slot = file,
            None => self.entries.push((path, file)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&File> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, file)| file)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &File)> {
        self.entries.iter().map(|(path, file)| (path.as_str(), file))
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|(path, _)| path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extend(&mut self, other: FileMap) {
        for (path, file) in other.entries {
            self.insert(path, file);
        }
    }
}

impl IntoIterator for FileMap {
    type Item = (String, File);
    type IntoIter = std::vec::IntoIter<(String, File)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let mut files = FileMap::new();
        files.insert("/b", File::new("b", 0o644));
        files.insert("/a", File::new("a", 0o755));
        files.insert("/b", File::new("b2", 0o600));

        assert_eq!(files.paths(), vec!["/b", "/a"]);
        assert_eq!(files.get("/b").map(|f| f.content.as_str()), Some("b2"));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_debug_hides_content() {
        let file = File::new("token: abcdef.0123456789abcdef", 0o644);
        let rendered = format!("{:?}", file);
        assert!(!rendered.contains("abcdef"));
        assert!(rendered.contains("644"));
    }
}
