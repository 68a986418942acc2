use std::{
    fmt::{self, Display, Formatter},
    fs,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Unable to read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Document \"{0}\" is larger than 4GiB")]
    TooLarge(String),
}

#[derive(Debug)]
struct Source {
    name: String,
    path: Option<PathBuf>,
    content: String,
    /// Byte offsets of every line start, used to answer `line_of`.
    lines: Vec<u32>,
}

/// An immutable named source of text.
///
/// Cloning is cheap; two documents are the same document when their names are equal.
#[derive(Debug, Clone)]
pub struct Document {
    source: Arc<Source>,
}

impl Document {
    /// Creates an in-memory document.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::build(name.into(), None, content.into())
    }

    /// Reads a document from the filesystem. The document is named after its path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if u32::try_from(content.len()).is_err() {
            return Err(DocumentError::TooLarge(path.display().to_string()));
        }

        Ok(Self::build(
            path.display().to_string(),
            Some(path.to_path_buf()),
            content,
        ))
    }

    fn build(name: String, path: Option<PathBuf>, content: String) -> Self {
        let lines = std::iter::once(0)
            .chain(
                content
                    .match_indices('\n')
                    .map(|(offset, _)| offset as u32 + 1),
            )
            .collect();

        Self {
            source: Arc::new(Source {
                name,
                path,
                content,
                lines,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.source.path.as_deref()
    }

    pub fn read(&self) -> &str {
        &self.source.content
    }

    pub fn len(&self) -> u32 {
        self.source.content.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.source.content.is_empty()
    }

    /// Returns the 1-based line number containing the given byte position.
    pub fn line_of(&self, position: u32) -> u32 {
        match self.source.lines.binary_search(&position) {
            Ok(index) => index as u32 + 1,
            Err(index) => index as u32,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source) || self.source.name == other.source.name
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.name.hash(state);
    }
}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.source.name.cmp(&other.source.name)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", 0, 1)]
    #[case("abc\ndef", 3, 1)]
    #[case("abc\ndef", 4, 2)]
    #[case("abc\ndef\n", 8, 3)]
    #[case("\n\n\n", 2, 3)]
    fn test_line_of(#[case] content: &str, #[case] position: u32, #[case] expected: u32) {
        let document = Document::new("test", content);
        assert_eq!(document.line_of(position), expected);
    }

    #[test]
    fn test_identity_by_name() {
        let a = Document::new("same", "one");
        let b = Document::new("same", "two");
        let c = Document::new("other", "one");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_path_missing() {
        let result = Document::from_path("/definitely/not/here.jamplate");
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }
}
