use std::fmt::{self, Display, Formatter};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// The reserved first segment of every build artifact path.
pub const OUT_ROOT: &str = "out";

/// The scratch tree where sandboxes live, wiped at the start of every run.
pub const SCRATCH_ROOT: &str = "out/.hex";

/// A forward-slash relative path appearing in a `Hexmake` file, naming
/// either a source file in the workspace or an artifact under `out/`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct HexPath(Utf8PathBuf);

impl HexPath {
    /// Whether this path names a build artifact. The check is textual: the
    /// path must begin with the literal `out/` segment, so `out` by itself
    /// and `output/foo` are both source paths.
    pub fn is_output(&self) -> bool {
        self.0.as_str().starts_with("out/")
    }

    /// Generate a path by appending a child segment.
    pub fn child(&self, name: &str) -> HexPath {
        HexPath(Utf8PathBuf::from(format!("{}/{}", self.0, name)))
    }

    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The directory part of the path, up to the last separator.
    pub fn parent(&self) -> Option<&Utf8Path> {
        self.0.parent()
    }
}

impl From<&str> for HexPath {
    fn from(path: &str) -> Self {
        HexPath(Utf8PathBuf::from(path))
    }
}

impl From<String> for HexPath {
    fn from(path: String) -> Self {
        HexPath(Utf8PathBuf::from(path))
    }
}

impl Display for HexPath {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_output_paths() {
        assert!(HexPath::from("out/foo.o").is_output());
        assert!(HexPath::from("out/sub/foo").is_output());

        assert!(!HexPath::from("foo.c").is_output());
        assert!(!HexPath::from("src/foo.c").is_output());
        assert!(!HexPath::from("output/foo.c").is_output());
        assert!(!HexPath::from("out").is_output());
    }

    #[test]
    fn test_child() {
        let path = HexPath::from("out/sub");
        assert_eq!(path.child("foo.o"), HexPath::from("out/sub/foo.o"));
    }

    #[test]
    fn test_parent() {
        assert_eq!(
            HexPath::from("out/sub/foo.o").parent(),
            Some(Utf8Path::new("out/sub"))
        );
    }
}
