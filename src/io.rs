use std::fmt::Display;
use std::fs;
use std::io;
use std::time::Instant;

use camino::Utf8Path;
use console::Style;

const ANSI_BLUE: Style = Style::new().blue();

/// Millisecond overhead marker appended to status lines.
pub fn as_overhead(s: Instant) -> impl Display {
    let e = Instant::now();
    let f = format!("(+{}ms)", e.duration_since(s).as_millis());
    ANSI_BLUE.apply_to(f)
}

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file(src: &Utf8Path, dst: &Utf8Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// Mirror a directory tree verbatim.
pub fn copy_tree(src: &Utf8Path, dst: &Utf8Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;

    for entry in src.read_dir_utf8()? {
        let entry = entry?;
        let filetype = entry.file_type()?;
        if filetype.is_dir() {
            copy_tree(entry.path(), &dst.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let root = utf8_root(&temp);

        fs::write(root.join("a.txt"), "hello").unwrap();
        copy_file(&root.join("a.txt"), &root.join("sub/dir/a.txt")).unwrap();

        let copied = fs::read_to_string(root.join("sub/dir/a.txt")).unwrap();
        assert_eq!(copied, "hello");
    }

    #[test]
    fn test_copy_tree_mirrors_nested_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = utf8_root(&temp);

        fs::create_dir_all(root.join("src/sub")).unwrap();
        fs::write(root.join("src/top.txt"), "top").unwrap();
        fs::write(root.join("src/sub/deep.txt"), "deep").unwrap();

        copy_tree(&root.join("src"), &root.join("dst")).unwrap();

        assert_eq!(fs::read_to_string(root.join("dst/top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(root.join("dst/sub/deep.txt")).unwrap(),
            "deep"
        );
    }
}
