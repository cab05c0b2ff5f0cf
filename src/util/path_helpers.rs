//! Helpers for locating precomputed parse files, either on disk or inside tar archives
use std::fs::File;
use std::path::{Component, Path, PathBuf};

/// Extensions of precomputed typed-dependency files, in lookup order
pub static PARSE_EXTENSIONS: [&str; 4] = ["sd", "dep", "sdepcc", "sdep"];

/// Whether `path` names a (possibly gzipped) tar archive
pub fn is_tar_name(path: &Path) -> bool {
  let name = path
    .file_name()
    .and_then(|name| name.to_str())
    .unwrap_or("");
  name.ends_with(".tar") || name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Whether `path` names a gzipped tar archive
pub fn is_gzipped(path: &Path) -> bool {
  let name = path
    .file_name()
    .and_then(|name| name.to_str())
    .unwrap_or("");
  name.ends_with(".gz") || name.ends_with(".tgz")
}

/// Split a path such as `parses.tar.gz/train/sd` into the archive and the directory inside
/// it. Paths that don't pass through an existing archive file come back unchanged, with no
/// archive.
pub fn split_tar_path(path: &Path) -> (Option<PathBuf>, PathBuf) {
  for ancestor in path.ancestors() {
    if is_tar_name(ancestor) && ancestor.is_file() {
      let inner = path
        .strip_prefix(ancestor)
        .map(normalize)
        .unwrap_or_default();
      return (Some(ancestor.to_path_buf()), inner);
    }
  }
  (None, path.to_path_buf())
}

/// Drop `.` components, so `./a/b` and `a/b` compare equal
pub fn normalize(path: &Path) -> PathBuf {
  path
    .components()
    .filter(|component| *component != Component::CurDir)
    .collect()
}

/// Open the first existing `base.ext` for the given extensions
pub fn open_with_ext(base: &Path, extensions: &[&str]) -> Option<(PathBuf, File)> {
  for extension in extensions {
    let mut candidate = base.as_os_str().to_owned();
    candidate.push(".");
    candidate.push(extension);
    let candidate = PathBuf::from(candidate);
    if let Ok(file) = File::open(&candidate) {
      return Some((candidate, file));
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recognizes_archives() {
    assert!(is_tar_name(Path::new("parses.tar")));
    assert!(is_tar_name(Path::new("/data/parses.tar.gz")));
    assert!(is_tar_name(Path::new("parses.tgz")));
    assert!(!is_tar_name(Path::new("parses/")));
    assert!(is_gzipped(Path::new("parses.tgz")));
    assert!(!is_gzipped(Path::new("parses.tar")));
  }

  #[test]
  fn plain_directories_are_not_split() {
    let (archive, inner) = split_tar_path(Path::new("no/such/dir"));
    assert_eq!(archive, None);
    assert_eq!(inner, PathBuf::from("no/such/dir"));
  }

  #[test]
  fn normalizes_current_dir() {
    assert_eq!(normalize(Path::new("./a/./b")), PathBuf::from("a/b"));
  }
}
