use std::path::{Path, PathBuf};

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// The extension of a file, in lower case.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
}

/// Relative paths are taken from `base`.
pub fn resolve(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
