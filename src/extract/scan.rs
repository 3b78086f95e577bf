/// Input resolution for extraction mode
///
/// Each command line argument may be an image file, a directory (scanned
/// recursively) or a wildcard pattern. Everything is resolved to a sorted,
/// de-duplicated list of absolute image paths.
use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Image extensions sent to the model (compared lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

/// Check if a path has one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Collect the images under a single existing path
///
/// A file is returned as-is when its extension is supported; a directory is
/// walked recursively. Anything else yields nothing.
pub fn find_images_in_path(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if is_supported_image(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    if !path.is_dir() {
        return Vec::new();
    }

    WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Resolve command line arguments to the images to process
///
/// Arguments that exist on disk are used directly, the rest are expanded as
/// glob patterns relative to the working directory.
pub fn expand_inputs<S: AsRef<str>>(args: &[S]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        let path = Path::new(arg);
        if path.exists() {
            found.extend(find_images_in_path(path));
            continue;
        }

        match glob(arg) {
            Ok(entries) => {
                for entry in entries.filter_map(|e| e.ok()) {
                    found.extend(find_images_in_path(&entry));
                }
            }
            Err(err) => warn!("Ignoring invalid pattern {:?}: {}", arg, err),
        }
    }

    let unique: BTreeSet<PathBuf> = found
        .into_iter()
        .map(|p| p.canonicalize().unwrap_or(p))
        .collect();
    debug!("Resolved {} image(s) from {} argument(s)", unique.len(), args.len());
    unique.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"not really an image").unwrap();
    }

    #[test]
    fn test_supported_extensions_ignore_case() {
        assert!(is_supported_image(Path::new("a/b/photo.JPG")));
        assert!(is_supported_image(Path::new("scan.TiFf")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_directory_is_scanned_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("nested/deeper/b.webp"));
        touch(&dir.path().join("nested/readme.md"));

        let mut found = find_images_in_path(dir.path());
        found.sort();
        assert_eq!(
            found,
            vec![
                dir.path().join("a.png"),
                dir.path().join("nested/deeper/b.webp"),
            ]
        );
    }

    #[test]
    fn test_unsupported_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        touch(&notes);
        assert!(find_images_in_path(&notes).is_empty());
    }

    #[test]
    fn test_expand_dedups_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("b.jpg");
        let a = dir.path().join("a.jpeg");
        touch(&b);
        touch(&a);

        let pattern = format!("{}/*.jp*g", dir.path().display());
        let args = vec![
            b.to_string_lossy().to_string(),
            pattern,
            dir.path().to_string_lossy().to_string(),
        ];
        let found = expand_inputs(&args);

        assert_eq!(
            found,
            vec![a.canonicalize().unwrap(), b.canonicalize().unwrap()]
        );
    }

    #[test]
    fn test_expand_missing_path_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(expand_inputs(&[missing.to_string_lossy()]).is_empty());
    }
}
