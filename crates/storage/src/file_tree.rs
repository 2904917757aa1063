//! Listing and reading files of an extracted output directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use bluesky_common::{AdminError, AdminResult, FilePayload, OutputFileTree};

/// Recursively list `root`.
///
/// Entries are sorted by name. A subdirectory that cannot be read becomes
/// an empty node carrying the error; failure to read `root` itself is
/// returned as an error.
pub fn list_files(root: &Path) -> AdminResult<OutputFileTree> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    list_dir(root, name)
}

fn list_dir(dir: &Path, name: String) -> AdminResult<OutputFileTree> {
    let mut tree = OutputFileTree::new(name);

    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            let child = match list_dir(&entry.path(), entry_name.clone()) {
                Ok(child) => child,
                Err(e) => {
                    tracing::warn!(dir = %entry.path().display(), error = %e, "Failed to list directory");
                    OutputFileTree {
                        error: Some(e.to_string()),
                        ..OutputFileTree::new(entry_name)
                    }
                }
            };
            tree.dirs.push(child);
        } else if file_type.is_file() {
            tree.files.push(entry_name);
        }
    }

    Ok(tree)
}

/// Resolve a caller-supplied relative file name under `root`.
///
/// Only plain path segments are accepted, so the result never leaves
/// `root`.
pub fn resolve_file(root: &Path, name: &str) -> AdminResult<PathBuf> {
    if name.is_empty() {
        return Err(AdminError::MissingParameter("name".to_string()));
    }

    let relative = Path::new(name);
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => resolved.push(segment),
            Component::CurDir => {}
            _ => {
                return Err(AdminError::invalid(
                    "name",
                    format!("'{}' must be a relative path inside the output", name),
                ))
            }
        }
    }

    if resolved == root {
        return Err(AdminError::invalid("name", "names a directory, not a file"));
    }
    Ok(resolved)
}

/// Read `name` under `root` as a payload named after its basename.
pub async fn read_file(root: &Path, name: &str) -> AdminResult<FilePayload> {
    let path = resolve_file(root, name)?;
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    match tokio::fs::read(&path).await {
        Ok(contents) => Ok(FilePayload::new(basename, contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AdminError::NotFound {
            key: name.to_string(),
        }),
        Err(e) => Err(AdminError::Internal(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(root: &Path) {
        fs::create_dir_all(root.join("images/hourly")).unwrap();
        fs::write(root.join("output.json"), b"{}").unwrap();
        fs::write(root.join("data.nc"), b"CDF").unwrap();
        fs::write(root.join("images/legend.png"), b"png").unwrap();
        fs::write(root.join("images/hourly/01.png"), b"png").unwrap();
    }

    #[test]
    fn test_list_files_recursive_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("run-1");
        populate(&root);

        let tree = list_files(&root).unwrap();
        assert_eq!(tree.name, "run-1");
        assert_eq!(tree.files, vec!["data.nc", "output.json"]);
        assert_eq!(tree.dirs.len(), 1);

        let images = tree.dir("images").unwrap();
        assert_eq!(images.files, vec!["legend.png"]);
        assert_eq!(images.dir("hourly").unwrap().files, vec!["01.png"]);
        assert_eq!(tree.file_count(), 4);
    }

    #[test]
    fn test_list_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(list_files(&tmp.path().join("absent")).is_err());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let root = Path::new("/cache/bucket/output/req/run");
        assert!(resolve_file(root, "../other/secret").is_err());
        assert!(resolve_file(root, "/etc/passwd").is_err());
        assert!(resolve_file(root, ".").is_err());
        assert_eq!(
            resolve_file(root, "images/legend.png").unwrap(),
            root.join("images/legend.png")
        );
    }

    #[tokio::test]
    async fn test_read_file_returns_basename() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());

        let payload = read_file(tmp.path(), "images/legend.png").await.unwrap();
        assert_eq!(payload.name, "legend.png");
        assert_eq!(payload.contents, b"png");
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = read_file(tmp.path(), "nope.txt").await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }
}
