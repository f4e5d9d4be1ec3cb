//! Loading raw documents from a directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{Document, FILE_NAME_KEY, SOURCE_KEY};
use crate::error::{RagError, Result};

/// File extensions treated as plain text.
pub const TEXT_EXTENSIONS: &[&str] =
    &["txt", "md", "markdown", "rst", "csv", "json", "html", "htm", "log"];

/// List loadable files under `root`, sorted by path.
///
/// A missing root yields an empty list. A root that exists but is not a
/// directory is an error.
pub fn discover_document_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Ok(Vec::new());
    }
    if !root.is_dir() {
        return Err(RagError::LoaderError {
            path: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_text_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Load every readable text file under `root` as a [`Document`].
///
/// Document ids are paths relative to `root` using `/` separators. Files that
/// cannot be read or are not valid UTF-8 are skipped with a warning, as are
/// files containing only whitespace. An absent or empty directory produces
/// an empty `Vec`.
pub fn load_documents(root: impl AsRef<Path>) -> Result<Vec<Document>> {
    let root = root.as_ref();
    let files = discover_document_files(root)?;
    if files.is_empty() {
        info!(dir = %root.display(), "no documents found");
        return Ok(Vec::new());
    }

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        if text.trim().is_empty() {
            debug!(path = %path.display(), "skipping empty file");
            continue;
        }

        let id = relative_id(root, &path);
        let file_name =
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        documents.push(
            Document::new(id, text)
                .with_metadata(SOURCE_KEY, path.display().to_string())
                .with_metadata(FILE_NAME_KEY, file_name),
        );
    }

    info!(dir = %root.display(), document_count = documents.len(), "loaded documents");
    Ok(documents)
}

fn relative_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
