//! Corpus loading and uploads.

use crate::parser::{read_text, ContentType};
use crate::types::Document;
use compliance_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read one file into a document. `None` when the file is unsupported or
/// yields no text.
pub fn document_from_path(path: &Path) -> Option<Document> {
    if !ContentType::from_path(path).is_supported() {
        return None;
    }

    let name = path.file_name()?.to_string_lossy().to_string();
    let text = read_text(path);
    if text.trim().is_empty() {
        tracing::warn!("No text extracted from {:?}, skipping", path);
        return None;
    }

    Some(Document::new(name.clone(), name, file_uri(path), text))
}

/// `file://` URI of the canonical path, or of `path` as given if it cannot
/// be resolved.
pub fn file_uri(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Read every supported file under `dirs`, in sorted path order.
///
/// Missing directories are skipped.
pub fn load_corpus(dirs: &[PathBuf]) -> Vec<Document> {
    let mut documents = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            tracing::debug!("Corpus directory {:?} not found, skipping", dir);
            continue;
        }

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                if let Some(doc) = document_from_path(path) {
                    tracing::debug!("Loaded {:?} ({} chars)", path, doc.raw_text.len());
                    documents.push(doc);
                }
            }
        }
    }

    tracing::info!("Loaded {} documents from {} directories", documents.len(), dirs.len());
    documents
}

/// Reject sources that cannot be uploaded: missing, not a regular file, or
/// of an unsupported type.
pub fn validate_upload(source: &Path) -> AppResult<ContentType> {
    if !source.is_file() {
        return Err(AppError::Knowledge(format!("Not a file: {:?}", source)));
    }
    let content_type = ContentType::from_path(source);
    if !content_type.is_supported() {
        return Err(AppError::Knowledge(format!(
            "Unsupported file type: {:?} (expected .md, .txt or .pdf)",
            source
        )));
    }
    Ok(content_type)
}

/// Copy `source` into `uploads_dir`, replacing a file of the same name.
pub fn store_upload(uploads_dir: &Path, source: &Path) -> AppResult<PathBuf> {
    let content_type = validate_upload(source)?;
    let name = source
        .file_name()
        .ok_or_else(|| AppError::Knowledge(format!("No file name in {:?}", source)))?;

    fs::create_dir_all(uploads_dir)?;
    let target = uploads_dir.join(name);
    fs::copy(source, &target)?;

    tracing::info!("Stored upload {:?} ({})", target, content_type.as_str());
    Ok(target)
}
