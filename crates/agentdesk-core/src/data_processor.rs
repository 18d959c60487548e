//! Directory loader: turns files on disk into redacted [`Document`]s.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::types::Document;

#[derive(Debug, Clone)]
pub struct DataProcessor {
    extensions: Vec<String>,
    redact_pii: bool,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self { extensions: vec!["md".to_string(), "txt".to_string()], redact_pii: true }
    }
}

impl DataProcessor {
    pub fn new(extensions: Vec<String>, redact_pii: bool) -> Self {
        let extensions = extensions.into_iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect();
        Self { extensions, redact_pii }
    }

    pub fn load_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        self.load_directory_limited(data_dir, usize::MAX)
    }

    pub fn load_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Document>> {
        let mut files = self.list_files(data_dir);
        if files.is_empty() {
            info!(dir = %data_dir.display(), "No matching files found");
            return Ok(vec![]);
        }
        if files.len() > limit {
            files.truncate(limit);
            info!(limit, "Limited to first files");
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), n = file_index + 1, total = files.len(), "Loading file");
            let doc_id = Self::relative_doc_id(data_dir, file_path);
            documents.push(self.read_document(file_path, doc_id)?);
        }
        info!(files = documents.len(), dir = %data_dir.display(), "Loaded documents");
        Ok(documents)
    }

    /// Read one file as a document named by its file name. Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn load_document(&self, file_path: &Path) -> Result<Document> {
        let doc_id = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());
        self.read_document(file_path, doc_id)
    }

    fn read_document(&self, file_path: &Path, doc_id: String) -> Result<Document> {
        let content = match fs::read_to_string(file_path) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(file_path)?).to_string(),
        };
        Ok(Document::new(doc_id, content, self.redact_pii))
    }

    /// Path below `root` joined with `/`, so `hr/faq.md` and `it/faq.md` stay
    /// distinct while top-level files keep their bare name.
    fn relative_doc_id(root: &Path, file_path: &Path) -> String {
        let relative = file_path.strip_prefix(root).unwrap_or(file_path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| self.extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
            })
            .collect();
        files.sort();
        files
    }
}
