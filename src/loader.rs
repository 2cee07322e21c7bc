//! Loading schemas and documents from disk

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::compiler::Compiler;
use crate::schematic::Schematic;
use crate::value::Value;

/// Read a JSON file into a value
pub fn load_document(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse JSON in {}: {}", path.display(), e))?;
    Ok(Value::from(json))
}

/// Read and compile a JSON schema file
pub fn load_schema(path: &Path, compiler: &Compiler) -> anyhow::Result<Schematic> {
    let raw = load_document(path)?;
    compiler
        .schematic(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid schema in {}: {}", path.display(), e))
}

/// Expand paths into JSON documents: files are kept as given, directories
/// are walked for `*.json` files in sorted order
pub fn collect_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut documents = Vec::new();

    for path in paths {
        if !path.is_dir() {
            documents.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        documents.extend(found);
    }

    documents
}
