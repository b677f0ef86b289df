use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sieve_core::store::{INFO_STEMMER, INFO_TOKENIZER};
use sieve_core::{DocId, MemoryStore, SearchConfig};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the single index the server builds at startup.
pub const INDEX_NAME: &str = "documents";

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub id: String,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocMeta {
    pub external_id: String,
    pub title: String,
    pub url: Option<String>,
    /// Stored body, used for snippets.
    pub text: String,
}

/// `.json` and `.jsonl` files under `input`, or `input` itself when it is a
/// file. Sorted so document ids are stable across restarts.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

pub fn read_documents(input: &Path) -> Result<Vec<InputDoc>> {
    let mut docs = Vec::new();
    for file in collect_files(input) {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid document", file.display(), n + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("{}: invalid json", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => {}
    }
    Ok(())
}

/// Index `docs` into a fresh store opened from `config`. Document ids are
/// assigned in input order starting at 0.
pub fn build_store(docs: Vec<InputDoc>, config: &SearchConfig) -> Result<(MemoryStore, HashMap<DocId, DocMeta>)> {
    let mut store = config.store.open()?;
    let index = store.create_index(INDEX_NAME);
    if let Some(stemmer) = config.stemmer_kind()? {
        index.set_info(INFO_STEMMER, stemmer.to_string());
    }
    if let Some(tokenizer) = config.tokenizer_kind()? {
        index.set_info(INFO_TOKENIZER, tokenizer.to_string());
    }

    let mut meta: HashMap<DocId, DocMeta> = HashMap::with_capacity(docs.len());
    for (doc_id, doc) in (0..).zip(docs) {
        index.add_document(doc_id, &doc.body)?;
        meta.insert(doc_id, DocMeta { external_id: doc.id, title: doc.title, url: doc.url, text: doc.body });
    }

    tracing::info!(num_docs = meta.len(), num_terms = index.dictionary.len(), "ingested documents");
    Ok((store, meta))
}
