mod chunking;
mod tokenize;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use copilot_core::RetrievedPassage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

pub use chunking::chunk_document;

pub const DEFAULT_TOP_K: usize = 4;

/// The retrieval gateway. The pipeline only depends on this contract, so the
/// bundled keyword retriever can be swapped for any other search backend.
pub trait PolicyRetriever: Send + Sync {
    fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedPassage>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDoc {
    pub id: String,
    pub title: String,
    pub source_path: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    doc_id: String,
    title: String,
    source_path: String,
    text: String,
    keywords: HashSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStats {
    pub docs_loaded: usize,
    pub chunks_loaded: usize,
}

/// Keyword-overlap retriever over a chunked markdown/text corpus directory.
#[derive(Clone)]
pub struct KeywordRetriever {
    docs: Vec<PolicyDoc>,
    chunks: Vec<IndexedChunk>,
}

impl KeywordRetriever {
    pub fn from_corpus_dir(path: impl AsRef<Path>) -> Result<Self> {
        let docs = load_docs(path.as_ref())?;
        let mut chunks = Vec::new();

        for doc in &docs {
            for chunk in chunk_document(&doc.body, 420) {
                let keywords = tokenize::tokenize(&chunk).into_iter().collect::<HashSet<_>>();
                chunks.push(IndexedChunk {
                    doc_id: doc.id.clone(),
                    title: doc.title.clone(),
                    source_path: doc.source_path.clone(),
                    text: chunk,
                    keywords,
                });
            }
        }

        Ok(Self { docs, chunks })
    }

    pub fn stats(&self) -> RetrievalStats {
        RetrievalStats {
            docs_loaded: self.docs.len(),
            chunks_loaded: self.chunks.len(),
        }
    }

    pub fn list_docs(&self) -> &[PolicyDoc] {
        &self.docs
    }
}

impl PolicyRetriever for KeywordRetriever {
    fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedPassage> {
        let query_tokens = tokenize::tokenize(query).into_iter().collect::<HashSet<_>>();

        let mut scored = self
            .chunks
            .iter()
            .map(|chunk| (keyword_score(&query_tokens, &chunk.keywords), chunk))
            .filter(|(score, _)| *score > 0.0)
            .collect::<Vec<_>>();

        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, chunk)| RetrievedPassage {
                doc_id: chunk.doc_id.clone(),
                title: chunk.title.clone(),
                snippet: snippet(&chunk.text, 220),
                score,
                source_path: chunk.source_path.clone(),
            })
            .collect()
    }
}

fn load_docs(root: &Path) -> Result<Vec<PolicyDoc>> {
    let heading_regex = Regex::new(r"(?m)^#\s+(.+)$")?;

    let mut docs = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            matches!(
                entry.path().extension().and_then(|ext| ext.to_str()),
                Some("md") | Some("txt")
            )
        })
    {
        let path = entry.path();
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading policy document: {}", path.display()))?;

        let rel_path = path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| path.to_string_lossy().to_string());

        let title = heading_regex
            .captures(&body)
            .and_then(|captures| captures.get(1).map(|value| value.as_str().trim().to_string()))
            .unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("untitled")
                    .replace('-', " ")
            });

        docs.push(PolicyDoc {
            id: rel_path.replace('/', "::"),
            title,
            source_path: rel_path,
            body,
        });
    }

    Ok(docs)
}

fn keyword_score(query_tokens: &HashSet<String>, doc_tokens: &HashSet<String>) -> f32 {
    if query_tokens.is_empty() || doc_tokens.is_empty() {
        return 0.0;
    }

    let overlap = query_tokens
        .iter()
        .filter(|token| doc_tokens.contains(*token))
        .count() as f32;

    overlap / query_tokens.len() as f32
}

fn snippet(input: &str, max_chars: usize) -> String {
    let compact = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= max_chars {
        compact
    } else {
        compact.chars().take(max_chars).collect::<String>() + "..."
    }
}
