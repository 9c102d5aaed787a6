//! Local keyword index over a knowledge-base directory.
//!
//! Every `*.md` / `*.txt` file under the directory is split into
//! paragraphs. A paragraph scores the fraction of the query's content
//! terms it contains; paragraphs with no shared term are dropped.

use agentrail_core::error::RetrievalError;
use agentrail_core::query::{Passage, content_terms, rank_passages};
use agentrail_core::retrieval::Retriever;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Chunk {
    doc_id: String,
    text: String,
    lowered: String,
}

pub struct KeywordRetriever {
    kb_dir: PathBuf,
    index: OnceCell<Vec<Chunk>>,
}

impl KeywordRetriever {
    pub fn new(kb_dir: impl Into<PathBuf>) -> Self {
        Self {
            kb_dir: kb_dir.into(),
            index: OnceCell::new(),
        }
    }

    pub fn kb_dir(&self) -> &Path {
        &self.kb_dir
    }

    async fn index(&self) -> Result<&[Chunk], RetrievalError> {
        let chunks = self
            .index
            .get_or_try_init(|| load_chunks(&self.kb_dir))
            .await?;
        Ok(chunks.as_slice())
    }
}

async fn load_chunks(dir: &Path) -> Result<Vec<Chunk>, RetrievalError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        RetrievalError::Unavailable(format!("knowledge base {}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RetrievalError::Unavailable(e.to_string()))?
    {
        let path = entry.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("txt"));
        if is_text {
            files.push(path);
        }
    }
    files.sort();

    let mut chunks = Vec::new();
    for path in files {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let content = content.replace("\r\n", "\n");
        let paragraphs: Vec<&str> = content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        let single = paragraphs.len() == 1;
        for (i, paragraph) in paragraphs.into_iter().enumerate() {
            chunks.push(Chunk {
                doc_id: if single {
                    name.clone()
                } else {
                    format!("{name}#{}", i + 1)
                },
                text: paragraph.to_string(),
                lowered: paragraph.to_lowercase(),
            });
        }
    }

    info!(dir = %dir.display(), chunks = chunks.len(), "Indexed knowledge base");
    Ok(chunks)
}

#[async_trait]
impl Retriever for KeywordRetriever {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn fetch(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        let terms = content_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = self.index().await?;
        let passages: Vec<Passage> = chunks
            .iter()
            .filter_map(|chunk| {
                let hits = terms
                    .iter()
                    .filter(|t| chunk.lowered.contains(t.as_str()))
                    .count();
                (hits > 0).then(|| {
                    Passage::new(
                        chunk.doc_id.clone(),
                        chunk.text.clone(),
                        hits as f32 / terms.len() as f32,
                    )
                })
            })
            .collect();

        debug!(query, candidates = passages.len(), "Keyword search");
        Ok(rank_passages(passages, k))
    }
}
