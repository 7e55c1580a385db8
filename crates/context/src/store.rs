//! Context document store
//!
//! Documents are chunked at ingest and indexed by their token sets.
//! Retrieval is lexical overlap scoring: cheap, deterministic, and good
//! enough to hand a translator nearby terminology. The store implements
//! the `ContextProvider` trait the translation stage depends on.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use speech_bridge_core::text::{is_blank, normalize_text};
use speech_bridge_core::{ContextProvider, Error, Result};
use speech_bridge_config::ContextSettings;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::chunker::chunk_text;
use crate::vocab::{glossary_pairs, key_terms};

struct Chunk {
    text: String,
    tokens: HashSet<String>,
}

struct ContextEntry {
    name: String,
    language: String,
    text: String,
    chunks: Vec<Chunk>,
    created_at: DateTime<Utc>,
}

/// Summary of one ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextInfo {
    pub context_id: Uuid,
    pub name: String,
    pub language: String,
    pub chunk_count: usize,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

fn tokenize(text: &str) -> HashSet<String> {
    normalize_text(text)
        .unicode_words()
        .map(|w| w.to_string())
        .collect()
}

/// In-memory registry of reference documents
pub struct ContextStore {
    settings: ContextSettings,
    entries: RwLock<HashMap<Uuid, ContextEntry>>,
}

impl ContextStore {
    pub fn new(settings: ContextSettings) -> Self {
        Self {
            settings,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Ingest raw text, returning the new context id
    pub fn load_text(&self, name: &str, language: &str, text: &str) -> Result<Uuid> {
        if is_blank(text) {
            return Err(Error::validation("context document is empty"));
        }

        let chunks: Vec<Chunk> =
            chunk_text(text, self.settings.chunk_words, self.settings.overlap_words)
                .into_iter()
                .map(|c| Chunk {
                    tokens: tokenize(&c),
                    text: c,
                })
                .collect();

        let context_id = Uuid::new_v4();
        let entry = ContextEntry {
            name: name.to_string(),
            language: language.to_string(),
            text: text.to_string(),
            chunks,
            created_at: Utc::now(),
        };

        tracing::info!(
            %context_id,
            name,
            language,
            chunks = entry.chunks.len(),
            "context document ingested"
        );
        self.entries.write().insert(context_id, entry);
        Ok(context_id)
    }

    /// Ingest a UTF-8 text file; the file stem becomes the document name
    pub fn load_file(&self, path: &Path, language: &str) -> Result<Uuid> {
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        self.load_text(name, language, &text)
    }

    /// Replace a document's text, re-chunking under the same id. Name and
    /// language stay unless given.
    pub fn update(
        &self,
        context_id: Uuid,
        name: Option<&str>,
        language: Option<&str>,
        text: &str,
    ) -> Result<()> {
        if is_blank(text) {
            return Err(Error::validation("context document is empty"));
        }
        let chunks: Vec<Chunk> =
            chunk_text(text, self.settings.chunk_words, self.settings.overlap_words)
                .into_iter()
                .map(|c| Chunk {
                    tokens: tokenize(&c),
                    text: c,
                })
                .collect();

        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&context_id)
            .ok_or(Error::UnknownContext(context_id))?;
        if let Some(name) = name {
            entry.name = name.to_string();
        }
        if let Some(language) = language {
            entry.language = language.to_string();
        }
        entry.text = text.to_string();
        entry.chunks = chunks;
        tracing::info!(%context_id, chunks = entry.chunks.len(), "context document updated");
        Ok(())
    }

    pub fn info(&self, context_id: Uuid) -> Result<ContextInfo> {
        let entries = self.entries.read();
        let entry = entries
            .get(&context_id)
            .ok_or(Error::UnknownContext(context_id))?;
        Ok(Self::describe(context_id, entry))
    }

    pub fn list(&self) -> Vec<ContextInfo> {
        let entries = self.entries.read();
        let mut infos: Vec<ContextInfo> = entries
            .iter()
            .map(|(id, entry)| Self::describe(*id, entry))
            .collect();
        infos.sort_by_key(|i| i.created_at);
        infos
    }

    /// Drop a document; registry and index entries go together
    pub fn remove(&self, context_id: Uuid) -> Result<()> {
        self.entries
            .write()
            .remove(&context_id)
            .map(|_| ())
            .ok_or(Error::UnknownContext(context_id))
    }

    /// Frequency-ranked key terms for a document
    pub fn key_terms(&self, context_id: Uuid, max_terms: usize) -> Result<Vec<String>> {
        let entries = self.entries.read();
        let entry = entries
            .get(&context_id)
            .ok_or(Error::UnknownContext(context_id))?;
        Ok(key_terms(&entry.text, max_terms))
    }

    fn describe(context_id: Uuid, entry: &ContextEntry) -> ContextInfo {
        ContextInfo {
            context_id,
            name: entry.name.clone(),
            language: entry.language.clone(),
            chunk_count: entry.chunks.len(),
            word_count: entry.text.unicode_words().count(),
            created_at: entry.created_at,
        }
    }

    /// Top-`limit` chunks by token overlap with the query
    fn retrieve(&self, context_id: Uuid, query: &str, limit: usize) -> Result<Vec<String>> {
        let entries = self.entries.read();
        let entry = entries
            .get(&context_id)
            .ok_or(Error::UnknownContext(context_id))?;

        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &Chunk)> = entry
            .chunks
            .iter()
            .map(|chunk| {
                let overlap = chunk.tokens.intersection(&query_tokens).count();
                (overlap, chunk)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);

        Ok(scored.into_iter().map(|(_, c)| c.text.clone()).collect())
    }
}

#[async_trait::async_trait]
impl ContextProvider for ContextStore {
    async fn context_for_text(
        &self,
        text: &str,
        context_id: Uuid,
        limit: usize,
    ) -> Result<String> {
        let snippets = self.retrieve(context_id, text, limit.max(1))?;
        Ok(snippets.join("\n\n"))
    }

    async fn domain_vocabulary(
        &self,
        context_id: Uuid,
        source_lang: &str,
        _target_lang: &str,
    ) -> Result<HashMap<String, String>> {
        let entries = self.entries.read();
        let entry = entries
            .get(&context_id)
            .ok_or(Error::UnknownContext(context_id))?;

        // Glossary lines map document-language terms to their translations;
        // a document in another language has nothing for this pair.
        if !entry.language.is_empty() && entry.language != source_lang {
            return Ok(HashMap::new());
        }
        Ok(glossary_pairs(&entry.text, self.settings.max_terms))
    }
}
