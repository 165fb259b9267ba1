use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use lsp_types::{TextDocumentContentChangeEvent, Url};
use thiserror::Error;

use crate::document::{offset_at, Document, LanguageKind};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("document already open: {0}")]
    DuplicateDocument(Url),
    #[error("document not tracked: {0}")]
    UnknownDocument(Url),
}

/// Filesystem questions the workspace needs answered. The default probe asks
/// the real filesystem; tests substitute an in-memory view.
pub trait FileProbe: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;

    /// Entries of `dir`, sorted by name. Missing directories yield nothing.
    fn read_dir(&self, dir: &Path) -> Vec<PathBuf>;
}

pub struct OsFileProbe;

impl FileProbe for OsFileProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
        paths.sort();
        paths
    }
}

/// The owning collection of open documents plus include resolution.
///
/// Documents are stored in creation order; lookups that scan all documents
/// therefore have deterministic first-match semantics. All mutation happens
/// through `open`/`update`/`close` while the caller holds exclusive access,
/// so readers only ever see fully analyzed documents.
pub struct Workspace {
    documents: Vec<Arc<Document>>,
    index: HashMap<Url, usize>,
    probe: Arc<dyn FileProbe>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_probe(Arc::new(OsFileProbe))
    }

    pub fn with_probe(probe: Arc<dyn FileProbe>) -> Self {
        Self {
            documents: Vec::new(),
            index: HashMap::new(),
            probe,
        }
    }

    pub fn probe(&self) -> Arc<dyn FileProbe> {
        Arc::clone(&self.probe)
    }

    /// Tracks a newly opened document. Re-opening a tracked URI is rejected;
    /// the already-open document stays authoritative.
    pub fn open(
        &mut self,
        uri: Url,
        language_id: &str,
        text: String,
        version: i32,
    ) -> Result<(), WorkspaceError> {
        if self.index.contains_key(&uri) {
            return Err(WorkspaceError::DuplicateDocument(uri));
        }
        let language = LanguageKind::of(language_id);
        tracing::debug!(%uri, ?language, version, "open document");
        let document = Arc::new(Document::new(uri.clone(), language, text, version));
        self.index.insert(uri, self.documents.len());
        self.documents.push(document);
        Ok(())
    }

    /// Applies a batch of edits and re-analyzes. Each incremental edit is
    /// applied against the text the previous edit in the batch produced. A
    /// version not strictly greater than the stored one is a stale delivery
    /// and the whole batch is dropped.
    pub fn update(
        &mut self,
        uri: &Url,
        changes: &[TextDocumentContentChangeEvent],
        version: i32,
    ) -> Result<(), WorkspaceError> {
        let idx = *self
            .index
            .get(uri)
            .ok_or_else(|| WorkspaceError::UnknownDocument(uri.clone()))?;
        let current = &self.documents[idx];
        if version <= current.version {
            tracing::debug!(%uri, version, stored = current.version, "stale change ignored");
            return Ok(());
        }
        let language = current.language;
        let mut text = current.text.clone();
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = offset_at(&text, range.start);
                    let end = offset_at(&text, range.end).max(start);
                    text.replace_range(start..end, &change.text);
                }
                None => text = change.text.clone(),
            }
        }
        self.documents[idx] = Arc::new(Document::new(uri.clone(), language, text, version));
        Ok(())
    }

    /// Drops the document from the open set. The file itself remains
    /// resolvable through the probe, so links from other documents survive.
    pub fn close(&mut self, uri: &Url) {
        let Some(idx) = self.index.remove(uri) else {
            return;
        };
        self.documents.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        tracing::debug!(%uri, "closed document");
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<Document>> {
        self.index.get(uri).map(|&idx| Arc::clone(&self.documents[idx]))
    }

    /// Open documents in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Maps an include target to a concrete document URI: relative targets
    /// are joined against the base document's directory, a bare name also
    /// tries the `.tex` extension, and a candidate counts if it is either an
    /// open document or a file the probe can see.
    pub fn resolve(&self, base: &Url, target: &str) -> Option<Url> {
        let base_path = base.to_file_path().ok()?;
        let base_dir = base_path.parent()?;
        let raw = Path::new(target);
        let joined = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            base_dir.join(raw)
        };

        let mut candidates = vec![normalize(&joined)];
        if joined.extension().is_none() {
            candidates.push(normalize(&joined.with_extension("tex")));
        }

        for candidate in candidates {
            let Ok(uri) = Url::from_file_path(&candidate) else {
                continue;
            };
            if self.index.contains_key(&uri) || self.probe.is_file(&candidate) {
                return Some(uri);
            }
        }
        None
    }

    /// The root document followed by everything transitively reachable over
    /// its include directives: depth-first, includes in source order, each
    /// document visited once (cycles and diamonds collapse), unresolvable
    /// targets skipped. Untracked roots yield an empty set.
    pub fn related(&self, uri: &Url) -> Vec<Arc<Document>> {
        let Some(root) = self.get(uri) else {
            return Vec::new();
        };
        let mut visited: HashSet<Url> = HashSet::new();
        visited.insert(root.uri.clone());
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(document) = stack.pop() {
            let mut children = Vec::new();
            for include in &document.tree.includes {
                let Some(target) = self.resolve(&document.uri, &include.path) else {
                    continue;
                };
                if !visited.insert(target.clone()) {
                    continue;
                }
                // Targets that resolve to a file on disk but are not open
                // contribute nothing to traverse.
                if let Some(child) = self.get(&target) {
                    children.push(child);
                }
            }
            out.push(document);
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

/// Lexical normalization (no filesystem access), so `a/../b` and `./b`
/// compare equal to the URI of an open document at `b`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}
