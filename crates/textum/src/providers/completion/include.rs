use std::sync::Arc;

use lsp_types::{CompletionItem, CompletionItemKind, CompletionParams};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};
use crate::workspace::FileProbe;

use super::argument_at;

const INCLUDE_COMMANDS: &[&str] = &["include", "input", "subfile"];

/// Sibling `.tex` files and directories for the argument of an include
/// directive, listed through the workspace's file probe.
pub struct IncludeCompletionProvider {
    probe: Arc<dyn FileProbe>,
}

impl IncludeCompletionProvider {
    pub fn new(probe: Arc<dyn FileProbe>) -> Self {
        Self { probe }
    }
}

impl FeatureProvider for IncludeCompletionProvider {
    type Params = CompletionParams;
    type Output = Vec<CompletionItem>;

    fn execute(
        &self,
        request: &FeatureRequest<CompletionParams>,
    ) -> Result<Vec<CompletionItem>, ProviderError> {
        let document = request.document();
        let position = request.params().text_document_position.position;
        let Some(arg) = argument_at(&document.tree, position, INCLUDE_COMMANDS) else {
            return Ok(Vec::new());
        };

        let base_dir = document
            .uri
            .to_file_path()
            .ok()
            .and_then(|path| path.parent().map(|p| p.to_path_buf()))
            .ok_or_else(|| ProviderError::new("include completion requires a file-backed URI"))?;

        // Complete within the directory part already typed: `parts/in|`
        // lists `parts/`, not the document's own directory.
        let typed = arg.text.as_str();
        let dir = match typed.rsplit_once('/') {
            Some((dir_part, _)) => base_dir.join(dir_part),
            None => base_dir,
        };

        let mut items = Vec::new();
        for entry in self.probe.read_dir(&dir) {
            let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if self.probe.is_file(&entry) {
                if entry.extension().and_then(|e| e.to_str()) == Some("tex") {
                    let stem = entry
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or(name)
                        .to_string();
                    items.push(CompletionItem {
                        label: stem,
                        kind: Some(CompletionItemKind::FILE),
                        ..CompletionItem::default()
                    });
                }
            } else {
                items.push(CompletionItem {
                    label: format!("{name}/"),
                    kind: Some(CompletionItemKind::FOLDER),
                    ..CompletionItem::default()
                });
            }
        }
        Ok(items)
    }
}
