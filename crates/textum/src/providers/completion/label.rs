use std::collections::HashSet;

use lsp_types::{CompletionItem, CompletionItemKind, CompletionParams};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};
use crate::syntax::LabelKind;

use super::argument_at;

const REFERENCE_COMMANDS: &[&str] = &["ref", "eqref", "autoref", "pageref", "cref", "Cref"];

/// Label definitions from the whole related set, offered inside the argument
/// of a reference command.
pub struct LabelCompletionProvider;

impl FeatureProvider for LabelCompletionProvider {
    type Params = CompletionParams;
    type Output = Vec<CompletionItem>;

    fn execute(
        &self,
        request: &FeatureRequest<CompletionParams>,
    ) -> Result<Vec<CompletionItem>, ProviderError> {
        let position = request.params().text_document_position.position;
        if argument_at(&request.document().tree, position, REFERENCE_COMMANDS).is_none() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for doc in request.documents() {
            for label in &doc.tree.labels {
                if label.kind != LabelKind::Definition {
                    continue;
                }
                if !seen.insert(label.name.clone()) {
                    continue;
                }
                items.push(CompletionItem {
                    label: label.name.clone(),
                    kind: Some(CompletionItemKind::REFERENCE),
                    detail: doc
                        .uri
                        .path_segments()
                        .and_then(|segments| segments.last().map(str::to_string)),
                    ..CompletionItem::default()
                });
            }
        }
        Ok(items)
    }
}
