use std::collections::HashSet;

use lsp_types::{CompletionItem, CompletionItemKind, CompletionParams};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};

use super::argument_at;

/// Environment names inside `\begin{...}` / `\end{...}`: the built-in set
/// plus every environment already used somewhere in the related set.
pub struct EnvironmentCompletionProvider;

const BUILTIN_ENVIRONMENTS: &[&str] = &[
    "document",
    "abstract",
    "itemize",
    "enumerate",
    "description",
    "figure",
    "table",
    "tabular",
    "equation",
    "align",
    "array",
    "center",
    "verbatim",
    "quote",
    "minipage",
    "theorem",
    "proof",
];

impl FeatureProvider for EnvironmentCompletionProvider {
    type Params = CompletionParams;
    type Output = Vec<CompletionItem>;

    fn execute(
        &self,
        request: &FeatureRequest<CompletionParams>,
    ) -> Result<Vec<CompletionItem>, ProviderError> {
        let position = request.params().text_document_position.position;
        if argument_at(&request.document().tree, position, &["begin", "end"]).is_none() {
            return Ok(Vec::new());
        }

        let mut labels: Vec<String> = BUILTIN_ENVIRONMENTS.iter().map(|s| s.to_string()).collect();
        let mut seen: HashSet<&str> = BUILTIN_ENVIRONMENTS.iter().copied().collect();
        for doc in request.documents() {
            for env in &doc.tree.environments {
                if seen.insert(env.name.as_str()) {
                    labels.push(env.name.clone());
                }
            }
        }

        Ok(labels
            .into_iter()
            .map(|label| CompletionItem {
                label,
                kind: Some(CompletionItemKind::ENUM),
                detail: Some("environment".to_string()),
                ..CompletionItem::default()
            })
            .collect())
    }
}
