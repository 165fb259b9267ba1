use std::collections::HashMap;

use lsp_types::{RenameParams, TextEdit, Url, WorkspaceEdit};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};
use crate::syntax::range_contains;

/// Renames a label definition together with every reference to it across the
/// whole related set.
pub struct LabelRenamer;

impl FeatureProvider for LabelRenamer {
    type Params = RenameParams;
    type Output = Option<WorkspaceEdit>;

    fn execute(
        &self,
        request: &FeatureRequest<RenameParams>,
    ) -> Result<Option<WorkspaceEdit>, ProviderError> {
        let document = request.document();
        let position = request.params().text_document_position.position;
        let new_name = &request.params().new_name;

        let Some(target) = document
            .tree
            .labels
            .iter()
            .find(|label| range_contains(label.name_range, position))
        else {
            return Ok(None);
        };

        let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        for doc in request.documents() {
            let edits: Vec<TextEdit> = doc
                .tree
                .labels
                .iter()
                .filter(|label| label.name == target.name)
                .map(|label| TextEdit::new(label.name_range, new_name.clone()))
                .collect();
            if !edits.is_empty() {
                changes.insert(doc.uri.clone(), edits);
            }
        }
        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            ..WorkspaceEdit::default()
        }))
    }
}
