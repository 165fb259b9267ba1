use std::collections::HashMap;

use lsp_types::{RenameParams, TextEdit, WorkspaceEdit};

use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};
use crate::syntax::range_contains;

/// Renames an environment when the cursor sits on either end of the pair;
/// both the `\begin` and the `\end` name are rewritten together.
pub struct EnvironmentRenamer;

impl FeatureProvider for EnvironmentRenamer {
    type Params = RenameParams;
    type Output = Option<WorkspaceEdit>;

    fn execute(
        &self,
        request: &FeatureRequest<RenameParams>,
    ) -> Result<Option<WorkspaceEdit>, ProviderError> {
        let document = request.document();
        let position = request.params().text_document_position.position;
        let new_name = &request.params().new_name;

        let Some(env) = document.tree.environments.iter().find(|env| {
            range_contains(env.begin_name_range, position)
                || range_contains(env.end_name_range, position)
        }) else {
            return Ok(None);
        };

        let edits = vec![
            TextEdit::new(env.begin_name_range, new_name.clone()),
            TextEdit::new(env.end_name_range, new_name.clone()),
        ];
        let mut changes = HashMap::new();
        changes.insert(document.uri.clone(), edits);
        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            ..WorkspaceEdit::default()
        }))
    }
}
