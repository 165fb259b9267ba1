use textum::providers::{ChoiceProvider, ConcatProvider};
use textum::{
    completion_provider, folding_provider, rename_provider, OrderedCompletionProvider, Workspace,
};
use tower_lsp::lsp_types::{FoldingRange, FoldingRangeParams, RenameParams, WorkspaceEdit};

/// Everything behind the workspace lock: the document map and the provider
/// registries. One handler at a time owns this, for its whole duration.
pub(super) struct ServerState {
    pub(super) workspace: Workspace,
    pub(super) completion: OrderedCompletionProvider,
    pub(super) folding: ConcatProvider<FoldingRangeParams, FoldingRange>,
    pub(super) rename: ChoiceProvider<RenameParams, WorkspaceEdit>,
}

impl Default for ServerState {
    fn default() -> Self {
        let workspace = Workspace::new();
        let completion = completion_provider(workspace.probe());
        Self {
            workspace,
            completion,
            folding: folding_provider(),
            rename: rename_provider(),
        }
    }
}
