use lsp_types::{RenameParams, WorkspaceEdit};

use super::ChoiceProvider;

mod environment;
mod label;

pub use environment::EnvironmentRenamer;
pub use label::LabelRenamer;

/// Renamers are raced, not merged: the first one matching the position wins,
/// so the response is always one coherent edit set.
pub fn rename_provider() -> ChoiceProvider<RenameParams, WorkspaceEdit> {
    ChoiceProvider::new(vec![Box::new(EnvironmentRenamer), Box::new(LabelRenamer)])
}
