use std::sync::Arc;

use lsp_types::{CompletionItem, CompletionParams, Position};

use crate::syntax::{range_contains, Argument, SyntaxTree};
use crate::workspace::FileProbe;

use super::{ConcatProvider, OrderedCompletionProvider};

mod command;
mod environment;
mod include;
mod label;

pub use command::CommandCompletionProvider;
pub use environment::EnvironmentCompletionProvider;
pub use include::IncludeCompletionProvider;
pub use label::LabelCompletionProvider;

/// The full completion pipeline: all variants merged, then deduplicated,
/// ranked and capped. Registration order is the tie-break order.
pub fn completion_provider(probe: Arc<dyn FileProbe>) -> OrderedCompletionProvider {
    let aggregate: ConcatProvider<CompletionParams, CompletionItem> = ConcatProvider::new(vec![
        Box::new(EnvironmentCompletionProvider),
        Box::new(LabelCompletionProvider),
        Box::new(IncludeCompletionProvider::new(probe)),
        Box::new(CommandCompletionProvider),
    ]);
    OrderedCompletionProvider::new(aggregate)
}

/// The first argument of the innermost command named in `names` whose
/// argument range contains `position`.
fn argument_at<'a>(
    tree: &'a SyntaxTree,
    position: Position,
    names: &[&str],
) -> Option<&'a Argument> {
    tree.commands
        .iter()
        .filter(|cmd| names.contains(&cmd.name.as_str()))
        .flat_map(|cmd| cmd.args.first())
        .find(|arg| range_contains(arg.range, position))
}
