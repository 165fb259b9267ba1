use std::collections::HashSet;

use lsp_types::{CompletionItem, CompletionItemKind, CompletionParams};

use crate::document::offset_at;
use crate::providers::{FeatureProvider, FeatureRequest, ProviderError};
use crate::syntax::range_contains;

/// Kernel control sequences plus every command already used across the
/// related set, offered while the cursor sits in a `\...` word.
pub struct CommandCompletionProvider;

const KERNEL_COMMANDS: &[&str] = &[
    "begin",
    "end",
    "documentclass",
    "usepackage",
    "include",
    "input",
    "section",
    "subsection",
    "subsubsection",
    "chapter",
    "part",
    "paragraph",
    "label",
    "ref",
    "eqref",
    "autoref",
    "pageref",
    "cite",
    "caption",
    "item",
    "emph",
    "textbf",
    "textit",
    "texttt",
    "title",
    "author",
    "date",
    "maketitle",
    "tableofcontents",
    "footnote",
    "newcommand",
    "includegraphics",
];

impl FeatureProvider for CommandCompletionProvider {
    type Params = CompletionParams;
    type Output = Vec<CompletionItem>;

    fn execute(
        &self,
        request: &FeatureRequest<CompletionParams>,
    ) -> Result<Vec<CompletionItem>, ProviderError> {
        let document = request.document();
        let position = request.params().text_document_position.position;
        if command_prefix(&document.text, position).is_none() {
            return Ok(Vec::new());
        }

        let mut labels: Vec<String> = KERNEL_COMMANDS.iter().map(|s| s.to_string()).collect();
        let mut seen: HashSet<&str> = KERNEL_COMMANDS.iter().copied().collect();
        for (idx, doc) in request.documents().iter().enumerate() {
            for cmd in &doc.tree.commands {
                // The half-typed command under the cursor is not a candidate.
                if idx == 0 && range_contains(cmd.name_range, position) {
                    continue;
                }
                if seen.insert(cmd.name.as_str()) {
                    labels.push(cmd.name.clone());
                }
            }
        }

        Ok(labels
            .into_iter()
            .map(|label| CompletionItem {
                label,
                kind: Some(CompletionItemKind::FUNCTION),
                ..CompletionItem::default()
            })
            .collect())
    }
}

/// The partial command name the cursor is in, if the word is introduced by a
/// backslash: `\sec|` yields `sec`, `\|` yields the empty string.
fn command_prefix(text: &str, position: lsp_types::Position) -> Option<String> {
    let offset = offset_at(text, position).min(text.len());
    let prefix = &text[..offset];
    let word_start = prefix
        .rfind(|ch: char| !ch.is_ascii_alphabetic())
        .map(|idx| idx + prefix[idx..].chars().next().map_or(1, char::len_utf8))?;
    if !prefix[..word_start].ends_with('\\') {
        return None;
    }
    Some(prefix[word_start..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;

    #[test]
    fn prefix_requires_backslash() {
        assert_eq!(
            command_prefix("\\sec", Position::new(0, 4)).as_deref(),
            Some("sec")
        );
        assert_eq!(
            command_prefix("\\", Position::new(0, 1)).as_deref(),
            Some("")
        );
        assert_eq!(command_prefix("sec", Position::new(0, 3)), None);
    }
}
