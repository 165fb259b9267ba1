use lsp_types::{DocumentLink, DocumentSymbol, Position, Range, SymbolKind, Url};

use crate::syntax::SyntaxTree;
use crate::workspace::Workspace;

/// Whether a document carries markup this server analyzes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageKind {
    Markup,
    Other,
}

impl LanguageKind {
    pub fn of(language_id: &str) -> Self {
        match language_id {
            "latex" | "tex" | "plaintex" => LanguageKind::Markup,
            _ => LanguageKind::Other,
        }
    }
}

/// One open file: text, version, and the analysis derived from that text.
///
/// A `Document` is immutable once constructed; the tree is built together
/// with the text, so a request handler can never observe a document whose
/// analysis lags behind its content. Edits produce a replacement document
/// that the [`Workspace`] swaps in.
#[derive(Debug)]
pub struct Document {
    pub uri: Url,
    pub language: LanguageKind,
    pub text: String,
    pub version: i32,
    pub tree: SyntaxTree,
}

impl Document {
    pub fn new(uri: Url, language: LanguageKind, text: String, version: i32) -> Self {
        let tree = match language {
            LanguageKind::Markup => SyntaxTree::parse(&text),
            LanguageKind::Other => SyntaxTree::default(),
        };
        Self {
            uri,
            language,
            text,
            version,
            tree,
        }
    }

    /// Sections (nested by level) followed by environments, from this
    /// document's own tree only.
    #[allow(deprecated)]
    pub fn document_symbols(&self) -> Vec<DocumentSymbol> {
        let mut symbols: Vec<DocumentSymbol> = Vec::new();
        // Stack of (level, index path into `symbols`) for section nesting.
        let mut open: Vec<(u8, usize)> = Vec::new();

        fn child_slot<'a>(
            symbols: &'a mut Vec<DocumentSymbol>,
            open: &[(u8, usize)],
        ) -> &'a mut Vec<DocumentSymbol> {
            let mut slot = symbols;
            for &(_, idx) in open {
                slot = slot[idx].children.get_or_insert_with(Vec::new);
            }
            slot
        }

        for section in &self.tree.sections {
            while let Some(&(level, _)) = open.last() {
                if level >= section.level {
                    open.pop();
                } else {
                    break;
                }
            }
            let symbol = DocumentSymbol {
                name: if section.title.is_empty() {
                    "(untitled)".to_string()
                } else {
                    section.title.clone()
                },
                detail: None,
                kind: SymbolKind::MODULE,
                tags: None,
                deprecated: None,
                range: section.full_range,
                selection_range: Range::new(section.full_range.start, section.full_range.start),
                children: None,
            };
            let slot = child_slot(&mut symbols, &open);
            slot.push(symbol);
            open.push((section.level, slot.len() - 1));
        }

        for env in &self.tree.environments {
            symbols.push(DocumentSymbol {
                name: env.name.clone(),
                detail: Some("environment".to_string()),
                kind: SymbolKind::OBJECT,
                tags: None,
                deprecated: None,
                range: env.full_range,
                selection_range: env.begin_name_range,
                children: None,
            });
        }

        symbols
    }

    /// One link per include directive whose target resolves; directives the
    /// workspace cannot resolve are omitted rather than reported.
    pub fn document_links(&self, workspace: &Workspace) -> Vec<DocumentLink> {
        self.tree
            .includes
            .iter()
            .filter_map(|include| {
                let target = workspace.resolve(&self.uri, &include.path)?;
                Some(DocumentLink {
                    range: include.path_range,
                    target: Some(target),
                    tooltip: None,
                    data: None,
                })
            })
            .collect()
    }
}

/// Byte offset of an LSP position (UTF-16 columns) within `text`.
pub fn offset_at(text: &str, position: Position) -> usize {
    let mut line = 0u32;
    let mut character = 0u32;
    for (offset, ch) in text.char_indices() {
        if line == position.line && character >= position.character {
            return offset;
        }
        if line > position.line {
            return offset;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += ch.len_utf16() as u32;
        }
    }
    text.len()
}

/// The identifier-like word immediately before `position`.
pub fn word_before(text: &str, position: Position) -> String {
    let offset = offset_at(text, position).min(text.len());
    let prefix = &text[..offset];
    let word_start = prefix
        .rfind(|ch: char| !ch.is_alphanumeric() && ch != '_' && ch != ':' && ch != '-')
        .map(|idx| idx + prefix[idx..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    prefix[word_start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_kind_mapping() {
        assert_eq!(LanguageKind::of("latex"), LanguageKind::Markup);
        assert_eq!(LanguageKind::of("tex"), LanguageKind::Markup);
        assert_eq!(LanguageKind::of("markdown"), LanguageKind::Other);
    }

    #[test]
    fn other_documents_get_empty_analysis() {
        let uri = Url::parse("file:///notes.txt").unwrap();
        let doc = Document::new(
            uri,
            LanguageKind::Other,
            "\\section{ignored}".to_string(),
            0,
        );
        assert!(doc.tree.commands.is_empty());
        assert!(doc.document_symbols().is_empty());
    }

    #[test]
    fn symbols_nest_sections_by_level() {
        let uri = Url::parse("file:///main.tex").unwrap();
        let text = "\\section{A}\n\\subsection{A1}\n\\section{B}\n";
        let doc = Document::new(uri, LanguageKind::Markup, text.to_string(), 0);
        let symbols = doc.document_symbols();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "A");
        let children = symbols[0].children.as_ref().unwrap();
        assert_eq!(children[0].name, "A1");
        assert_eq!(symbols[1].name, "B");
    }

    #[test]
    fn offset_at_counts_utf16_columns() {
        let text = "αβ x\ny";
        // 'α' and 'β' are one UTF-16 unit but two bytes each.
        assert_eq!(offset_at(text, Position::new(0, 2)), 4);
        assert_eq!(offset_at(text, Position::new(1, 0)), 6);
        assert_eq!(offset_at(text, Position::new(5, 0)), text.len());
    }

    #[test]
    fn word_before_cursor() {
        let text = "\\ref{sec:intro";
        assert_eq!(word_before(text, Position::new(0, 14)), "sec:intro");
        assert_eq!(word_before(text, Position::new(0, 5)), "");
    }
}
