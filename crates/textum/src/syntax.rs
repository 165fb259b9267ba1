use lsp_types::{Position, Range};

/// Derived analysis of one document's text.
///
/// Produced by [`SyntaxTree::parse`], a pure function of the text: the tree
/// never looks at other documents, so analysis stays independent per file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntaxTree {
    pub commands: Vec<Command>,
    pub includes: Vec<Include>,
    pub environments: Vec<Environment>,
    pub sections: Vec<Section>,
    pub labels: Vec<Label>,
}

/// A control sequence `\name` together with its brace arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    /// Range of `\name` including the backslash.
    pub name_range: Range,
    /// Range from the backslash through the last argument.
    pub range: Range,
    pub args: Vec<Argument>,
}

/// One `{...}` argument; `range` covers the text between the braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub text: String,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Include,
    Input,
    Subfile,
    Import,
}

/// An include/import directive extracted from a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub kind: IncludeKind,
    pub path: String,
    pub path_range: Range,
}

/// A matched `\begin{x}` .. `\end{x}` pair. Unmatched `\begin`s are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub name: String,
    pub begin_name_range: Range,
    pub end_name_range: Range,
    pub full_range: Range,
}

/// A sectioning command. `full_range` runs from the command to the start of
/// the next section of equal or higher level (or the end of the document).
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub level: u8,
    pub title: String,
    pub full_range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Definition,
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub kind: LabelKind,
    pub name: String,
    pub name_range: Range,
}

const SECTION_COMMANDS: &[(&str, u8)] = &[
    ("part", 0),
    ("chapter", 1),
    ("section", 2),
    ("subsection", 3),
    ("subsubsection", 4),
    ("paragraph", 5),
    ("subparagraph", 6),
];

const REFERENCE_COMMANDS: &[&str] = &["ref", "eqref", "autoref", "pageref", "cref", "Cref"];

impl SyntaxTree {
    pub fn parse(text: &str) -> Self {
        let mut scanner = Scanner::new(text);
        let commands = scanner.scan();
        let end_of_text = scanner.position();

        let mut tree = SyntaxTree {
            commands,
            ..SyntaxTree::default()
        };
        tree.extract_includes();
        tree.extract_environments();
        tree.extract_sections(end_of_text);
        tree.extract_labels();
        tree
    }

    fn extract_includes(&mut self) {
        for cmd in &self.commands {
            let kind = match cmd.name.as_str() {
                "include" => IncludeKind::Include,
                "input" => IncludeKind::Input,
                "subfile" => IncludeKind::Subfile,
                "import" => IncludeKind::Import,
                _ => continue,
            };
            let include = match kind {
                IncludeKind::Import => {
                    // `\import{dir}{file}`
                    let (Some(dir), Some(file)) = (cmd.args.first(), cmd.args.get(1)) else {
                        continue;
                    };
                    let dir = dir.text.trim();
                    let file = file.text.trim();
                    if file.is_empty() {
                        continue;
                    }
                    let path = if dir.is_empty() || dir.ends_with('/') {
                        format!("{dir}{file}")
                    } else {
                        format!("{dir}/{file}")
                    };
                    Include {
                        kind,
                        path,
                        path_range: cmd.args[1].range,
                    }
                }
                _ => {
                    let Some(arg) = cmd.args.first() else { continue };
                    let path = arg.text.trim().to_string();
                    if path.is_empty() {
                        continue;
                    }
                    Include {
                        kind,
                        path,
                        path_range: arg.range,
                    }
                }
            };
            self.includes.push(include);
        }
    }

    fn extract_environments(&mut self) {
        let mut stack: Vec<(String, Range, Position)> = Vec::new();
        for cmd in &self.commands {
            match cmd.name.as_str() {
                "begin" => {
                    if let Some(arg) = cmd.args.first() {
                        let name = arg.text.trim().to_string();
                        if !name.is_empty() {
                            stack.push((name, arg.range, cmd.range.start));
                        }
                    }
                }
                "end" => {
                    let Some(arg) = cmd.args.first() else { continue };
                    let name = arg.text.trim();
                    // Discard unclosed inner begins while looking for the match.
                    while let Some((open_name, open_range, open_start)) = stack.pop() {
                        if open_name == name {
                            self.environments.push(Environment {
                                name: open_name,
                                begin_name_range: open_range,
                                end_name_range: arg.range,
                                full_range: Range::new(open_start, cmd.range.end),
                            });
                            break;
                        }
                    }
                }
                _ => {}
            }
        }
        self.environments
            .sort_by_key(|env| (env.full_range.start.line, env.full_range.start.character));
    }

    fn extract_sections(&mut self, end_of_text: Position) {
        let mut sections: Vec<Section> = Vec::new();
        for cmd in &self.commands {
            let Some(&(_, level)) = SECTION_COMMANDS.iter().find(|(name, _)| *name == cmd.name)
            else {
                continue;
            };
            let title = cmd
                .args
                .first()
                .map(|arg| arg.text.trim().to_string())
                .unwrap_or_default();
            sections.push(Section {
                level,
                title,
                full_range: Range::new(cmd.range.start, end_of_text),
            });
        }
        for i in 0..sections.len() {
            let level = sections[i].level;
            let end = sections[i + 1..]
                .iter()
                .find(|next| next.level <= level)
                .map(|next| next.full_range.start);
            if let Some(end) = end {
                sections[i].full_range.end = end;
            }
        }
        self.sections = sections;
    }

    fn extract_labels(&mut self) {
        for cmd in &self.commands {
            let kind = if cmd.name == "label" {
                LabelKind::Definition
            } else if REFERENCE_COMMANDS.contains(&cmd.name.as_str()) {
                LabelKind::Reference
            } else {
                continue;
            };
            let Some(arg) = cmd.args.first() else { continue };
            let name = arg.text.trim().to_string();
            if name.is_empty() {
                continue;
            }
            self.labels.push(Label {
                kind,
                name,
                name_range: arg.range,
            });
        }
    }
}

/// `start <= position <= end`.
pub fn range_contains(range: Range, position: Position) -> bool {
    position >= range.start && position <= range.end
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    character: u32,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 0,
            character: 0,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.character)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            // Protocol positions count UTF-16 code units.
            self.character += ch.len_utf16() as u32;
        }
        Some(ch)
    }

    fn scan(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Some(&ch) = self.chars.peek() {
            match ch {
                '%' => self.skip_line(),
                '\\' => {
                    if let Some(cmd) = self.scan_command() {
                        commands.push(cmd);
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
        commands
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn scan_command(&mut self) -> Option<Command> {
        let start = self.position();
        self.bump(); // backslash
        let mut name = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_alphabetic() {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            // Escaped symbol such as `\%` or `\\`; consume it so the escaped
            // character is not re-interpreted as markup.
            if let Some(&next) = self.chars.peek() {
                if !next.is_whitespace() {
                    self.bump();
                }
            }
            return None;
        }
        let name_range = Range::new(start, self.position());

        let mut args = Vec::new();
        let mut end = name_range.end;
        loop {
            match self.chars.peek() {
                Some('[') => {
                    self.skip_bracket_group();
                    end = self.position();
                }
                Some('{') => {
                    let arg = self.scan_brace_group();
                    end = self.position();
                    args.push(arg);
                }
                _ => break,
            }
        }

        Some(Command {
            name,
            name_range,
            range: Range::new(start, end),
            args,
        })
    }

    fn skip_bracket_group(&mut self) {
        self.bump(); // '['
        while let Some(&ch) = self.chars.peek() {
            match ch {
                ']' => {
                    self.bump();
                    return;
                }
                '\n' => {
                    // An option group never spans lines in practice; bail so a
                    // stray `[` does not swallow the rest of the document.
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn scan_brace_group(&mut self) -> Argument {
        self.bump(); // '{'
        let inner_start = self.position();
        let mut inner_end = inner_start;
        let mut text = String::new();
        let mut depth = 1usize;
        while let Some(&ch) = self.chars.peek() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        inner_end = self.position();
                        self.bump();
                        break;
                    }
                }
                '\\' => {
                    // Keep escaped braces literal inside the argument text.
                    text.push(ch);
                    self.bump();
                    if let Some(&next) = self.chars.peek() {
                        if next == '{' || next == '}' {
                            text.push(next);
                            self.bump();
                        }
                    }
                    inner_end = self.position();
                    continue;
                }
                _ => {}
            }
            text.push(ch);
            self.bump();
            inner_end = self.position();
        }
        Argument {
            text,
            range: Range::new(inner_start, inner_end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    #[test]
    fn scans_command_with_arguments() {
        let tree = SyntaxTree::parse("\\section{Intro}");
        assert_eq!(tree.commands.len(), 1);
        let cmd = &tree.commands[0];
        assert_eq!(cmd.name, "section");
        assert_eq!(cmd.name_range, range(0, 0, 0, 8));
        assert_eq!(cmd.args[0].text, "Intro");
        assert_eq!(cmd.args[0].range, range(0, 9, 0, 14));
    }

    #[test]
    fn extracts_includes() {
        let tree = SyntaxTree::parse("\\include{parts/intro}\n\\input{macros}\n");
        assert_eq!(tree.includes.len(), 2);
        assert_eq!(tree.includes[0].kind, IncludeKind::Include);
        assert_eq!(tree.includes[0].path, "parts/intro");
        assert_eq!(tree.includes[1].kind, IncludeKind::Input);
        assert_eq!(tree.includes[1].path, "macros");
    }

    #[test]
    fn extracts_import_with_directory() {
        let tree = SyntaxTree::parse("\\import{sections/}{intro}");
        assert_eq!(tree.includes.len(), 1);
        assert_eq!(tree.includes[0].path, "sections/intro");
    }

    #[test]
    fn matches_environments() {
        let text = "\\begin{document}\n\\begin{itemize}\n\\item a\n\\end{itemize}\n\\end{document}\n";
        let tree = SyntaxTree::parse(text);
        assert_eq!(tree.environments.len(), 2);
        assert_eq!(tree.environments[0].name, "document");
        assert_eq!(tree.environments[1].name, "itemize");
        assert_eq!(tree.environments[0].full_range.start, Position::new(0, 0));
        assert_eq!(tree.environments[0].full_range.end, Position::new(4, 14));
    }

    #[test]
    fn unclosed_begin_is_dropped() {
        let tree = SyntaxTree::parse("\\begin{figure}\n\\begin{center}\n\\end{figure}\n");
        assert_eq!(tree.environments.len(), 1);
        assert_eq!(tree.environments[0].name, "figure");
    }

    #[test]
    fn section_ranges_stop_at_next_peer() {
        let text = "\\section{One}\ntext\n\\subsection{Inner}\nmore\n\\section{Two}\nrest\n";
        let tree = SyntaxTree::parse(text);
        assert_eq!(tree.sections.len(), 3);
        assert_eq!(tree.sections[0].title, "One");
        // "One" ends where "Two" begins; the subsection does not end it.
        assert_eq!(tree.sections[0].full_range.end, Position::new(4, 0));
        assert_eq!(tree.sections[1].full_range.end, Position::new(4, 0));
        assert_eq!(tree.sections[2].full_range.end, Position::new(6, 0));
    }

    #[test]
    fn labels_and_references() {
        let tree = SyntaxTree::parse("\\label{sec:intro}\n\\ref{sec:intro}\n\\eqref{eq:euler}\n");
        assert_eq!(tree.labels.len(), 3);
        assert_eq!(tree.labels[0].kind, LabelKind::Definition);
        assert_eq!(tree.labels[0].name, "sec:intro");
        assert_eq!(tree.labels[1].kind, LabelKind::Reference);
        assert_eq!(tree.labels[2].name, "eq:euler");
    }

    #[test]
    fn comments_are_ignored() {
        let tree = SyntaxTree::parse("% \\include{ghost}\n\\include{real}\n");
        assert_eq!(tree.includes.len(), 1);
        assert_eq!(tree.includes[0].path, "real");
    }

    #[test]
    fn escaped_backslash_is_not_a_command() {
        let tree = SyntaxTree::parse("a \\\\ b \\% c \\input{x}");
        assert_eq!(tree.commands.len(), 1);
        assert_eq!(tree.commands[0].name, "input");
    }

    #[test]
    fn optional_arguments_are_skipped() {
        let tree = SyntaxTree::parse("\\includegraphics[width=\\textwidth]{plot}");
        let cmd = tree
            .commands
            .iter()
            .find(|cmd| cmd.name == "includegraphics")
            .expect("command scanned");
        assert_eq!(cmd.args.len(), 1);
        assert_eq!(cmd.args[0].text, "plot");
    }

    #[test]
    fn empty_argument_has_empty_range() {
        let tree = SyntaxTree::parse("\\begin{}");
        let cmd = &tree.commands[0];
        assert_eq!(cmd.args[0].text, "");
        assert_eq!(cmd.args[0].range, range(0, 7, 0, 7));
        assert!(tree.environments.is_empty());
    }
}
