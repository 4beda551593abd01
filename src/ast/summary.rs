//! Extraction of classes, functions and imports from Python sources using tree-sitter.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub line: usize,
    pub params: Vec<Param>,
    pub returns: Option<String>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    pub name: String,
    pub line: usize,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub line: usize,
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub lines: usize,
    pub classes: Vec<ClassSummary>,
    /// Functions outside of class bodies, including nested ones.
    pub functions: Vec<FunctionSummary>,
    pub imports: Vec<ImportSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Source,
    Ascending,
    Descending,
}

impl FileSummary {
    /// Free functions plus methods.
    pub fn function_count(&self) -> usize {
        self.functions.len()
            + self
                .classes
                .iter()
                .map(|class| class.methods.len())
                .sum::<usize>()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Orders classes, methods and functions by name and imports by line. [SortOrder::Source]
    /// leaves everything as found.
    pub fn sort(&mut self, order: SortOrder) {
        let descending = match order {
            SortOrder::Source => return,
            SortOrder::Ascending => false,
            SortOrder::Descending => true,
        };
        let directed = |ordering: std::cmp::Ordering| {
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        };

        self.classes.sort_by(|a, b| directed(a.name.cmp(&b.name)));
        for class in &mut self.classes {
            class.methods.sort_by(|a, b| directed(a.name.cmp(&b.name)));
        }
        self.functions.sort_by(|a, b| directed(a.name.cmp(&b.name)));
        self.imports.sort_by(|a, b| directed(a.line.cmp(&b.line)));
    }
}

/// Reads and summarizes one file. The stored path is absolute.
pub fn summarize_file(path: &Path) -> Result<FileSummary> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Can't read {}", path.display()))?;
    let absolute = std::path::absolute(path)?;
    summarize_source(absolute, &source)
}

/// Fails on syntax errors, naming the line of the first one.
pub fn summarize_source(path: PathBuf, source: &str) -> Result<FileSummary> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("Parser gave up on {}", path.display()))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root).map_or(1, line_of);
        bail!("invalid syntax (line {line})");
    }

    let mut summary = FileSummary {
        path,
        lines: source.lines().count(),
        classes: Vec::new(),
        functions: Vec::new(),
        imports: Vec::new(),
    };
    let mut collector = Collector {
        source: source.as_bytes(),
        summary: &mut summary,
    };
    collector.visit_children(root, None);
    Ok(summary)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error);
    found
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

struct Collector<'s> {
    source: &'s [u8],
    summary: &'s mut FileSummary,
}

impl Collector<'_> {
    /// `class` is the index of the class whose body directly contains `node`.
    fn visit(&mut self, node: Node, class: Option<usize>) {
        match node.kind() {
            "function_definition" => {
                let function = self.function(node);
                match class {
                    Some(index) => self.summary.classes[index].methods.push(function),
                    None => self.summary.functions.push(function),
                }
                self.visit_field(node, "body", None);
            }
            "class_definition" => {
                let class = self.class(node);
                self.summary.classes.push(class);
                let index = self.summary.classes.len() - 1;
                self.visit_field(node, "body", Some(index));
            }
            "decorated_definition" => self.visit_field(node, "definition", class),
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                self.summary.imports.push(ImportSummary {
                    line: line_of(node),
                    statement: self.text(node),
                });
            }
            "block" => self.visit_children(node, class),
            _ => self.visit_children(node, None),
        }
    }

    fn visit_children(&mut self, node: Node, class: Option<usize>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, class);
        }
    }

    fn visit_field(&mut self, node: Node, field: &str, class: Option<usize>) {
        if let Some(child) = node.child_by_field_name(field) {
            self.visit(child, class);
        }
    }

    fn function(&self, node: Node) -> FunctionSummary {
        let params = node
            .child_by_field_name("parameters")
            .map(|params| self.params(params))
            .unwrap_or_default();
        let mut cursor = node.walk();
        let is_async = node
            .children(&mut cursor)
            .any(|child| child.kind() == "async");
        FunctionSummary {
            name: self.field_text(node, "name"),
            line: line_of(node),
            params,
            returns: node
                .child_by_field_name("return_type")
                .map(|ty| self.text(ty)),
            is_async,
        }
    }

    /// Positional parameters. Everything from the first `*` marker on is keyword only or a
    /// splat and is left out.
    fn params(&self, node: Node) -> Vec<Param> {
        let mut params = Vec::new();
        let mut cursor = node.walk();
        for param in node.named_children(&mut cursor) {
            let (name, annotation) = match param.kind() {
                "identifier" => (self.text(param), None),
                "default_parameter" => (self.field_text(param, "name"), None),
                "typed_default_parameter" => (
                    self.field_text(param, "name"),
                    param.child_by_field_name("type").map(|ty| self.text(ty)),
                ),
                "typed_parameter" => match param.named_child(0) {
                    Some(inner) if inner.kind() == "identifier" => (
                        self.text(inner),
                        param.child_by_field_name("type").map(|ty| self.text(ty)),
                    ),
                    _ => break,
                },
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                _ => continue,
            };
            params.push(Param { name, annotation });
        }
        params
    }

    fn class(&self, node: Node) -> ClassSummary {
        let bases = node
            .child_by_field_name("superclasses")
            .map(|args| {
                let mut cursor = args.walk();
                args.named_children(&mut cursor)
                    .filter(|arg| !matches!(arg.kind(), "keyword_argument" | "comment"))
                    .map(|arg| self.text(arg))
                    .collect()
            })
            .unwrap_or_default();
        ClassSummary {
            name: self.field_text(node, "name"),
            line: line_of(node),
            bases,
            methods: Vec::new(),
        }
    }

    fn field_text(&self, node: Node, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|child| self.text(child))
            .unwrap_or_default()
    }

    /// Source text of a node with runs of whitespace collapsed, so multi-line constructs print
    /// on one line.
    fn text(&self, node: Node) -> String {
        let raw = node.utf8_text(self.source).unwrap_or_default();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{summarize_file, summarize_source, FileSummary, Param, SortOrder};

    const SAMPLE: &str = r#"import os
from typing import (
    List,
    Optional,
)


class Greeter(Base, metaclass=Meta):
    def greet(self, name: str, times=1, *args, loud: bool = False) -> str:
        def shout(text):
            return text.upper()
        return shout(name)

    @staticmethod
    async def fetch(url: str) -> None:
        import json
        pass

    class Inner:
        def deep(self):
            pass


def main(argv: List[str]) -> int:
    return 0


def bare(x, /, y, *, z):
    pass
"#;

    fn sample() -> FileSummary {
        summarize_source(PathBuf::from("/tmp/sample.py"), SAMPLE).unwrap()
    }

    #[test]
    fn collects_classes_methods_and_functions() {
        let summary = sample();

        let names: Vec<_> = summary.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Greeter", "Inner"]);
        assert_eq!(summary.classes[0].bases, vec!["Base"]);
        assert_eq!(summary.classes[0].line, 8);

        let methods: Vec<_> = summary.classes[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(methods, vec!["greet", "fetch"]);
        assert_eq!(summary.classes[1].methods[0].name, "deep");

        let functions: Vec<_> = summary.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["shout", "main", "bare"]);

        assert_eq!(summary.function_count(), 6);
        assert_eq!(summary.class_count(), 2);
        assert_eq!(summary.lines, 29);
    }

    #[test]
    fn parameters_stop_at_splats() {
        let summary = sample();
        let greet = &summary.classes[0].methods[0];
        assert_eq!(
            greet.params,
            vec![
                Param {
                    name: "self".into(),
                    annotation: None
                },
                Param {
                    name: "name".into(),
                    annotation: Some("str".into())
                },
                Param {
                    name: "times".into(),
                    annotation: None
                },
            ]
        );
        assert_eq!(greet.returns.as_deref(), Some("str"));

        let fetch = &summary.classes[0].methods[1];
        assert!(fetch.is_async);
        assert_eq!(fetch.line, 15);

        let bare = summary.functions.iter().find(|f| f.name == "bare").unwrap();
        let names: Vec<_> = bare.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(bare.returns.is_none());
    }

    #[test]
    fn imports_anywhere_are_collected_on_one_line() {
        let summary = sample();
        let imports: Vec<_> = summary
            .imports
            .iter()
            .map(|i| (i.line, i.statement.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                (1, "import os"),
                (2, "from typing import ( List, Optional, )"),
                (16, "import json"),
            ]
        );
    }

    #[test]
    fn sorting_never_changes_counts() {
        let source = "class B:\n    def m(self):\n        pass\n\ndef a():\n    pass\n";
        for order in [SortOrder::Source, SortOrder::Ascending, SortOrder::Descending] {
            let mut summary = summarize_source(PathBuf::from("x.py"), source).unwrap();
            summary.sort(order);
            assert_eq!(summary.function_count(), 2);
            assert_eq!(summary.class_count(), 1);
        }
    }

    #[test]
    fn sorts_by_name_in_both_directions() {
        let mut summary = sample();
        summary.sort(SortOrder::Ascending);
        let functions: Vec<_> = summary.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["bare", "main", "shout"]);
        assert_eq!(summary.classes[0].methods[0].name, "fetch");

        summary.sort(SortOrder::Descending);
        assert_eq!(summary.classes[0].name, "Inner");
        assert_eq!(summary.functions[0].name, "shout");
        assert_eq!(summary.imports[0].line, 16);
    }

    #[test]
    fn syntax_errors_name_a_line() {
        let err = summarize_source(PathBuf::from("bad.py"), "def ok():\n    pass\n\ndef broken(:\n")
            .unwrap_err();
        assert!(err.to_string().contains("invalid syntax"));
    }

    #[test]
    fn summarize_file_reports_missing_files() -> Result<()> {
        let dir = tempdir()?;
        assert!(summarize_file(&dir.path().join("missing.py")).is_err());

        let path = dir.path().join("ok.py");
        fs::write(&path, "def f():\n    pass\n")?;
        let summary = summarize_file(&path)?;
        assert!(summary.path.is_absolute());
        assert_eq!(summary.function_count(), 1);
        Ok(())
    }
}
