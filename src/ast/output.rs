use std::io::{self, Write};

use ansi_term::Colour;

use super::summary::{FileSummary, FunctionSummary, Param};

const PATH_COLOUR: Colour = Colour::Green;
const CLASS_COLOUR: Colour = Colour::Yellow;
const FUNCTION_COLOUR: Colour = Colour::Red;
const ARG_COLOUR: Colour = Colour::Blue;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub header_only: bool,
    pub show_imports: bool,
    pub line_links: bool,
    pub colored: bool,
}

impl OutputOptions {
    fn paint(&self, colour: Colour, text: &str) -> String {
        if self.colored {
            colour.paint(text).to_string()
        } else {
            text.to_owned()
        }
    }
}

/// Running sums over processed files. Files that failed count as one file with no content.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub files: usize,
    pub lines: usize,
    pub functions: usize,
    pub classes: usize,
}

impl Totals {
    pub fn add(&mut self, summary: Option<&FileSummary>) {
        self.files += 1;
        if let Some(summary) = summary {
            self.lines += summary.lines;
            self.functions += summary.function_count();
            self.classes += summary.class_count();
        }
    }
}

pub fn write_totals(out: &mut impl Write, totals: &Totals) -> io::Result<()> {
    writeln!(
        out,
        "\nTotal: Files={}, Lines={}, Functions={}, Classes={}",
        totals.files, totals.lines, totals.functions, totals.classes
    )
}

pub fn write_summary(
    out: &mut impl Write,
    summary: &FileSummary,
    options: &OutputOptions,
) -> io::Result<()> {
    let path = summary.path.display().to_string();
    writeln!(
        out,
        "'{}' (lines={}, functions={}, classes={})",
        options.paint(PATH_COLOUR, &path),
        summary.lines,
        summary.function_count(),
        summary.class_count()
    )?;

    if options.show_imports {
        for import in &summary.imports {
            writeln!(out, "{:6} {}", import.line, import.statement)?;
        }
        writeln!(out)?;
    }

    if options.header_only {
        return Ok(());
    }

    for class in &summary.classes {
        let bases = if class.bases.is_empty() {
            String::new()
        } else {
            format!("({})", class.bases.join(", "))
        };
        writeln!(
            out,
            "\t{:4} {}{bases}",
            class.line,
            options.paint(CLASS_COLOUR, &class.name)
        )?;
        for method in &class.methods {
            writeln!(out, "\t\t{:4} {}", method.line, signature(method, &path, options))?;
        }
    }

    for function in &summary.functions {
        writeln!(out, "{:04} {}", function.line, signature(function, &path, options))?;
    }
    Ok(())
}

fn signature(function: &FunctionSummary, path: &str, options: &OutputOptions) -> String {
    let params = function
        .params
        .iter()
        .filter(|param| !(param.name == "self" && param.annotation.is_none()))
        .map(|param| param_text(param, options))
        .collect::<Vec<_>>()
        .join(", ");
    let link = if options.line_links {
        format!(" (vscode://file/{path}:{})", function.line)
    } else {
        String::new()
    };
    format!(
        "{}({params}) -> {}{link}",
        options.paint(FUNCTION_COLOUR, &function.name),
        function.returns.as_deref().unwrap_or("None"),
    )
}

fn param_text(param: &Param, options: &OutputOptions) -> String {
    let name = options.paint(ARG_COLOUR, &param.name);
    match &param.annotation {
        Some(annotation) => format!("{name}: {annotation}"),
        None => name,
    }
}
