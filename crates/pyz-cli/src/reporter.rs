use colored::Colorize;
use pyz::common::LineMap;
use pyz::{Diagnostic, DiagnosticCategory};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::driver::CheckResult;

/// Renders diagnostics as `path:line:col - error P3001: message` with a
/// source snippet underneath.
pub struct Reporter {
    color: bool,
    sources: FxHashMap<String, String>,
    line_maps: FxHashMap<String, LineMap>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            sources: FxHashMap::default(),
            line_maps: FxHashMap::default(),
        }
    }

    pub fn add_source(&mut self, file: impl Into<String>, text: impl Into<String>) {
        let file = file.into();
        self.line_maps.remove(&file);
        self.sources.insert(file, text.into());
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let mut output = match self.format_location(&diagnostic.file, diagnostic.span.start) {
            Some(location) => location,
            None if !diagnostic.file.is_empty() => diagnostic.file.clone(),
            None => "<unknown>".to_string(),
        };
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code));
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) =
            self.format_snippet(&diagnostic.file, diagnostic.span.start, diagnostic.span.len())
        {
            output.push_str(&snippet);
        }
        output
    }

    /// Summary line: `Found 2 errors and 1 warning in 3 files.`
    pub fn format_summary(&self, errors: usize, warnings: usize, files: usize) -> String {
        let plural = |n: usize, word: &str| {
            if n == 1 {
                format!("{n} {word}")
            } else {
                format!("{n} {word}s")
            }
        };
        let text = format!(
            "Found {} and {} in {}.",
            plural(errors, "error"),
            plural(warnings, "warning"),
            plural(files, "file")
        );
        if !self.color {
            text
        } else if errors > 0 {
            text.red().to_string()
        } else {
            text.green().to_string()
        }
    }

    /// Source line plus a `~` underline of the span.
    ///
    /// ```text
    ///     2   y = f("a")
    ///               ~~~
    /// ```
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if file.is_empty() || length == 0 {
            return None;
        }
        let (line_num, column) = self.position_for(file, start)?;
        let source = self.sources.get(file)?;
        let line_text = source.lines().nth((line_num - 1) as usize)?;

        let first = (column - 1) as usize;
        let mut underline = String::new();
        for (i, ch) in line_text.chars().enumerate() {
            if i >= first + length as usize {
                break;
            }
            let mark = if i < first { ' ' } else { '~' };
            if ch == '\t' {
                underline.extend(std::iter::repeat_n(mark, 4));
            } else {
                underline.push(mark);
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let underline = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        Some(format!("\n  {line_num:>3}   {line_text}\n        {underline}"))
    }

    fn format_location(&mut self, file: &str, offset: u32) -> Option<String> {
        if file.is_empty() {
            return None;
        }
        let (line, column) = self.position_for(file, offset)?;
        let location = format!("{file}:{line}:{column}");
        Some(if self.color {
            location.cyan().to_string()
        } else {
            location
        })
    }

    /// 1-based line and column of `offset`.
    fn position_for(&mut self, file: &str, offset: u32) -> Option<(u32, u32)> {
        let source = self.sources.get(file)?;
        let line_map = self
            .line_maps
            .entry(file.to_string())
            .or_insert_with(|| LineMap::build(source));
        let position = line_map.offset_to_position(offset, source);
        Some((position.line + 1, position.character + 1))
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Information => "info",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Information => label.blue().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = format!("P{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonFileReport<'a> {
    pub path: &'a str,
    pub diagnostics: &'a [Diagnostic],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub files: Vec<JsonFileReport<'a>>,
    pub summary: JsonSummary,
}

impl<'a> JsonReport<'a> {
    /// Only files with diagnostics are listed.
    pub fn new(result: &'a CheckResult) -> Self {
        JsonReport {
            files: result
                .files
                .iter()
                .filter(|f| !f.diagnostics.is_empty())
                .map(|f| JsonFileReport {
                    path: &f.path,
                    diagnostics: &f.diagnostics,
                })
                .collect(),
            summary: JsonSummary {
                files: result.files.len(),
                errors: result.error_count(),
                warnings: result.warning_count(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
