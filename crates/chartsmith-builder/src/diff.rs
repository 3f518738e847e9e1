//! Line diffs between assembled chart trees
//!
//! Trees are rendered to text (metadata, values and file contents, one
//! section per file, dependencies nested under their parent's name) and
//! compared line by line.

use std::fmt::Write as _;

use chartsmith_core::ChartNode;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Line-level difference between two chart trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDiff {
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub line_type: LineType,
    pub content: String,
    pub old_line_no: Option<usize>,
    pub new_line_no: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Added,
    Removed,
    Context,
}

impl TreeDiff {
    pub fn between(old: &ChartNode, new: &ChartNode) -> Self {
        let old = render(old);
        let new = render(new);
        let diff = TextDiff::from_lines(old.as_str(), new.as_str());

        let lines = diff
            .iter_all_changes()
            .map(|change| DiffLine {
                line_type: match change.tag() {
                    ChangeTag::Delete => LineType::Removed,
                    ChangeTag::Insert => LineType::Added,
                    ChangeTag::Equal => LineType::Context,
                },
                content: change.value().trim_end().to_string(),
                old_line_no: change.old_index(),
                new_line_no: change.new_index(),
            })
            .collect();

        Self { lines }
    }

    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|l| l.line_type != LineType::Context)
    }

    pub fn added(&self) -> usize {
        self.count(LineType::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(LineType::Removed)
    }

    fn count(&self, line_type: LineType) -> usize {
        self.lines.iter().filter(|l| l.line_type == line_type).count()
    }

    /// Only the changed lines, prefixed with `+`/`-`
    pub fn to_unified_diff(&self) -> String {
        let mut output = String::new();

        for line in &self.lines {
            let prefix = match line.line_type {
                LineType::Added => "+",
                LineType::Removed => "-",
                LineType::Context => continue,
            };
            output.push_str(prefix);
            output.push_str(&line.content);
            output.push('\n');
        }

        output
    }
}

/// Text form of a tree used for diffing
pub fn render(node: &ChartNode) -> String {
    let mut out = String::new();
    render_into(&mut out, node, &node.metadata.name);
    out
}

fn render_into(out: &mut String, node: &ChartNode, path: &str) {
    let meta = &node.metadata;
    let _ = writeln!(out, "### {} ({}@{})", path, meta.name, meta.version);
    for (field, value) in [
        ("description", &meta.description),
        ("apiVersion", &meta.api_version),
        ("appVersion", &meta.app_version),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "{}: {}", field, value);
        }
    }

    section(out, path, "values.yaml", node.values.raw().as_bytes());
    for template in &node.templates {
        section(out, path, &template.name, &template.data);
    }
    for file in &node.files {
        section(out, path, &file.path, &file.data);
    }

    for dependency in &node.dependencies {
        let child = format!("{}/{}", path, dependency.metadata.name);
        render_into(out, dependency, &child);
    }
}

fn section(out: &mut String, chart: &str, name: &str, data: &[u8]) {
    let _ = writeln!(out, "--- {}: {}", chart, name);
    match std::str::from_utf8(data) {
        Ok(text) => {
            for line in text.lines() {
                let _ = writeln!(out, "{}", line);
            }
        }
        Err(_) => {
            let _ = writeln!(out, "<binary, {} bytes>", data.len());
        }
    }
}
