//! Chart directory layout and file classification

use std::path::{Component, Path};

pub const CHART_FILE: &str = "Chart.yaml";
pub const VALUES_FILE: &str = "values.yaml";
pub const VALUES_TOML_FILE: &str = "values.toml";
pub const REQUIREMENTS_FILE: &str = "requirements.yaml";
pub const TEMPLATES_DIR: &str = "templates";
pub const CHARTS_DIR: &str = "charts";

/// Role of a file within a chart, keyed by its root-relative path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// `Chart.yaml`
    Metadata,
    /// `values.yaml` or `values.toml`
    Values,
    /// Anything under `templates/`
    Template,
    /// Anything under `charts/`; reserved and never read
    Subchart,
    /// Carried verbatim in the chart's file list
    Opaque,
}

/// Classify a root-relative path using `/` separators
pub fn classify(relative: &str) -> FileClass {
    match relative {
        CHART_FILE => FileClass::Metadata,
        VALUES_FILE | VALUES_TOML_FILE => FileClass::Values,
        _ if in_dir(relative, TEMPLATES_DIR) => FileClass::Template,
        _ if in_dir(relative, CHARTS_DIR) => FileClass::Subchart,
        _ => FileClass::Opaque,
    }
}

fn in_dir(relative: &str, dir: &str) -> bool {
    relative
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Root-relative name of `path` with `/` separators
///
/// Returns `None` when `path` is not under `root` or has non-UTF-8 parts.
pub fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Whether a relative subpath stays inside the directory it is joined to
pub fn is_contained(subpath: &Path) -> bool {
    subpath
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether `name` is usable as a single directory name for a chart
pub fn is_chart_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
