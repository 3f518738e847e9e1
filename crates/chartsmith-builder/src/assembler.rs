//! Chart assembly
//!
//! A [`ChartAssembler`] resolves one chart intent, reads the chart's files
//! and recursively assembles every dependency listed in its
//! `requirements.yaml`. The finished tree is memoized; once it exists the
//! chart's workspace is released and every accessor answers from memory.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chartsmith_core::layout::{
    self, CHART_FILE, FileClass, REQUIREMENTS_FILE, TEMPLATES_DIR, VALUES_FILE,
};
use chartsmith_core::{
    ChartMetadata, ChartNode, ChartValues, OpaqueFile, Requirements, TemplateFile, Value,
    generate_values,
};
use chartsmith_repo::RepositoryFetcher;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::BuilderConfig;
use crate::error::{BuildError, Result};
use crate::intent::ChartIntent;
use crate::source::{ResolvedSource, SourceResolver};

/// Identity of a chart along a dependency chain
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChartKey {
    name: String,
    location: String,
    version: Option<String>,
}

impl ChartKey {
    fn of(intent: &ChartIntent) -> Self {
        Self {
            name: intent.name.clone(),
            location: intent.source.location.clone(),
            version: intent.effective_version().map(str::to_string),
        }
    }
}

impl fmt::Display for ChartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{} ({})", self.name, version, self.location),
            None => write!(f, "{} ({})", self.name, self.location),
        }
    }
}

/// Builds the [`ChartNode`] tree for one chart intent
pub struct ChartAssembler {
    intent: ChartIntent,
    resolver: SourceResolver,
    max_depth: usize,
    depth: usize,
    /// Keys from the root chart down to this one
    ancestors: Vec<ChartKey>,
    root: Option<PathBuf>,
    source: Option<ResolvedSource>,
    tree: Option<ChartNode>,
}

impl ChartAssembler {
    /// Assembler using the default transport and the given configuration
    pub fn new(intent: ChartIntent, config: &BuilderConfig) -> Result<Self> {
        let fetcher = RepositoryFetcher::new(config.fetch_options())?;
        Ok(Self::with_resolver(
            intent,
            SourceResolver::new(fetcher),
            config.max_depth,
        ))
    }

    pub fn with_resolver(intent: ChartIntent, resolver: SourceResolver, max_depth: usize) -> Self {
        let key = ChartKey::of(&intent);
        Self {
            intent,
            resolver,
            max_depth,
            depth: 0,
            ancestors: vec![key],
            root: None,
            source: None,
            tree: None,
        }
    }

    pub fn intent(&self) -> &ChartIntent {
        &self.intent
    }

    /// Resolve the chart source, once
    ///
    /// Later calls return the same root without touching the source again.
    /// After [`assemble_tree`](Self::assemble_tree) an owned workspace has
    /// been removed and the returned path no longer exists.
    pub fn resolve(&mut self) -> Result<&Path> {
        if self.root.is_none() {
            let source = self.resolver.resolve(&self.intent)?;
            self.root = Some(source.root().to_path_buf());
            self.source = Some(source);
        }
        match &self.root {
            Some(root) => Ok(root),
            None => Err(BuildError::SourceNotFound {
                path: PathBuf::from(&self.intent.source.location),
            }),
        }
    }

    fn resolved_root(&mut self) -> Result<PathBuf> {
        self.resolve().map(Path::to_path_buf)
    }

    pub fn metadata(&mut self) -> Result<ChartMetadata> {
        if let Some(tree) = &self.tree {
            return Ok(tree.metadata.clone());
        }
        let root = self.resolved_root()?;
        read_metadata(&root, &self.intent.name)
    }

    /// Raw `values.yaml`, empty when the chart has none
    pub fn values(&mut self) -> Result<ChartValues> {
        if let Some(tree) = &self.tree {
            return Ok(tree.values.clone());
        }
        let root = self.resolved_root()?;
        read_values(&root)
    }

    /// Chart defaults with dotted-path overrides folded in
    pub fn values_with<I, K>(&mut self, overrides: I) -> Result<ChartValues>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let defaults = self.values()?;
        Ok(generate_values(defaults.raw(), overrides)?)
    }

    pub fn templates(&mut self) -> Result<Vec<TemplateFile>> {
        if let Some(tree) = &self.tree {
            return Ok(tree.templates.clone());
        }
        let root = self.resolved_root()?;
        read_templates(&root)
    }

    pub fn files(&mut self) -> Result<Vec<OpaqueFile>> {
        if let Some(tree) = &self.tree {
            return Ok(tree.files.clone());
        }
        let root = self.resolved_root()?;
        read_files(&root)
    }

    /// Fully assembled dependency trees, in `requirements.yaml` order
    pub fn dependencies(&mut self) -> Result<Vec<ChartNode>> {
        if let Some(tree) = &self.tree {
            return Ok(tree.dependencies.clone());
        }

        let root = self.resolved_root()?;
        let requirements = read_requirements(&root, &self.intent.name)?;

        let mut nodes = Vec::with_capacity(requirements.dependencies.len());
        for declared in requirements.dependencies {
            let intent = ChartIntent::repo(
                declared.name,
                declared.repository,
                Some(declared.version),
            );
            nodes.push(self.child(intent)?.into_tree()?);
        }
        Ok(nodes)
    }

    /// Build the whole tree once; later calls return the memoized tree
    pub fn assemble_tree(&mut self) -> Result<&ChartNode> {
        let tree = match self.tree.take() {
            Some(tree) => tree,
            None => self.build()?,
        };
        let tree: &ChartNode = self.tree.insert(tree);
        Ok(tree)
    }

    /// Deterministic encoding of the assembled tree
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        Ok(self.assemble_tree()?.to_bytes()?)
    }

    fn into_tree(mut self) -> Result<ChartNode> {
        match self.tree.take() {
            Some(tree) => Ok(tree),
            None => self.build(),
        }
    }

    fn build(&mut self) -> Result<ChartNode> {
        let collected = self.collect();

        // the workspace goes away whether or not collection succeeded
        let released = match self.source.take() {
            Some(source) => source.release(),
            None => Ok(()),
        };

        let node = match collected {
            Ok(node) => node,
            Err(e) => {
                // a later attempt resolves the source again
                self.root = None;
                return Err(e);
            }
        };
        released?;

        info!(
            chart = %node.metadata.name,
            version = %node.metadata.version,
            templates = node.templates.len(),
            files = node.files.len(),
            dependencies = node.dependencies.len(),
            "assembled chart"
        );
        Ok(node)
    }

    fn collect(&mut self) -> Result<ChartNode> {
        let metadata = self.metadata()?;
        let templates = self.templates()?;
        let dependencies = self.dependencies()?;
        let values = self.values()?;
        let files = self.files()?;

        Ok(ChartNode {
            metadata,
            values,
            templates,
            files,
            dependencies,
        })
    }

    /// Assembler for a dependency of this chart
    fn child(&self, intent: ChartIntent) -> Result<Self> {
        let key = ChartKey::of(&intent);

        if self.ancestors.contains(&key) {
            let chain = self
                .ancestors
                .iter()
                .chain(std::iter::once(&key))
                .map(ChartKey::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(BuildError::CircularDependency { chain });
        }

        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(BuildError::DepthExceeded {
                chart: key.to_string(),
                max_depth: self.max_depth,
            });
        }

        debug!(parent = %self.intent.name, dependency = %key, depth, "resolving dependency");

        let mut ancestors = self.ancestors.clone();
        ancestors.push(key);

        Ok(Self {
            intent,
            resolver: self.resolver.clone(),
            max_depth: self.max_depth,
            depth,
            ancestors,
            root: None,
            source: None,
            tree: None,
        })
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| BuildError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| BuildError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_metadata(root: &Path, chart: &str) -> Result<ChartMetadata> {
    let path = root.join(CHART_FILE);
    if !path.is_file() {
        return Err(BuildError::MissingFile {
            chart: chart.to_string(),
            file: CHART_FILE.to_string(),
        });
    }

    ChartMetadata::from_yaml(&read_text(&path)?).map_err(|e| BuildError::InvalidChartFile {
        chart: chart.to_string(),
        file: CHART_FILE.to_string(),
        source: e,
    })
}

fn read_values(root: &Path) -> Result<ChartValues> {
    let path = root.join(VALUES_FILE);
    if !path.is_file() {
        return Ok(ChartValues::default());
    }
    Ok(ChartValues::new(read_text(&path)?))
}

fn read_requirements(root: &Path, chart: &str) -> Result<Requirements> {
    let path = root.join(REQUIREMENTS_FILE);
    if !path.is_file() {
        return Ok(Requirements::default());
    }

    Requirements::from_yaml(&read_text(&path)?).map_err(|e| BuildError::InvalidChartFile {
        chart: chart.to_string(),
        file: REQUIREMENTS_FILE.to_string(),
        source: e,
    })
}

/// Regular files under `dir`, as (root-relative name, path), sorted by name
///
/// A symlink counts as a file when it resolves to a regular file inside the
/// chart root; other symlinks are skipped and directory links are not walked.
fn chart_files(root: &Path, dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let canonical_root = root.canonicalize().map_err(|e| BuildError::Read {
        path: root.to_path_buf(),
        source: e,
    })?;
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            if !links_inside(&canonical_root, entry.path()) {
                debug!(path = %entry.path().display(), "skipping symlink outside chart or not a file");
                continue;
            }
        } else if !file_type.is_file() {
            continue;
        }

        let name = layout::relative_name(root, entry.path()).ok_or_else(|| BuildError::Read {
            path: entry.path().to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        })?;
        found.push((name, entry.into_path()));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn links_inside(canonical_root: &Path, link: &Path) -> bool {
    match link.canonicalize() {
        Ok(target) => target.starts_with(canonical_root) && target.is_file(),
        Err(_) => false,
    }
}

fn read_templates(root: &Path) -> Result<Vec<TemplateFile>> {
    let dir = root.join(TEMPLATES_DIR);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    chart_files(root, &dir)?
        .into_iter()
        .map(|(name, path)| {
            Ok(TemplateFile {
                data: read_bytes(&path)?,
                name,
            })
        })
        .collect()
}

fn read_files(root: &Path) -> Result<Vec<OpaqueFile>> {
    chart_files(root, root)?
        .into_iter()
        .filter(|(name, _)| layout::classify(name) == FileClass::Opaque)
        .map(|(name, path)| {
            Ok(OpaqueFile {
                data: read_bytes(&path)?,
                path: name,
            })
        })
        .collect()
}
