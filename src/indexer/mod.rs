use crate::config::Config;
use crate::frontend::{CSharpParser, SourceUnit, SymbolTable, UnitModel};
use crate::index::{CodebaseIndex, ProjectPartition};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod deps;
pub mod extract;
pub mod stable_id;
pub mod workspace;

use deps::DependencyCollector;
use extract::EntityExtractor;
use workspace::{ProjectSources, ScanOptions};

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Free text; types and methods whose names occur in it keep their full text.
    pub interest: String,
    pub scan: ScanOptions,
    /// Worker threads, 0 for the rayon default.
    pub threads: usize,
}

impl IndexOptions {
    pub fn new(interest: impl Into<String>, no_ignore: bool) -> Self {
        Self {
            interest: interest.into(),
            scan: ScanOptions::new(no_ignore),
            threads: Config::get().threads,
        }
    }
}

struct ParsedProject {
    sources: ProjectSources,
    units: Vec<SourceUnit>,
}

/// Builds a [`CodebaseIndex`] from every project below a root directory.
///
/// Projects are parsed in parallel, then a shared symbol table is built, then
/// each project is extracted in parallel into its own partition. Partitions
/// are merged in discovery order, so the result does not depend on
/// scheduling.
pub struct Indexer {
    root: PathBuf,
    options: IndexOptions,
}

impl Indexer {
    pub fn new(root: impl Into<PathBuf>, options: IndexOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run(&self) -> Result<CodebaseIndex> {
        if self.options.threads == 0 {
            return self.run_inner();
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .build()
            .context("build indexing thread pool")?;
        pool.install(|| self.run_inner())
    }

    fn run_inner(&self) -> Result<CodebaseIndex> {
        let started = Instant::now();
        let projects = workspace::discover_projects(&self.root, &self.options.scan)?;
        let files: usize = projects.iter().map(|p| p.files.len()).sum();
        debug!(projects = projects.len(), files, "discovered projects");

        let parsed = projects
            .into_par_iter()
            .map(parse_project)
            .collect::<Result<Vec<_>>>()?;
        let table = SymbolTable::from_units(parsed.iter().flat_map(|p| p.units.iter()));
        debug!(types = table.len(), "symbol table built");

        let interest = self.options.interest.as_str();
        let partitions: Vec<ProjectPartition> = parsed
            .par_iter()
            .map(|project| index_project(project, &table, interest))
            .collect();
        let index = CodebaseIndex::merge(partitions);

        info!(
            root = %self.root().display(),
            projects = index.project_names().len(),
            files,
            types = index.len(),
            inconsistencies = index.inconsistencies().len(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "indexing finished"
        );
        Ok(index)
    }
}

/// Indexes `root` with default scan options and the given interest query.
pub fn index_codebase(root: &Path, interest: &str) -> Result<CodebaseIndex> {
    Indexer::new(root, IndexOptions::new(interest, false)).run()
}

fn parse_project(sources: ProjectSources) -> Result<ParsedProject> {
    let mut parser = CSharpParser::new()?;
    let mut units = Vec::with_capacity(sources.files.len());
    for file in &sources.files {
        let text = match crate::util::read_to_string(&file.abs_path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %file.rel_path, "skipping unreadable file: {err:#}");
                continue;
            }
        };
        match parser.parse(&file.rel_path, &file.abs_path, text) {
            Ok(unit) => units.push(unit),
            Err(err) => warn!(path = %file.rel_path, "skipping unparsable file: {err:#}"),
        }
    }
    Ok(ParsedProject { sources, units })
}

/// Extraction and dependency collection for one project, units in path order.
fn index_project(project: &ParsedProject, table: &SymbolTable, interest: &str) -> ProjectPartition {
    let name = project.sources.name.as_str();
    let extractor = EntityExtractor::new(name, interest);
    let mut partition = ProjectPartition {
        project: name.to_string(),
        ..Default::default()
    };
    for unit in &project.units {
        let model = UnitModel::new(unit, table);
        let facts = extractor.extract(unit, &model);
        let deps = DependencyCollector::collect(unit, &model);
        debug!(
            project = name,
            path = unit.rel_path(),
            types = facts.types.len(),
            "indexed unit"
        );
        for mut entity in facts.types {
            if let Some(edges) = deps.type_edges.get(&entity.qualified_name) {
                entity.dependencies = edges.iter().cloned().collect();
            }
            partition.types.push(entity);
        }
        for (method, calls) in deps.method_edges {
            partition
                .method_dependencies
                .entry(method)
                .or_default()
                .extend(calls);
        }
        partition.inconsistencies.extend(facts.inconsistencies);
    }
    partition
}
