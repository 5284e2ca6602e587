use crate::config::Config;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub no_ignore: bool,
    /// Path segments that exclude a file, compared case-insensitively.
    pub exclude_segments: Vec<String>,
    pub max_file_bytes: u64,
}

impl ScanOptions {
    pub fn new(no_ignore: bool) -> Self {
        let config = Config::get();
        Self {
            no_ignore,
            exclude_segments: config.exclude_segments.clone(),
            max_file_bytes: config.max_file_bytes,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// One project and the source files it owns, in path order.
#[derive(Debug, Clone)]
pub struct ProjectSources {
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

/// Finds every `*.csproj` below `root` and assigns each `*.cs` file to the
/// deepest project directory containing it. Without any project file the
/// whole root is one project named after the directory. Projects come back
/// ordered by project file path, which fixes the report's project order.
pub fn discover_projects(root: &Path, options: &ScanOptions) -> Result<Vec<ProjectSources>> {
    let root = fs::canonicalize(root).with_context(|| format!("open root {}", root.display()))?;
    let mut project_files = Vec::new();
    let mut sources = Vec::new();

    for entry in build_walker(&root, options.no_ignore) {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                warn!("walk error: {err}");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let rel_path = crate::util::normalize_rel_path(&root, path)?;
        if is_excluded(&rel_path, &options.exclude_segments) {
            debug!(path = %rel_path, "excluded by path segment");
            continue;
        }
        match path.extension().and_then(OsStr::to_str) {
            Some("csproj") => project_files.push(path.to_path_buf()),
            Some("cs") => {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                if size > options.max_file_bytes {
                    warn!(path = %rel_path, size, "skipping large file");
                    continue;
                }
                sources.push(SourceFile {
                    rel_path,
                    abs_path: path.to_path_buf(),
                });
            }
            _ => {}
        }
    }
    project_files.sort();
    sources.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

    let mut projects: Vec<ProjectSources> = Vec::new();
    for project_file in &project_files {
        let Some(dir) = project_file.parent() else {
            continue;
        };
        // one project per directory; the first project file wins
        if projects.iter().any(|p| p.dir == dir) {
            continue;
        }
        let name = project_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        projects.push(ProjectSources {
            name,
            dir: dir.to_path_buf(),
            files: Vec::new(),
        });
    }
    if projects.is_empty() {
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string());
        projects.push(ProjectSources {
            name,
            dir: root.clone(),
            files: Vec::new(),
        });
    }

    for file in sources {
        let owner = projects
            .iter_mut()
            .filter(|project| file.abs_path.starts_with(&project.dir))
            .max_by_key(|project| project.dir.components().count());
        match owner {
            Some(project) => project.files.push(file),
            None => debug!(path = %file.rel_path, "source file outside every project"),
        }
    }
    Ok(projects)
}

fn build_walker(root: &Path, no_ignore: bool) -> ignore::Walk {
    let mut builder = WalkBuilder::new(root);
    if no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    builder
        .hidden(false)
        .filter_entry(|entry| entry.file_name() != OsStr::new(".git"))
        .build()
}

/// True when any segment of `rel_path` equals one of `segments`, ignoring
/// ASCII case. `src/Obj/Gen.cs` is excluded by `obj`; `src/objects/A.cs` is not.
pub fn is_excluded(rel_path: &str, segments: &[String]) -> bool {
    rel_path
        .split(['/', '\\'])
        .any(|part| segments.iter().any(|seg| seg.eq_ignore_ascii_case(part)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> ScanOptions {
        ScanOptions {
            no_ignore: true,
            exclude_segments: vec!["obj".to_string(), "platforms".to_string()],
            max_file_bytes: 1024 * 1024,
        }
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn excluded_segments_ignore_case() {
        let segments = vec!["obj".to_string(), "platforms".to_string()];
        assert!(is_excluded("App/OBJ/Debug/Gen.cs", &segments));
        assert!(is_excluded("App/Platforms/Android/Main.cs", &segments));
        assert!(!is_excluded("App/objects/Thing.cs", &segments));
    }

    #[test]
    fn files_go_to_deepest_project() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Core/Core.csproj", "<Project />");
        write(dir.path(), "Core/Order.cs", "class Order {}");
        write(dir.path(), "Core/Tests/Core.Tests.csproj", "<Project />");
        write(dir.path(), "Core/Tests/OrderTests.cs", "class OrderTests {}");
        write(dir.path(), "Core/obj/Generated.cs", "class Generated {}");

        let projects = discover_projects(dir.path(), &options()).unwrap();
        let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Core", "Core.Tests"]);
        let core: Vec<_> = projects[0].files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(core, vec!["Core/Order.cs"]);
        let tests: Vec<_> = projects[1].files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(tests, vec!["Core/Tests/OrderTests.cs"]);
    }

    #[test]
    fn root_without_project_file_is_one_project() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/A.cs", "class A {}");
        write(dir.path(), "B.cs", "class B {}");
        let projects = discover_projects(dir.path(), &options()).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].files.len(), 2);
        assert_eq!(projects[0].files[0].rel_path, "B.cs");
    }

    #[test]
    fn large_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Big.cs", &"x".repeat(64));
        let mut options = options();
        options.max_file_bytes = 16;
        let projects = discover_projects(dir.path(), &options).unwrap();
        assert!(projects[0].files.is_empty());
    }
}
