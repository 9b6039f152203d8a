use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use tokio::task;
use anyhow::Result;
use walkdir::{DirEntry, WalkDir};
use colored::Colorize;
use if_chain::if_chain;
use chrono::{DateTime, Utc};
use spinoff::{spinners, Spinner};
use crate::{
    cli::SortBy,
    error::ScanError,
    project::Project,
    utils,
};

/// Directory terraform creates on `init`; its parent is a project root.
pub const TERRAFORM_DIR: &str = ".terraform";

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub excluded: Vec<String>,
    pub exclude_hidden: bool,
    pub max_depth: usize,
}

pub struct ProjectScanner {
    options: ScanOptions,
}

impl ProjectScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub async fn scan(&self) -> Result<Vec<Project>> {
        let spinner = Spinner::new(
            spinners::Dots,
            format!("Scanning for Terraform projects in: {}", self.options.root.display()),
            spinoff::Color::White,
        );

        let options = self.options.clone();
        let projects = task::spawn_blocking(move || discover(&options)).await?;

        spinner.clear();

        Ok(projects?)
    }

    pub fn print_projects(&self, projects: &[Project], sort: SortBy, json: bool) -> Result<()> {
        let mut projects = projects.to_vec();
        sort_projects(&mut projects, sort);

        if json {
            println!("{}", serde_json::to_string_pretty(&projects)?);
            return Ok(());
        }

        if projects.is_empty() {
            println!("No Terraform projects found.");
            return Ok(());
        }

        println!(
            "\n{:<30} {:<45} {:<20} {:<10}",
            "Project Name".bold(),
            "Path".bold(),
            "Last Modified".bold(),
            "Age".bold()
        );
        println!("{}", "─".repeat(108));

        for project in &projects {
            let path_str = utils::get_relative_path(&project.path);
            let age = utils::format_age(project.days_since_modified());

            println!(
                "{:<30} {:<45} {:<20} {:<10}",
                utils::truncate_string(&project.name, 30).cyan(),
                utils::truncate_string(&path_str, 45),
                project.format_last_modified(),
                age.dimmed()
            );
        }

        println!("\n{} project(s) found", projects.len().to_string().bold().green());

        Ok(())
    }
}

/// Walk `options.root` and return every directory that holds a `.terraform`
/// directory. Unreadable subdirectories are skipped; an unreadable root is an
/// error.
pub fn discover(options: &ScanOptions) -> Result<Vec<Project>, ScanError> {
    let root = &options.root;
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.clone()));
    }

    let mut projects = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(options.max_depth)
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry, options));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(ScanError::Walk { root: root.clone(), source: err });
            }
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable path");
                continue;
            }
        };

        if entry.file_type().is_dir() && is_terraform_project(entry.path()) {
            projects.push(analyze_project(entry.path()));
        }
    }

    tracing::info!(root = %root.display(), found = projects.len(), "discovery finished");
    Ok(projects)
}

fn is_skipped(entry: &DirEntry, options: &ScanOptions) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return false;
    }

    let name = entry.file_name().to_string_lossy();

    if name == TERRAFORM_DIR {
        return true;
    }

    if options.excluded.iter().any(|excluded| name == excluded.as_str()) {
        return true;
    }

    options.exclude_hidden && name.starts_with('.')
}

fn is_terraform_project(dir: &Path) -> bool {
    dir.join(TERRAFORM_DIR).is_dir()
}

fn analyze_project(project_dir: &Path) -> Project {
    let name = project_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .or_else(|| {
            // "." and friends carry no file name of their own
            fs::canonicalize(project_dir)
                .ok()
                .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().to_string()))
        })
        .unwrap_or_else(|| project_dir.display().to_string());

    Project::new(project_dir, name, get_last_modified_time(project_dir))
}

/// newest modification time among the project's `.tf` files
fn get_last_modified_time(project_dir: &Path) -> Option<DateTime<Utc>> {
    let mut latest: Option<DateTime<Utc>> = None;

    let Ok(read_dir) = fs::read_dir(project_dir) else {
        return None;
    };

    for entry in read_dir.flatten() {
        let path = entry.path();

        if_chain! {
            if path.extension() == Some(OsStr::new("tf"));
            if let Ok(metadata) = entry.metadata();
            if let Ok(modified) = metadata.modified();
            then {
                let datetime: DateTime<Utc> = modified.into();
                latest = Some(latest.map_or(datetime, |prev| prev.max(datetime)));
            }
        }
    }

    latest.or_else(|| {
        fs::metadata(project_dir)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .ok()
    })
}

pub fn sort_projects(projects: &mut [Project], sort_by: SortBy) {
    match sort_by {
        SortBy::Name => {
            projects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        }
        SortBy::Path => {
            projects.sort_by(|a, b| a.path.cmp(&b.path));
        }
        SortBy::LastMod => {
            projects.sort_by(|a, b| {
                match (a.last_modified, b.last_modified) {
                    (Some(a_time), Some(b_time)) => b_time.cmp(&a_time),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.path.cmp(&b.path),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn options(root: &Path) -> ScanOptions {
        ScanOptions {
            root: root.to_path_buf(),
            excluded: Vec::new(),
            exclude_hidden: false,
            max_depth: 8,
        }
    }

    fn layout(entries: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for entry in entries {
            let path = dir.path().join(entry);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        dir
    }

    fn names(projects: &[Project]) -> Vec<String> {
        let mut names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_project_in_root() {
        let dir = layout(&[".terraform/terraform.tfstate"]);
        let projects = discover(&options(dir.path())).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].path, dir.path());
    }

    #[test]
    fn test_ignores_files() {
        let dir = layout(&[".terraform/terraform.tfstate", "main.tf", "notes/readme.md"]);
        let projects = discover(&options(dir.path())).unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn test_ignores_dot_directories_without_terraform() {
        let dir = layout(&[".terraform/terraform.tfstate", ".test/test.tf"]);
        let projects = discover(&options(dir.path())).unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn test_finds_nested_projects() {
        let dir = layout(&[
            ".terraform/terraform.tfstate",
            "project/.terraform/terraform.tfstate",
            "stack/sub/.terraform/terraform.tfstate",
        ]);
        let projects = discover(&options(dir.path())).unwrap();
        assert_eq!(projects.len(), 3);
        assert!(names(&projects).contains(&"project".to_string()));
        assert!(names(&projects).contains(&"sub".to_string()));
    }

    #[test]
    fn test_does_not_descend_into_terraform_dir() {
        let dir = layout(&["live/.terraform/modules/vpc/.terraform/x"]);
        let projects = discover(&options(dir.path())).unwrap();
        assert_eq!(names(&projects), vec!["live"]);
    }

    #[test]
    fn test_excluded_and_hidden_directories() {
        let dir = layout(&[
            "live/.terraform/x",
            "archive/old/.terraform/x",
            ".cache/tmp/.terraform/x",
        ]);

        let mut opts = options(dir.path());
        opts.excluded = vec!["archive".to_string()];
        opts.exclude_hidden = true;

        let projects = discover(&opts).unwrap();
        assert_eq!(names(&projects), vec!["live"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let result = discover(&options(&dir.path().join("nope")));
        assert!(matches!(result, Err(ScanError::MissingRoot(_))));
    }

    #[test]
    fn test_last_modified_from_tf_files() {
        let dir = layout(&["live/.terraform/x", "live/main.tf"]);
        let projects = discover(&options(dir.path())).unwrap();
        assert!(projects[0].last_modified.is_some());
        assert_eq!(projects[0].days_since_modified(), Some(0));
    }

    #[test]
    fn test_sort_projects() {
        let mut projects = vec![
            Project::new("/b", "beta", None),
            Project::new("/a", "alpha", Some(Utc::now())),
        ];
        sort_projects(&mut projects, SortBy::Name);
        assert_eq!(projects[0].name, "alpha");

        sort_projects(&mut projects, SortBy::Path);
        assert_eq!(projects[0].path, PathBuf::from("/a"));

        sort_projects(&mut projects, SortBy::LastMod);
        assert_eq!(projects[0].name, "alpha");
    }
}
