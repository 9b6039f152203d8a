use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Validate,
    Plan,
    Apply,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Validate => "validate",
            CommandKind::Plan => "plan",
            CommandKind::Apply => "apply",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CommandKind::Validate => "Validate",
            CommandKind::Plan => "Plan",
            CommandKind::Apply => "Apply",
        }
    }

    /// arguments passed to the terraform binary
    pub fn args(&self) -> Vec<&'static str> {
        match self {
            CommandKind::Apply => vec![self.as_str(), "-auto-approve"],
            _ => vec![self.as_str()],
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, CommandKind::Apply)
    }

    /// past tense used in status messages
    pub fn done_verb(&self) -> &'static str {
        match self {
            CommandKind::Validate => "Validated",
            CommandKind::Plan => "Planned",
            CommandKind::Apply => "Applied",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Valid,
    Invalid,
    #[default]
    Unknown,
}

impl Validity {
    pub fn symbol(&self) -> &'static str {
        match self {
            Validity::Valid => "✓",
            Validity::Invalid => "✗",
            Validity::Unknown => "?",
        }
    }
}

/// Result of the last plan (or apply) of a project.
///
/// `PlanError` and `DriftError` are classifications, not counts: they must
/// never be confused with a project that simply has nothing to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSummary {
    #[default]
    Unknown,
    Counts {
        add: u32,
        change: u32,
        destroy: u32,
    },
    PlanError,
    DriftError,
}

impl ChangeSummary {
    pub fn counts(add: u32, change: u32, destroy: u32) -> Self {
        ChangeSummary::Counts { add, change, destroy }
    }

    pub fn none() -> Self {
        Self::counts(0, 0, 0)
    }

    /// add / change / destroy cell texts
    pub fn cells(&self) -> [String; 3] {
        match self {
            ChangeSummary::Unknown => ["-".into(), "-".into(), "-".into()],
            ChangeSummary::Counts { add, change, destroy } => {
                [add.to_string(), change.to_string(), destroy.to_string()]
            }
            ChangeSummary::PlanError => ["Error".into(), "Error".into(), "Error".into()],
            ChangeSummary::DriftError => ["Drift".into(), "Drift".into(), "Drift".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub path: PathBuf,
    pub name: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_command: Option<CommandKind>,
    #[serde(skip)]
    pub output: String,
    pub validity: Validity,
    pub changes: ChangeSummary,
}

impl Project {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, last_modified: Option<DateTime<Utc>>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            last_modified,
            last_command: None,
            output: String::new(),
            validity: Validity::Unknown,
            changes: ChangeSummary::Unknown,
        }
    }

    pub fn days_since_modified(&self) -> Option<i64> {
        self.last_modified.map(|dt| {
            let now = Utc::now();
            (now - dt).num_days()
        })
    }

    pub fn format_last_modified(&self) -> String {
        self.last_modified
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// copy the command result fields of `other` into `self`
    fn absorb_result(&mut self, other: &Project) {
        self.last_command = other.last_command;
        self.output.clone_from(&other.output);
        self.validity = other.validity;
        self.changes = other.changes;
    }
}

/// The in-memory set of discovered projects, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
}

impl ProjectRegistry {
    pub fn new(projects: Vec<Project>) -> Self {
        let mut registry = Self::default();
        registry.replace(projects);
        registry
    }

    /// Swap in a freshly discovered collection. Duplicate paths keep their
    /// first occurrence.
    pub fn replace(&mut self, projects: Vec<Project>) {
        let mut seen = HashSet::new();
        self.projects = projects
            .into_iter()
            .filter(|project| seen.insert(project.path.clone()))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, path: &Path) -> Option<&Project> {
        self.projects.iter().find(|project| project.path == path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Project> {
        self.projects.iter_mut().find(|project| project.path == path)
    }

    /// Owned copies of the requested projects; unknown paths are skipped.
    pub fn snapshots(&self, paths: &[PathBuf]) -> Vec<Project> {
        paths
            .iter()
            .filter_map(|path| self.get(path).cloned())
            .collect()
    }

    /// Store the result carried by `updated` on the record with the same
    /// path. Returns the stored record, or `None` when the path is unknown.
    pub fn apply(&mut self, updated: &Project) -> Option<&Project> {
        let project = self.get_mut(&updated.path)?;
        project.absorb_result(updated);
        Some(&*project)
    }
}
