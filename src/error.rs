use std::{io, path::PathBuf};
use thiserror::Error;

use crate::project::CommandKind;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("search directory {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to search {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to run `{binary} {command}` in {}: {source}", dir.display())]
    Invocation {
        binary: String,
        command: CommandKind,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no plan summary line in output")]
    MissingSummary,

    #[error("invalid change count `{0}` in plan summary")]
    InvalidCount(String),
}
