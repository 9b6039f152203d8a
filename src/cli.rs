use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::{app::AppOptions, scanner::ScanOptions};

#[derive(Parser, Clone, Debug)]
#[command(
    name = "tfscan",
    about = "Find Terraform projects and validate, plan or apply them",
    version
)]
pub struct Cli {
    /// directory to start searching from
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// search from user's home directory
    #[arg(short = 'f', long)]
    pub full: bool,

    /// exclude directories from search (comma-separated)
    #[arg(short = 'E', long)]
    pub exclude: Option<String>,

    /// exclude hidden directories
    #[arg(short = 'x', long)]
    pub exclude_hidden: bool,

    /// sort projects by name, path, or last modified
    #[arg(short, long, value_enum, default_value = "last-mod")]
    pub sort: SortBy,

    /// don't run `terraform validate` on every project after a refresh
    #[arg(long)]
    pub no_validate: bool,

    /// terraform binary to run
    #[arg(long, default_value = "terraform")]
    pub terraform: String,

    /// just list projects without interactive mode
    #[arg(short, long)]
    pub list_only: bool,

    /// print the project list as JSON (with --list-only)
    #[arg(long, requires = "list_only")]
    pub json: bool,

    /// write debug logs to debug.log
    #[arg(long)]
    pub debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    Name,
    Path,
    #[default]
    LastMod,
}

impl Cli {
    pub fn get_search_directory(&self) -> Result<PathBuf> {
        if self.full {
            dirs::home_dir().context("failed to get home directory")
        } else {
            Ok(self.directory.clone())
        }
    }

    pub fn get_excluded_dirs(&self) -> Vec<String> {
        self.exclude
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|dir| dir.trim().to_string())
                    .filter(|dir| !dir.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn scan_options(&self) -> Result<ScanOptions> {
        Ok(ScanOptions {
            root: self.get_search_directory()?,
            excluded: self.get_excluded_dirs(),
            exclude_hidden: self.exclude_hidden,
            max_depth: if self.full { 10 } else { 8 },
        })
    }

    pub fn app_options(&self) -> Result<AppOptions> {
        Ok(AppOptions {
            scan: self.scan_options()?,
            validate_on_refresh: !self.no_validate,
            sort: self.sort,
        })
    }
}
