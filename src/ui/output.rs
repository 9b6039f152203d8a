use std::path::PathBuf;

use crate::project::{CommandKind, Project};

/// Raw output of one project, as shown in detail mode.
#[derive(Debug, Default)]
pub struct OutputView {
    path: PathBuf,
    title: String,
    command: Option<CommandKind>,
    content: String,
    scroll: u16,
}

impl OutputView {
    pub fn show(&mut self, project: &Project) {
        self.path = project.path.clone();
        self.title = project.name.clone();
        self.command = project.last_command;
        self.content = project.output.clone();
        self.scroll = 0;
    }

    /// Refresh the content if `project` is the one on screen.
    pub fn follow(&mut self, project: &Project) -> bool {
        if project.path != self.path {
            return false;
        }
        self.command = project.last_command;
        self.content = project.output.clone();
        true
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn header(&self) -> String {
        let command = self.command.map_or("none", |kind| kind.as_str());
        format!("Output ({}): {}", command, self.title)
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let max = self.line_count().saturating_sub(1).min(u16::MAX as usize) as i32;
        self.scroll = (self.scroll as i32 + delta).clamp(0, max) as u16;
    }

    pub fn scroll_percent(&self, height: usize) -> f64 {
        let lines = self.line_count();
        if lines <= height {
            return 100.0;
        }
        let bottom = (self.scroll as usize + height).min(lines);
        bottom as f64 / lines as f64 * 100.0
    }
}
