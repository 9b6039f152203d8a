use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;

use crate::{cli::SortBy, project::Project, scanner};

/// Row set of the project table: highlight cursor, multi-selection and text
/// filter. Rows and selection are tracked by project path so that replacing
/// the rows keeps whatever the user had selected.
#[derive(Debug, Default)]
pub struct ProjectTable {
    rows: Vec<Project>,
    visible: Vec<usize>,
    state: TableState,
    selected: HashSet<PathBuf>,
    filter: String,
    filtering: bool,
    sort: SortBy,
}

impl ProjectTable {
    pub fn new(sort: SortBy) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Replace every row. Selection and highlight follow project paths.
    pub fn set_rows(&mut self, mut projects: Vec<Project>) {
        let highlighted = self.highlighted_identity().map(Path::to_path_buf);

        scanner::sort_projects(&mut projects, self.sort);
        self.rows = projects;

        let present: HashSet<&PathBuf> = self.rows.iter().map(|p| &p.path).collect();
        self.selected.retain(|path| present.contains(path));

        self.refilter(highlighted.as_deref());
    }

    /// Update one row in place. Returns false for an unknown path.
    pub fn set_content(&mut self, project: &Project) -> bool {
        match self.rows.iter_mut().find(|row| row.path == project.path) {
            Some(row) => {
                *row = project.clone();
                true
            }
            None => false,
        }
    }

    pub fn highlighted(&self) -> Option<&Project> {
        let index = self.state.selected()?;
        self.visible.get(index).map(|&row| &self.rows[row])
    }

    pub fn highlighted_identity(&self) -> Option<&Path> {
        self.highlighted().map(|project| project.path.as_path())
    }

    /// Selected paths in display order, including rows hidden by the filter.
    pub fn selected_identities(&self) -> Vec<PathBuf> {
        self.rows
            .iter()
            .filter(|row| self.selected.contains(&row.path))
            .map(|row| row.path.clone())
            .collect()
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    pub fn toggle_selected(&mut self) {
        let Some(path) = self.highlighted_identity().map(Path::to_path_buf) else {
            return;
        };
        if !self.selected.remove(&path) {
            self.selected.insert(path);
        }
    }

    pub fn select_all_visible(&mut self) {
        for &row in &self.visible {
            self.selected.insert(self.rows[row].path.clone());
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let index = match self.state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.state.select(Some(index));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let index = self.state.selected().map_or(0, |i| i.saturating_sub(1));
        self.state.select(Some(index));
    }

    pub fn begin_filter(&mut self) {
        self.filtering = true;
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Feed a key to the filter input. `Enter` keeps the filter, `Esc`
    /// clears it; both leave filter input.
    pub fn handle_filter_key(&mut self, key: &KeyEvent) {
        let highlighted = self.highlighted_identity().map(Path::to_path_buf);

        match key.code {
            KeyCode::Enter => self.filtering = false,
            KeyCode::Esc => {
                self.filtering = false;
                self.filter.clear();
            }
            KeyCode::Backspace => {
                self.filter.pop();
            }
            KeyCode::Char(c) => self.filter.push(c),
            _ => return,
        }

        self.refilter(highlighted.as_deref());
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Project> {
        self.visible.iter().map(move |&row| &self.rows[row])
    }

    pub fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    fn refilter(&mut self, keep: Option<&Path>) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty()
                    || row.name.to_lowercase().contains(&needle)
                    || row.path.to_string_lossy().to_lowercase().contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();

        let position = keep.and_then(|path| {
            self.visible
                .iter()
                .position(|&row| self.rows[row].path == path)
        });

        let index = match position {
            Some(index) => Some(index),
            None if self.visible.is_empty() => None,
            None => Some(
                self.state
                    .selected()
                    .unwrap_or(0)
                    .min(self.visible.len() - 1),
            ),
        };
        self.state.select(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> Project {
        Project::new(format!("/infra/{name}"), name, None)
    }

    fn table(names: &[&str]) -> ProjectTable {
        let mut table = ProjectTable::new(SortBy::Name);
        table.set_rows(names.iter().map(|name| project(name)).collect());
        table
    }

    fn type_filter(table: &mut ProjectTable, text: &str) {
        table.begin_filter();
        for c in text.chars() {
            table.handle_filter_key(&KeyEvent::from(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_highlight_starts_on_first_row() {
        let table = table(&["b", "a"]);
        assert_eq!(table.highlighted().unwrap().name, "a");
    }

    #[test]
    fn test_selection_survives_row_replacement() {
        let mut table = table(&["a", "b", "c"]);
        table.next();
        table.toggle_selected();
        assert_eq!(table.selected_identities(), vec![PathBuf::from("/infra/b")]);

        table.set_rows(vec![project("d"), project("b"), project("c")]);
        assert_eq!(table.selected_identities(), vec![PathBuf::from("/infra/b")]);
        assert_eq!(table.highlighted().unwrap().name, "b");
    }

    #[test]
    fn test_selection_of_removed_rows_is_dropped() {
        let mut table = table(&["a", "b"]);
        table.select_all_visible();
        table.set_rows(vec![project("b")]);
        assert_eq!(table.selected_identities(), vec![PathBuf::from("/infra/b")]);
    }

    #[test]
    fn test_filter_narrows_visible_rows() {
        let mut table = table(&["network", "dns", "netbox"]);
        type_filter(&mut table, "net");

        let visible: Vec<&str> = table.visible_rows().map(|p| p.name.as_str()).collect();
        assert_eq!(visible, vec!["netbox", "network"]);
        assert!(table.is_filtering());

        table.select_all_visible();
        assert_eq!(table.selected_len(), 2);

        table.handle_filter_key(&KeyEvent::from(KeyCode::Esc));
        assert_eq!(table.visible_len(), 3);
        assert!(table.filter().is_empty());
    }

    #[test]
    fn test_filter_with_no_match_has_no_highlight() {
        let mut table = table(&["a", "b"]);
        type_filter(&mut table, "zzz");
        assert!(table.highlighted().is_none());
    }

    #[test]
    fn test_set_content_by_identity() {
        let mut table = table(&["a", "b"]);
        let mut updated = project("b");
        updated.output = "done".into();
        assert!(table.set_content(&updated));
        assert!(!table.set_content(&project("zzz")));

        table.next();
        assert_eq!(table.highlighted().unwrap().output, "done");
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut table = table(&["a", "b"]);
        table.previous();
        assert_eq!(table.highlighted().unwrap().name, "a");
        table.next();
        table.next();
        assert_eq!(table.highlighted().unwrap().name, "b");
    }
}
