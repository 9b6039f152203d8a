//! The view state machine.
//!
//! `App` owns the project registry and every piece of view state. It reacts to
//! one [`Message`] at a time; runner units never touch it directly, they send
//! their results back through the channel.

use std::{path::PathBuf, sync::Arc};
use crossterm::event::KeyEvent;
use tokio::{sync::mpsc::UnboundedSender, task};

use crate::{
    batch::{BatchCoordinator, BatchScope},
    cli::SortBy,
    keymap::{self, Action},
    message::Message,
    project::{CommandKind, Project, ProjectRegistry},
    scanner::{self, ScanOptions},
    terraform::{Completion, ToolInvoker},
    ui::{
        confirm::{ConfirmPrompt, Decision},
        output::OutputView,
        table::ProjectTable,
    },
};

const CONFIRM_QUESTION: &str = "Are you sure? This will apply with auto-approve";
const PAGE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Table,
    Detail,
    Confirming,
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub scan: ScanOptions,
    pub validate_on_refresh: bool,
    pub sort: SortBy,
}

/// An apply waiting for the user's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBatch {
    pub targets: Vec<PathBuf>,
    pub label: String,
    pub scope: BatchScope,
}

pub struct App {
    pub(crate) registry: ProjectRegistry,
    pub(crate) table: ProjectTable,
    pub(crate) output: OutputView,
    pub(crate) confirm: ConfirmPrompt,
    pub(crate) batches: BatchCoordinator,
    pub(crate) mode: ViewMode,
    pub(crate) pending: Option<PendingBatch>,
    pub(crate) working: bool,
    pub(crate) message: String,
    pub(crate) show_help: bool,
    pub(crate) spinner_frame: usize,
    options: AppOptions,
    invoker: Arc<dyn ToolInvoker>,
    sender: UnboundedSender<Message>,
    should_quit: bool,
    fatal: Option<String>,
}

impl App {
    pub fn new(options: AppOptions, invoker: Arc<dyn ToolInvoker>, sender: UnboundedSender<Message>) -> Self {
        Self {
            registry: ProjectRegistry::new(Vec::new()),
            table: ProjectTable::new(options.sort),
            output: OutputView::default(),
            confirm: ConfirmPrompt::new(CONFIRM_QUESTION),
            batches: BatchCoordinator::new(),
            mode: ViewMode::Table,
            pending: None,
            working: false,
            message: String::new(),
            show_help: false,
            spinner_frame: 0,
            options,
            invoker,
            sender,
            should_quit: false,
            fatal: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn take_fatal(&mut self) -> Option<String> {
        self.fatal.take()
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Tick => {
                if self.working {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }
            Message::Refreshed(projects) => self.load_projects(projects),
            Message::Completed { generation, completion } => self.apply_completion(generation, completion),
            Message::BatchFinished { generation, status } => self.finish_batch(generation, status),
            Message::Fatal(err) => {
                tracing::error!(%err, "fatal error");
                self.fatal = Some(err);
                self.should_quit = true;
            }
        }
    }

    /// Replace the registry with a fresh discovery result and, if configured,
    /// validate everything that was found.
    pub fn load_projects(&mut self, projects: Vec<Project>) {
        self.registry.replace(projects);
        self.table.set_rows(self.registry.projects().to_vec());
        self.working = self.batches.progress().is_some();

        if self.registry.is_empty() {
            self.message = "No Terraform projects found".to_string();
            return;
        }

        self.message = format!("Found {} project(s)", self.registry.len());

        if self.options.validate_on_refresh {
            let targets = self.targets(BatchScope::All);
            let label = self.label(CommandKind::Validate, BatchScope::All);
            self.dispatch(targets, CommandKind::Validate, label, BatchScope::All);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            ViewMode::Confirming => self.handle_confirm_key(key),
            ViewMode::Detail => self.handle_detail_key(key),
            ViewMode::Table if self.table.is_filtering() => self.table.handle_filter_key(&key),
            ViewMode::Table => {
                if let Some(action) = keymap::action_for(&key) {
                    self.handle_table_action(action);
                }
            }
        }
    }

    fn handle_table_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Help => self.show_help = !self.show_help,
            Action::ToggleOutput => self.show_output(),
            Action::Up => self.table.previous(),
            Action::Down => self.table.next(),
            Action::Select => self.table.toggle_selected(),
            Action::SelectAll => self.table.select_all_visible(),
            Action::DeselectAll => self.table.deselect_all(),
            Action::Filter => self.table.begin_filter(),
            Action::Refresh => self.refresh(),
            Action::ValidateHighlighted => self.request(CommandKind::Validate, BatchScope::Highlighted),
            Action::ValidateSelected => self.request(CommandKind::Validate, BatchScope::Selection),
            Action::PlanHighlighted => self.request(CommandKind::Plan, BatchScope::Highlighted),
            Action::PlanSelected => self.request(CommandKind::Plan, BatchScope::Selection),
            Action::ApplyHighlighted => self.request(CommandKind::Apply, BatchScope::Highlighted),
            Action::ApplySelected => self.request(CommandKind::Apply, BatchScope::Selection),
            Action::Cancel | Action::Yes | Action::No | Action::PageUp | Action::PageDown => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match keymap::action_for(&key) {
            Some(Action::ToggleOutput) | Some(Action::Cancel) => self.mode = ViewMode::Table,
            Some(Action::Quit) => self.should_quit = true,
            Some(Action::Up) => self.output.scroll_by(-1),
            Some(Action::Down) => self.output.scroll_by(1),
            Some(Action::PageUp) => self.output.scroll_by(-PAGE),
            Some(Action::PageDown) => self.output.scroll_by(PAGE),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let decision = match keymap::action_for(&key) {
            Some(Action::Yes) => Some(Decision::Yes),
            Some(Action::No) | Some(Action::Cancel) => Some(Decision::No),
            _ => self.confirm.handle_key(&key),
        };

        match decision {
            Some(Decision::Yes) => self.confirm_pending(),
            Some(Decision::No) => self.discard_pending(),
            None => {}
        }
    }

    fn show_output(&mut self) {
        if let Some(project) = self.table.highlighted() {
            self.output.show(project);
            self.mode = ViewMode::Detail;
        }
    }

    /// Target paths for a scope, resolved against the current view.
    fn targets(&self, scope: BatchScope) -> Vec<PathBuf> {
        match scope {
            BatchScope::All => self.registry.iter().map(|p| p.path.clone()).collect(),
            BatchScope::Selection => self.table.selected_identities(),
            BatchScope::Highlighted => self
                .table
                .highlighted_identity()
                .map(|path| vec![path.to_path_buf()])
                .unwrap_or_default(),
        }
    }

    fn label(&self, kind: CommandKind, scope: BatchScope) -> String {
        match scope {
            BatchScope::All => format!("Terraform {}: all projects", kind.title()),
            BatchScope::Selection => format!("Terraform {}: selected projects", kind.title()),
            BatchScope::Highlighted => {
                let name = self.table.highlighted().map_or("", |p| p.name.as_str());
                format!("Terraform {}: {}", kind.title(), name)
            }
        }
    }

    /// Run `kind` on the targets of `scope`, or park it behind the
    /// confirmation prompt when the command is destructive.
    fn request(&mut self, kind: CommandKind, scope: BatchScope) {
        let targets = self.targets(scope);
        if targets.is_empty() {
            self.message = empty_target_message(scope).to_string();
            return;
        }

        let label = self.label(kind, scope);

        if !kind.requires_confirmation() {
            self.dispatch(targets, kind, label, scope);
            return;
        }

        tracing::debug!(targets = targets.len(), %label, "awaiting confirmation");
        self.pending = Some(PendingBatch { targets, label, scope });
        self.confirm.reset();
        self.mode = ViewMode::Confirming;
    }

    fn confirm_pending(&mut self) {
        self.mode = ViewMode::Table;
        if let Some(pending) = self.pending.take() {
            self.dispatch(pending.targets, CommandKind::Apply, pending.label, pending.scope);
        }
    }

    fn discard_pending(&mut self) {
        self.mode = ViewMode::Table;
        if let Some(pending) = self.pending.take() {
            tracing::debug!(label = %pending.label, "apply declined");
            self.message = "Apply cancelled".to_string();
        }
    }

    fn dispatch(&mut self, targets: Vec<PathBuf>, kind: CommandKind, label: impl Into<String>, scope: BatchScope) {
        let label = label.into();
        let projects = self.registry.snapshots(&targets);

        self.working = true;
        self.message.clone_from(&label);

        let generation = self.batches.dispatch(
            projects,
            kind,
            label,
            scope,
            Arc::clone(&self.invoker),
            self.sender.clone(),
        );
        tracing::debug!(generation, ?scope, "working");
    }

    fn refresh(&mut self) {
        self.working = true;
        self.message = "Searching for Terraform projects".to_string();

        let sender = self.sender.clone();
        let options = self.options.scan.clone();

        tokio::spawn(async move {
            let message = match task::spawn_blocking(move || scanner::discover(&options)).await {
                Ok(Ok(projects)) => Message::Refreshed(projects),
                Ok(Err(err)) => Message::Fatal(err.to_string()),
                Err(err) => Message::Fatal(format!("project discovery stopped: {err}")),
            };
            let _ = sender.send(message);
        });
    }

    /// Store a runner result on its project before anything else looks at it.
    fn apply_completion(&mut self, generation: u64, completion: Completion) {
        let Completion { path, kind, result } = completion;

        match result {
            Ok(updated) => match self.registry.apply(&updated) {
                Some(stored) => {
                    self.table.set_content(stored);
                    if self.mode == ViewMode::Detail {
                        self.output.follow(stored);
                    }
                    self.message = format!("{} {}", kind.done_verb(), stored.name);
                }
                None => {
                    tracing::debug!(path = %path.display(), "completion for a project no longer listed");
                }
            },
            Err(err) => {
                self.message = format!("Terraform {} failed: {}", kind.title(), err);
            }
        }

        if let Some(fraction) = self.batches.record(generation) {
            tracing::debug!(generation, fraction, "batch progress");
        }
    }

    fn finish_batch(&mut self, generation: u64, status: String) {
        if self.batches.finish(generation) {
            self.working = false;
            self.message = status;
        }
    }
}

fn empty_target_message(scope: BatchScope) -> &'static str {
    match scope {
        BatchScope::Selection => "No projects selected",
        _ => "No project highlighted",
    }
}
