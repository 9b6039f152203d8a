//! Fan-out of runner units and progress accounting per batch.
//!
//! Every dispatch gets a new generation number. Completions and the trailing
//! finished signal carry that number, so a superseded batch can never move
//! the progress of the one that replaced it.

use std::sync::Arc;
use tokio::{sync::mpsc::UnboundedSender, task::JoinSet};

use crate::{
    message::Message,
    project::{CommandKind, Project},
    terraform::{self, ToolInvoker},
};

pub const FINISHED_STATUS: &str = "Projects updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchScope {
    /// every known project, chained after a refresh
    All,
    Selection,
    Highlighted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub generation: u64,
    pub kind: CommandKind,
    pub label: String,
    pub scope: BatchScope,
    pub total: usize,
    pub completed: usize,
}

impl BatchProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Single-target runs only get the spinner.
    pub fn shows_gauge(&self) -> bool {
        self.scope == BatchScope::All || self.total > 1
    }
}

#[derive(Debug, Default)]
pub struct BatchCoordinator {
    generation: u64,
    active: Option<BatchProgress>,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one runner per project. Completions are sent as they resolve and
    /// a single `BatchFinished` follows once all of them have been sent.
    pub fn dispatch(
        &mut self,
        projects: Vec<Project>,
        kind: CommandKind,
        label: impl Into<String>,
        scope: BatchScope,
        invoker: Arc<dyn ToolInvoker>,
        sender: UnboundedSender<Message>,
    ) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        if let Some(previous) = self.active.take() {
            tracing::debug!(
                superseded = previous.generation,
                completed = previous.completed,
                total = previous.total,
                "batch superseded"
            );
        }

        let label = label.into();
        tracing::info!(generation, command = %kind, total = projects.len(), %label, "dispatching batch");

        self.active = Some(BatchProgress {
            generation,
            kind,
            label,
            scope,
            total: projects.len(),
            completed: 0,
        });

        tokio::spawn(run_batch(generation, projects, kind, invoker, sender));
        generation
    }

    /// Count one completion. Returns the new fraction when the completion
    /// belongs to the active batch.
    pub fn record(&mut self, generation: u64) -> Option<f64> {
        let progress = self.active.as_mut().filter(|p| p.generation == generation)?;
        progress.completed = (progress.completed + 1).min(progress.total);
        Some(progress.fraction())
    }

    /// Clear progress if `generation` is the active batch.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.is_active(generation) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|progress| progress.generation == generation)
    }

    pub fn progress(&self) -> Option<&BatchProgress> {
        self.active.as_ref()
    }
}

async fn run_batch(
    generation: u64,
    projects: Vec<Project>,
    kind: CommandKind,
    invoker: Arc<dyn ToolInvoker>,
    sender: UnboundedSender<Message>,
) {
    let mut units = JoinSet::new();

    for project in projects {
        let invoker = Arc::clone(&invoker);
        let sender = sender.clone();

        units.spawn(async move {
            let completion = terraform::execute(invoker.as_ref(), project, kind).await;
            // receiver gone means the session is over
            let _ = sender.send(Message::Completed { generation, completion });
        });
    }

    while let Some(joined) = units.join_next().await {
        if let Err(err) = joined {
            tracing::error!(generation, %err, "runner task failed");
        }
    }

    let _ = sender.send(Message::BatchFinished {
        generation,
        status: FINISHED_STATUS.to_string(),
    });
}
