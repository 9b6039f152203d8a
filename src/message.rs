use crossterm::event::KeyEvent;

use crate::{project::Project, terraform::Completion};

/// Everything the controller reacts to arrives as one of these, one at a time.
#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Tick,
    Refreshed(Vec<Project>),
    Completed { generation: u64, completion: Completion },
    BatchFinished { generation: u64, status: String },
    Fatal(String),
}
