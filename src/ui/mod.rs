pub mod confirm;
pub mod output;
pub mod render;
pub mod table;

use anyhow::{anyhow, Result};
use std::{io::stdout, thread, time::Duration};
use crossterm::{
    cursor,
    execute,
    terminal,
    event::{self, Event, KeyEventKind},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{app::App, message::Message};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Take over the terminal and run `app` until it quits.
pub async fn run(app: &mut App, sender: UnboundedSender<Message>, receiver: UnboundedReceiver<Message>) -> Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    spawn_input_reader(sender);
    let result = run_interactive_loop(&mut terminal, app, receiver).await;

    execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen, cursor::Show)?;
    terminal::disable_raw_mode()?;

    result
}

async fn run_interactive_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut receiver: UnboundedReceiver<Message>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(TICK_RATE);

    loop {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            Some(message) = receiver.recv() => app.update(message),
            _ = ticker.tick() => app.update(Message::Tick),
        }

        // apply whatever else is queued before drawing again
        while let Ok(message) = receiver.try_recv() {
            app.update(message);
        }

        if let Some(err) = app.take_fatal() {
            return Err(anyhow!(err));
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}

/// Forward key presses into the message channel from a plain thread, since
/// crossterm's reader blocks.
fn spawn_input_reader(sender: UnboundedSender<Message>) {
    thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if sender.send(Message::Key(key)).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                let _ = sender.send(Message::Fatal(format!("failed to read terminal input: {err}")));
                break;
            }
        }
    });
}
