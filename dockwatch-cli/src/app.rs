use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;

use dockwatch_core::config::DashboardConfig;
use dockwatch_core::model::{Direction, LifecycleAction, OperatorInput};
use dockwatch_core::orchestrator::{LoopControl, RefreshEvent, RefreshOrchestrator};
use dockwatch_core::runtime::{ContainerRuntime, TailEvent};
use dockwatch_core::sampler::Sampler;

use crate::adapters::DockerTailer;
use crate::ui;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

fn setup_terminal() -> io::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(mut terminal: Term) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Map a key press to an operator input
pub fn map_key(key: KeyEvent) -> Option<OperatorInput> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(OperatorInput::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(OperatorInput::Move(Direction::Up)),
        KeyCode::Down | KeyCode::Char('j') => Some(OperatorInput::Move(Direction::Down)),
        KeyCode::Enter => Some(OperatorInput::Confirm),
        KeyCode::Esc => Some(OperatorInput::Cancel),
        KeyCode::Char('q') => Some(OperatorInput::Quit),
        KeyCode::Char(c) => LifecycleAction::from_key(c).map(OperatorInput::Lifecycle),
        _ => None,
    }
}

/// Run the dashboard until the operator quits
pub async fn run(config: &DashboardConfig, runtime: Arc<dyn ContainerRuntime>) -> Result<()> {
    let (tail_tx, tail_rx) = mpsc::unbounded_channel();
    let tailer = DockerTailer::new(config.runtime.binary.clone(), tail_tx);
    let (mut orch, refresh_rx) =
        RefreshOrchestrator::new(Sampler::new(runtime), Box::new(tailer), config);

    let mut terminal = setup_terminal().context("failed to initialise terminal")?;
    let result = event_loop(&mut terminal, &mut orch, refresh_rx, tail_rx).await;
    orch.handle_input(OperatorInput::Quit);
    restore_terminal(terminal).context("failed to restore terminal")?;
    result
}

async fn event_loop(
    terminal: &mut Term,
    orch: &mut RefreshOrchestrator,
    mut refresh_rx: mpsc::UnboundedReceiver<RefreshEvent>,
    mut tail_rx: mpsc::UnboundedReceiver<TailEvent>,
) -> Result<()> {
    // first tick fires immediately
    let mut ticker = tokio::time::interval(orch.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input = EventStream::new();

    info!(period_ms = orch.period().as_millis() as u64, "dashboard started");

    loop {
        terminal.draw(|f| ui::draw(f, orch))?;

        tokio::select! {
            _ = ticker.tick() => orch.tick(),
            Some(event) = refresh_rx.recv() => orch.apply(event),
            Some(event) = tail_rx.recv() => {
                orch.on_tail_event(event);
            }
            next = input.next() => match next {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(op) = map_key(key) {
                        if orch.handle_input(op) == LoopControl::Quit {
                            info!("quit requested");
                            return Ok(());
                        }
                    }
                }
                // resize and friends only need a redraw
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("failed to read terminal input"),
                None => return Ok(()),
            },
        }
    }
}
