use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use super::app::{App, Message};
use super::rendering::ui;
use super::validation::{self, Effect, ProviderFactory};

/// Runs effects on the tokio runtime and reports back over the channel.
#[derive(Clone)]
pub struct EffectRunner {
    tx: mpsc::UnboundedSender<Message>,
    factory: ProviderFactory,
}

impl EffectRunner {
    pub fn new(tx: mpsc::UnboundedSender<Message>, factory: ProviderFactory) -> Self {
        Self { tx, factory }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.spawn(effect);
        }
    }

    fn spawn(&self, effect: Effect) {
        let tx = self.tx.clone();
        match effect {
            Effect::ScheduleValidation { provider, key, delay } => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // Receiver gone means the UI has exited.
                    let _ = tx.send(Message::DebounceElapsed { provider, key });
                });
            }
            Effect::Validate(request) => {
                let client = (self.factory)(request.provider);
                tokio::spawn(async move {
                    let valid = validation::validate_credentials(client, &request).await;
                    let _ = tx.send(Message::ValidationFinished {
                        provider: request.provider,
                        key: request.key,
                        valid,
                    });
                });
            }
        }
    }
}

/// Feed `message` to the model and start whatever it asks for.
pub fn dispatch(app: &mut App, runner: &EffectRunner, message: Message) {
    runner.run(app.update(message));
}

/// Deliver every message already waiting on the channel.
pub fn drain(app: &mut App, runner: &EffectRunner, rx: &mut mpsc::UnboundedReceiver<Message>) {
    while let Ok(message) = rx.try_recv() {
        dispatch(app, runner, message);
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub async fn run_tui(mut app: App, factory: ProviderFactory) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = EffectRunner::new(tx, factory);

    let res = run_app(&mut terminal, &mut app, &runner, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!("TUI loop failed: {}", err);
    }
    res.map_err(Into::into)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &EffectRunner,
    rx: &mut mpsc::UnboundedReceiver<Message>,
) -> io::Result<()> {
    loop {
        dispatch(app, runner, Message::Tick);
        drain(app, runner, rx);

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if is_quit(&key) {
                    return Ok(());
                }
                dispatch(app, runner, Message::Key(key));
            }
        }

        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
    }
}
