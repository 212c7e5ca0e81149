use crate::context::ScopeContext;
use crate::view_state::ViewCommand;
use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{info, warn};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the keyboard thread wakes to check for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View(ViewCommand),
    ExportCsv,
    SavePng,
    Quit,
}

pub fn action_for_key(key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let action = match key.code {
        KeyCode::Up => Action::View(ViewCommand::IncreaseSensitivity),
        KeyCode::Down => Action::View(ViewCommand::DecreaseSensitivity),
        KeyCode::Left => Action::View(ViewCommand::NarrowWindow),
        KeyCode::Right => Action::View(ViewCommand::WidenWindow),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::View(ViewCommand::ResetView),
        KeyCode::Char('p') | KeyCode::Char(' ') => Action::View(ViewCommand::TogglePause),
        KeyCode::Char('e') => Action::ExportCsv,
        KeyCode::Char('s') => Action::SavePng,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// Apply a view command and report the new view, the way the live
/// display's status line shows it.
pub fn apply_view_command(ctx: &ScopeContext, cmd: ViewCommand) {
    let view = ctx.view.apply(cmd);
    match cmd {
        ViewCommand::TogglePause => {
            info!("{}", if view.paused { "Paused" } else { "Resumed" });
        }
        _ => info!("{}", view),
    }
}

/// Reads key presses on its own thread. View commands are applied to the
/// shared view directly; everything else is forwarded to the render loop.
pub struct KeyboardInput {
    ctx: Arc<ScopeContext>,
    actions: Sender<Action>,
}

impl KeyboardInput {
    pub fn new(ctx: Arc<ScopeContext>, actions: Sender<Action>) -> Self {
        Self { ctx, actions }
    }

    pub fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("keyboard".into())
            .spawn(move || self.run())
    }

    fn run(&self) {
        while self.ctx.is_running() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("Keyboard poll failed: {}", e);
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }
            }
            let key = match event::read() {
                Ok(Event::Key(key)) => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Keyboard read failed: {}", e);
                    continue;
                }
            };
            match action_for_key(&key) {
                Some(Action::View(cmd)) => apply_view_command(&self.ctx, cmd),
                Some(action) => {
                    if self.actions.send(action).is_err() {
                        break;
                    }
                }
                None => {}
            }
        }
    }
}
