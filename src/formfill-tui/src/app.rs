//! UI state outside the session snapshot, and how actions reach the session.

use formfill_engine::SessionController;
use tracing::debug;

use crate::input::{Action, InstructionInput, PRESETS};

/// Local state of the rendering surface.
#[derive(Debug, Default)]
pub struct App {
    pub input: InstructionInput,
    /// One-shot hint shown in the status bar until the next action.
    pub notice: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Apply `action`, forwarding run/stop/reset to `session`.
    pub async fn apply(&mut self, action: Action, session: &mut SessionController) {
        debug!(?action, "Applying action");
        self.notice = None;
        let running = session.is_running();

        match action {
            Action::Edit(op) => {
                if running {
                    self.notice = Some("Run in progress, press Esc to stop".to_string());
                } else {
                    self.input.apply(op);
                }
            }
            Action::Preset(n) => match PRESETS.get(n) {
                Some(preset) if !running => self.input.set(*preset),
                Some(_) => self.notice = Some("Run in progress, press Esc to stop".to_string()),
                None => {}
            },
            Action::Run if self.input.is_blank() => {
                self.notice = Some("Type an instruction first".to_string());
            }
            Action::Run => {
                if let Err(e) = session.run(self.input.text()) {
                    self.notice = Some(e.to_string());
                }
            }
            Action::Stop => {
                session.stop().await;
            }
            Action::Reset => {
                if let Err(e) = session.reset() {
                    self.notice = Some(e.to_string());
                }
            }
            Action::Quit => {
                session.stop().await;
                self.should_quit = true;
            }
        }
    }
}
