//! Terminal setup, teardown, and management.
//!
//! The terminal is put into raw mode on the alternate screen for the life of
//! a [`FormfillTerminal`] and restored when it is dropped, including when the
//! process panics.

use std::io::{Stdout, stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// Track whether the panic hook has been installed to avoid installing it multiple times.
static PANIC_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Which terminal features were turned on, so that only those are turned off.
#[derive(Debug, Clone, Copy)]
struct EnabledFeatures {
    alternate_screen: bool,
    bracketed_paste: bool,
}

/// RAII guard that restores the terminal on drop.
pub struct TerminalGuard {
    features: EnabledFeatures,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal_impl(self.features);
    }
}

/// Terminal initialization options.
#[derive(Debug, Clone)]
pub struct TerminalOptions {
    /// Use the alternate screen buffer (keeps the shell scrollback intact).
    pub alternate_screen: bool,
    /// Deliver pastes as one event instead of a burst of key presses.
    pub bracketed_paste: bool,
    pub title: Option<String>,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            bracketed_paste: true,
            title: Some("formfill".to_string()),
        }
    }
}

impl TerminalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    pub fn bracketed_paste(mut self, enabled: bool) -> Self {
        self.bracketed_paste = enabled;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Wrapper around the ratatui terminal, restored on drop.
pub struct FormfillTerminal {
    pub terminal: Terminal<CrosstermBackend<Stdout>>,
    _guard: TerminalGuard,
}

impl FormfillTerminal {
    pub fn new() -> Result<Self> {
        Self::with_options(TerminalOptions::default())
    }

    /// # Errors
    ///
    /// Fails if stdout is not a terminal or raw mode cannot be enabled.
    pub fn with_options(options: TerminalOptions) -> Result<Self> {
        init_terminal(&options)?;

        // From here on the guard undoes whatever init enabled.
        let guard = TerminalGuard {
            features: EnabledFeatures {
                alternate_screen: options.alternate_screen,
                bracketed_paste: options.bracketed_paste,
            },
        };
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        Ok(Self {
            terminal,
            _guard: guard,
        })
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

fn init_terminal(options: &TerminalOptions) -> Result<()> {
    install_panic_hook();

    enable_raw_mode()?;

    let mut stdout = stdout();
    if options.alternate_screen {
        execute!(stdout, EnterAlternateScreen)?;
    }
    if options.bracketed_paste {
        execute!(stdout, EnableBracketedPaste)?;
    }
    execute!(stdout, Clear(ClearType::All), cursor::Hide)?;
    if let Some(ref title) = options.title {
        execute!(stdout, SetTitle(title))?;
    }

    Ok(())
}

/// Undo [`init_terminal`]. Every step is attempted even if an earlier one fails.
fn restore_terminal_impl(features: EnabledFeatures) -> Result<()> {
    let mut stdout = stdout();

    let _ = execute!(stdout, cursor::Show);
    if features.bracketed_paste {
        let _ = execute!(stdout, DisableBracketedPaste);
    }
    if features.alternate_screen {
        let _ = execute!(stdout, LeaveAlternateScreen);
    }

    disable_raw_mode()?;
    Ok(())
}

/// Restore the terminal with every feature assumed enabled.
///
/// Used from the panic hook, where the guard's state is unreachable.
pub fn restore_terminal() -> Result<()> {
    restore_terminal_impl(EnabledFeatures {
        alternate_screen: true,
        bracketed_paste: true,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
