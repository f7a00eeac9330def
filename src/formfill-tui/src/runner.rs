//! Main event loop.

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use formfill_engine::SessionController;
use futures::StreamExt;

use crate::app::App;
use crate::input::{Action, EditOp, map_key};
use crate::terminal::{FormfillTerminal, TerminalOptions};
use crate::ui;

/// Run the interactive UI until the user quits.
///
/// Redraws whenever the session publishes a new snapshot and after every
/// terminal event. Any run still in progress is stopped on the way out.
pub async fn run(mut session: SessionController, options: TerminalOptions) -> Result<()> {
    let mut terminal = FormfillTerminal::with_options(options)?;
    let mut events = EventStream::new();
    let mut snapshots = session.subscribe();
    let mut app = App::new();

    tracing::info!("TUI started");

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        terminal.draw(|frame| ui::render(frame, &app, &snapshot))?;

        if app.should_quit() {
            break;
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    tracing::warn!("Session state channel closed");
                    break;
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if let Some(action) = map_key(key) {
                        app.apply(action, &mut session).await;
                    }
                }
                Some(Ok(Event::Paste(text))) => {
                    app.apply(Action::Edit(EditOp::InsertStr(text)), &mut session).await;
                }
                // resize and the rest only need the redraw at the top of the loop
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Terminal event stream failed");
                    session.stop().await;
                    return Err(e.into());
                }
                None => break,
            },
        }
    }

    session.stop().await;
    tracing::info!("TUI stopped");
    Ok(())
}
