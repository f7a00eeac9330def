//! Session controller state machine.
//!
//! A session is one run from trigger to completion or abort:
//!
//! ```text
//! Idle --run--> Running --stream ends, queue drained--> Completed
//!                  |--stop------------------------------> Aborted
//!                  '--transport failure-----------------> Aborted
//! Completed | Aborted --reset (or run)--> Idle
//! ```
//!
//! The controller owns the stream connection through a worker task. The
//! worker reads the stream and drains the fill queue side by side, so the
//! transport is read eagerly while the typing effect lags behind.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut session = SessionController::new(Arc::new(ReplaySource::new(body)), TypingAnimator::default());
//! session.run("資料Aを入力して")?;
//! assert_eq!(session.wait().await, SessionPhase::Completed);
//! ```

mod controller;
mod worker;

#[cfg(test)]
mod tests;

pub use controller::SessionController;
