//! Typewriter effect for filling a single field.

use std::str::CharIndices;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::AnimationConfig;

/// Lazy sequence of prefixes of a string, one per character.
///
/// `"ab"` yields `"a"` then `"ab"`. Prefixes always end on a character
/// boundary, so multi-byte text is revealed one character at a time.
#[derive(Debug, Clone)]
pub struct TypingFrames<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
}

impl<'a> TypingFrames<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices(),
        }
    }
}

impl<'a> Iterator for TypingFrames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, c) = self.chars.next()?;
        Some(&self.text[..start + c.len_utf8()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

/// How an animation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Every prefix was emitted and the closing pause elapsed.
    Completed,
    /// The token fired; nothing was emitted after that.
    Cancelled,
}

/// Drives [`TypingFrames`] in time.
///
/// The effect reads as "clear, type, pause": the empty string is emitted
/// first, then `settle_delay`, then one prefix per character with
/// `char_delay` after each, then `settle_delay` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingAnimator {
    char_delay: Duration,
    settle_delay: Duration,
}

impl Default for TypingAnimator {
    fn default() -> Self {
        Self::from_config(&AnimationConfig::default())
    }
}

impl TypingAnimator {
    pub fn new(char_delay: Duration, settle_delay: Duration) -> Self {
        Self {
            char_delay,
            settle_delay,
        }
    }

    pub fn from_config(config: &AnimationConfig) -> Self {
        Self::new(config.char_delay(), config.settle_delay())
    }

    /// Animator without delays. Still yields to the scheduler between steps.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn char_delay(&self) -> Duration {
        self.char_delay
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Total time an uncancelled animation of `text` takes.
    pub fn duration_for(&self, text: &str) -> Duration {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        self.settle_delay * 2 + self.char_delay * chars
    }

    /// Type `target` into `on_step`.
    ///
    /// The token is checked at every suspension point; once it fires no
    /// further step is emitted and the call returns right away.
    pub async fn animate<F>(
        &self,
        target: &str,
        cancel: &CancellationToken,
        mut on_step: F,
    ) -> AnimationOutcome
    where
        F: FnMut(&str),
    {
        if cancel.is_cancelled() {
            return AnimationOutcome::Cancelled;
        }

        on_step("");
        if !pause(self.settle_delay, cancel).await {
            return AnimationOutcome::Cancelled;
        }

        for frame in TypingFrames::new(target) {
            if cancel.is_cancelled() {
                return AnimationOutcome::Cancelled;
            }
            on_step(frame);
            if !pause(self.char_delay, cancel).await {
                return AnimationOutcome::Cancelled;
            }
        }

        if !pause(self.settle_delay, cancel).await {
            return AnimationOutcome::Cancelled;
        }
        AnimationOutcome::Completed
    }
}

/// Sleep for `delay` unless cancelled first. Returns `false` on cancellation.
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
