//! Bidirectional scroll synchronization between the editor and the preview.
//!
//! Both views report every change of their scroll position, including the
//! ones caused by a sync command. A single lock shared by both directions
//! swallows those echoes: after a view is told to follow, reports from
//! either side are ignored until the lock window passes.

use std::time::{Duration, Instant};

pub const SYNC_LOCK_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOrigin {
    Editor,
    Preview,
}

impl ScrollOrigin {
    pub fn other(self) -> Self {
        match self {
            ScrollOrigin::Editor => ScrollOrigin::Preview,
            ScrollOrigin::Preview => ScrollOrigin::Editor,
        }
    }
}

/// Instruction for `target` to scroll to `percentage`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCommand {
    pub target: ScrollOrigin,
    pub percentage: f64,
}

#[derive(Debug, Default)]
pub struct ScrollSync {
    locked_until: Option<Instant>,
}

impl ScrollSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some()
    }

    /// Handles a scroll report from `origin`. Returns the command for the
    /// other view, or `None` when the report must not propagate.
    pub fn on_scroll(
        &mut self,
        origin: ScrollOrigin,
        percentage: f64,
        now: Instant,
        enabled: bool,
        target_available: bool,
    ) -> Option<ScrollCommand> {
        if !enabled || !target_available {
            return None;
        }
        self.tick(now);
        if self.is_locked() {
            tracing::trace!(?origin, "scroll report absorbed by sync lock");
            return None;
        }
        self.locked_until = Some(now + SYNC_LOCK_WINDOW);
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 1.0)
        } else {
            0.0
        };
        tracing::debug!(?origin, percentage, "sync scroll");
        Some(ScrollCommand {
            target: origin.other(),
            percentage,
        })
    }

    /// Releases the lock once its window has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if self.locked_until.is_some_and(|until| now >= until) {
            self.locked_until = None;
        }
    }
}

/// Fraction of the scrollable range currently scrolled past. Zero when the
/// content fits in the viewport.
pub fn scroll_percentage(scroll_top: usize, scroll_height: usize, client_height: usize) -> f64 {
    let range = scroll_height.saturating_sub(client_height);
    if range == 0 {
        return 0.0;
    }
    (scroll_top as f64 / range as f64).clamp(0.0, 1.0)
}

/// Inverse of [`scroll_percentage`], rounded to the nearest row.
pub fn scroll_top_for_percentage(percentage: f64, scroll_height: usize, client_height: usize) -> usize {
    let range = scroll_height.saturating_sub(client_height);
    if range == 0 || !percentage.is_finite() {
        return 0;
    }
    let top = (percentage.clamp(0.0, 1.0) * range as f64).round() as usize;
    top.min(range)
}
