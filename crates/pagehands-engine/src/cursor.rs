//! Synthetic on-page cursor.
//!
//! Purely visual feedback. Every failure is swallowed and reported as
//! `false` so it can never fail an action.

use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use pagehands_protocols::Coordinates;

use crate::context::PageContext;
use crate::scripts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorCue {
    Move,
    Click,
    Typing,
    Recenter,
}

impl CursorCue {
    fn as_str(self) -> &'static str {
        match self {
            CursorCue::Move => "move",
            CursorCue::Click => "click",
            CursorCue::Typing => "typing",
            CursorCue::Recenter => "recenter",
        }
    }
}

#[derive(Debug, Default)]
pub struct CursorSimulator {
    position: Mutex<Option<Coordinates>>,
}

impl CursorSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last position the cursor was sent to.
    pub fn position(&self) -> Option<Coordinates> {
        *self.position.lock()
    }

    /// Glide to `target`. Returns whether the cursor moved.
    pub async fn move_to(&self, ctx: &PageContext, target: Coordinates) -> bool {
        let moved = self.send(ctx, CursorCue::Move, target).await;
        if moved {
            *self.position.lock() = Some(target);
            let glide = ctx.config().cursor_move_ms;
            if glide > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(glide)).await;
            }
        }
        moved
    }

    pub async fn click_cue(&self, ctx: &PageContext) -> bool {
        let at = self.position().unwrap_or_default();
        self.send(ctx, CursorCue::Click, at).await
    }

    pub async fn typing_cue(&self, ctx: &PageContext) -> bool {
        let at = self.position().unwrap_or_default();
        self.send(ctx, CursorCue::Typing, at).await
    }

    /// Park the cursor in the middle of the viewport.
    pub async fn recenter(&self, ctx: &PageContext) -> bool {
        let done = self.send(ctx, CursorCue::Recenter, Coordinates::default()).await;
        if done {
            *self.position.lock() = None;
        }
        done
    }

    async fn send(&self, ctx: &PageContext, cue: CursorCue, at: Coordinates) -> bool {
        let config = ctx.config();
        if !config.cursor_enabled {
            return false;
        }
        let args = vec![
            json!(cue.as_str()),
            json!(at.x),
            json!(at.y),
            json!(config.cursor_move_ms),
        ];
        match ctx.run_raw(&scripts::CURSOR, args).await {
            Ok(_) => true,
            Err(e) => {
                debug!(cue = cue.as_str(), error = %e, "Cursor cue failed");
                false
            }
        }
    }
}
