//! Coordinate and visibility resolution.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use pagehands_protocols::{Coordinates, EngineError, Rect, ScrollOutcome};

use crate::context::PageContext;
use crate::registry::ResolvedElement;
use crate::scripts;

/// Where to aim at an element right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub coordinates: Coordinates,
    pub rect: Rect,
    pub scroll: ScrollOutcome,
    /// The element could not be scrolled into view; `rect` predates the
    /// attempt and may no longer match the layout.
    pub stale: bool,
    /// Measure passes taken.
    pub passes: u32,
}

#[derive(Debug, Deserialize)]
struct ScrollReply {
    outcome: ScrollOutcome,
    rect: Option<Rect>,
}

#[derive(Debug, Deserialize)]
struct MeasureReply {
    rect: Option<Rect>,
}

/// Scrolls elements into view and measures their center.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateResolver;

impl CoordinateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Bring `element` into view and return its current center.
    ///
    /// In accurate mode the box is re-measured after each settle interval
    /// until two consecutive measurements agree, bounded by
    /// `stability_passes`.
    pub async fn resolve(
        &self,
        ctx: &PageContext,
        element: &ResolvedElement,
        accurate: bool,
    ) -> Result<ResolvedPoint, EngineError> {
        let config = ctx.config();
        let scroll: ScrollReply = ctx
            .run(&scripts::SCROLL_INTO_VIEW, vec![json!(element.stable_id)])
            .await?;
        debug!(handle = %element.handle, outcome = ?scroll.outcome, "Scrolled into view");

        if scroll.outcome == ScrollOutcome::Failed {
            return match scroll.rect {
                Some(rect) => Ok(ResolvedPoint {
                    coordinates: rect.center(),
                    rect,
                    scroll: scroll.outcome,
                    stale: true,
                    passes: 0,
                }),
                None => Err(EngineError::not_found(
                    element.handle,
                    "element has no layout box",
                )),
            };
        }

        tokio::time::sleep(config.scroll_settle()).await;

        let mut rect = self.measure(ctx, element).await?;
        let mut passes = 1;
        if accurate {
            while passes < config.stability_passes {
                tokio::time::sleep(config.scroll_settle()).await;
                let next = self.measure(ctx, element).await?;
                passes += 1;
                let stable = next.approx_eq(&rect, config.stability_tolerance_px);
                rect = next;
                if stable {
                    break;
                }
            }
            debug!(handle = %element.handle, passes, "Layout measured");
        }

        Ok(ResolvedPoint {
            coordinates: rect.center(),
            rect,
            scroll: scroll.outcome,
            stale: false,
            passes,
        })
    }

    async fn measure(&self, ctx: &PageContext, element: &ResolvedElement) -> Result<Rect, EngineError> {
        let reply: MeasureReply = ctx
            .run(&scripts::MEASURE, vec![json!(element.stable_id)])
            .await?;
        reply
            .rect
            .ok_or_else(|| EngineError::not_found(element.handle, "node was detached"))
    }
}
