//! Set value: per-character typing through the target's editing surface,
//! with a single bulk assignment as fallback.

use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pagehands_protocols::{
    ActionFailure, AttemptOutcome, ElementHandle, EngineError, FailedStep, SetValueDiagnostics,
    TypingStrategy,
};

use super::click::PointerReply;
use super::editing::{EditTarget, EditingSurface, Fingerprint};
use super::typing::{EditOp, TypingPlan};
use super::{ActionExecutor, StrategyFailure};
use crate::context::PageContext;
use crate::registry::ResolvedElement;
use crate::scripts;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FocusReply {
    found: bool,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    fingerprint: Option<Fingerprint>,
}

#[derive(Debug, Deserialize)]
struct BulkReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Why the per-character pass stopped.
enum TypingError {
    Cancelled { completed: usize, total: usize },
    Strategy(StrategyFailure),
}

impl ActionExecutor {
    /// Replace the content of the element behind `handle` with `text`.
    ///
    /// `cancel` is checked before every edit step; once it fires the action
    /// fails with [`EngineError::Cancelled`] and no fallback runs.
    pub async fn set_value(
        &self,
        ctx: &PageContext,
        handle: ElementHandle,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<SetValueDiagnostics, ActionFailure> {
        let plan = TypingPlan::parse(text);
        let mut diag = SetValueDiagnostics {
            steps_total: plan.len(),
            ..SetValueDiagnostics::default()
        };
        info!(handle = %handle, steps = plan.len(), "Executing set_value");

        if cancel.is_cancelled() {
            let e = EngineError::Cancelled {
                completed: 0,
                total: plan.len(),
            };
            diag.fail_at(FailedStep::Typing, &e);
            return Err(ActionFailure::new(e, diag));
        }

        let element = match self.registry.resolve(ctx, handle).await {
            Ok(element) => element,
            Err(e) => {
                diag.fail_at(FailedStep::Lookup, &e);
                return Err(ActionFailure::new(e, diag));
            }
        };

        self.focus_click(ctx, &element, &mut diag).await;

        let probe = match self.probe_focus(ctx, &element).await {
            Ok(probe) => Some(probe),
            Err(e @ EngineError::NotFound { .. }) => {
                diag.fail_at(FailedStep::Focus, &e);
                return Err(ActionFailure::new(e, diag));
            }
            Err(e) => {
                warn!(handle = %handle, error = %e, "Focus probe failed, going straight to bulk assignment");
                diag.record("focus_probe", AttemptOutcome::Failed, Some(e.to_string()));
                None
            }
        };

        let mut bulk_target = element.stable_id.clone();
        if let Some(probe) = probe {
            diag.focused = probe.focused;
            let target_id = probe.target_id.unwrap_or_else(|| element.stable_id.clone());
            let fingerprint = probe.fingerprint.unwrap_or_default();

            if fingerprint.disabled || fingerprint.read_only {
                let e = EngineError::TerminalFailure(format!(
                    "element {} is read-only or disabled",
                    handle
                ));
                diag.fail_at(FailedStep::Focus, &e);
                return Err(ActionFailure::new(e, diag));
            }

            let target = EditTarget::classify(&fingerprint);
            diag.target = Some(target.kind());
            diag.editor_flavor = target.flavor().map(|f| f.as_str().to_string());
            debug!(handle = %handle, target = ?target, "Classified edit target");

            let surface = target.surface(&target_id);
            self.cursor.typing_cue(ctx).await;
            match self.type_plan(ctx, surface.as_ref(), &plan, cancel, &mut diag).await {
                Ok(()) => {
                    diag.record(surface.name(), AttemptOutcome::Succeeded, None);
                    diag.strategy = Some(TypingStrategy::PerCharacter);
                    info!(handle = %handle, strategy = surface.name(), "Set value completed");
                    return Ok(diag);
                }
                Err(TypingError::Cancelled { completed, total }) => {
                    let e = EngineError::Cancelled { completed, total };
                    diag.fail_at(FailedStep::Typing, &e);
                    info!(handle = %handle, completed, total, "Set value cancelled");
                    return Err(ActionFailure::new(e, diag));
                }
                Err(TypingError::Strategy(failure)) => {
                    warn!(
                        handle = %handle,
                        strategy = surface.name(),
                        error = %failure,
                        "Per-character typing failed, falling back to bulk assignment"
                    );
                    diag.record(surface.name(), AttemptOutcome::Failed, Some(failure.to_string()));
                }
            }
            bulk_target = target_id;
        }

        match self.bulk_assign(ctx, &bulk_target, &plan.final_text()).await {
            Ok(()) => {
                diag.record("bulk_assign", AttemptOutcome::Succeeded, None);
                diag.strategy = Some(TypingStrategy::Bulk);
                diag.failed_step = None;
                info!(handle = %handle, "Set value completed with bulk assignment");
                Ok(diag)
            }
            Err(failure) => {
                diag.record("bulk_assign", AttemptOutcome::Failed, Some(failure.to_string()));
                let e = EngineError::TerminalFailure(format!(
                    "set_value on element {} failed: {}",
                    handle, failure
                ));
                diag.fail_at(FailedStep::BulkFallback, failure.to_string());
                Err(ActionFailure::new(e, diag))
            }
        }
    }

    /// Scroll to the element, move the cursor there and click to focus.
    /// Every failure here is logged and ignored.
    async fn focus_click(
        &self,
        ctx: &PageContext,
        element: &ResolvedElement,
        diag: &mut SetValueDiagnostics,
    ) {
        let point = match self.resolver.resolve(ctx, element, false).await {
            Ok(point) => point,
            Err(e) => {
                debug!(handle = %element.handle, error = %e, "No coordinates for focus click");
                return;
            }
        };
        diag.scroll = Some(point.scroll);
        diag.coordinates = Some(point.coordinates);
        diag.stale_coordinates = point.stale;
        diag.cursor_moved = self.cursor.move_to(ctx, point.coordinates).await;

        let reply: Result<PointerReply, _> = ctx
            .run(
                &scripts::POINTER_CLICK,
                vec![
                    json!(element.stable_id),
                    json!(point.coordinates.x),
                    json!(point.coordinates.y),
                ],
            )
            .await;
        match reply {
            Ok(reply) => diag.focus_click = reply.landed(),
            Err(e) => debug!(handle = %element.handle, error = %e, "Focus click failed"),
        }
    }

    async fn probe_focus(
        &self,
        ctx: &PageContext,
        element: &ResolvedElement,
    ) -> Result<FocusReply, EngineError> {
        let reply: FocusReply = ctx
            .run(&scripts::FOCUS_PROBE, vec![json!(element.stable_id)])
            .await?;
        if !reply.found {
            return Err(EngineError::not_found(element.handle, "node was detached"));
        }
        Ok(reply)
    }

    async fn type_plan(
        &self,
        ctx: &PageContext,
        surface: &dyn EditingSurface,
        plan: &TypingPlan,
        cancel: &CancellationToken,
        diag: &mut SetValueDiagnostics,
    ) -> Result<(), TypingError> {
        let delay = ctx.config().typing_delay();
        let total = plan.len();

        for (i, op) in plan.ops().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(TypingError::Cancelled { completed: i, total });
            }

            let step = match op {
                EditOp::Clear => surface.clear(ctx).await,
                EditOp::Char(c) => surface.insert_char(ctx, *c).await,
                EditOp::Newline => surface.insert_newline(ctx).await,
                EditOp::SoftBreak => surface.insert_soft_break(ctx).await,
            };
            step.map_err(TypingError::Strategy)?;
            diag.steps_completed = i + 1;

            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(TypingError::Cancelled { completed: i + 1, total });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        surface.finish(ctx).await.map_err(TypingError::Strategy)
    }

    async fn bulk_assign(
        &self,
        ctx: &PageContext,
        target_id: &str,
        text: &str,
    ) -> Result<(), StrategyFailure> {
        let reply: BulkReply = ctx
            .run(&scripts::BULK_ASSIGN, vec![json!(target_id), json!(text)])
            .await?;
        if reply.ok {
            Ok(())
        } else {
            Err(StrategyFailure::Rejected(
                reply.error.unwrap_or_else(|| "bulk assignment rejected".to_string()),
            ))
        }
    }
}
