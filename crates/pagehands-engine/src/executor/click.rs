//! Click: pointer dispatch at resolved coordinates, then framework-aware
//! backup methods.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use pagehands_protocols::{
    ActionFailure, AttemptOutcome, ClickDiagnostics, ClickMethod, ElementHandle, EngineError,
    FailedStep,
};

use super::{ActionExecutor, StrategyFailure};
use crate::context::PageContext;
use crate::registry::ResolvedElement;
use crate::scripts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum Hit {
    Target,
    Descendant,
    Other,
    None,
}

#[derive(Debug, Deserialize)]
pub(super) struct PointerReply {
    pub hit: Hit,
    #[serde(default)]
    pub dispatched: bool,
    #[serde(default)]
    pub blocker: Option<String>,
}

impl PointerReply {
    pub fn landed(&self) -> bool {
        matches!(self.hit, Hit::Target | Hit::Descendant) && self.dispatched
    }
}

#[derive(Debug, Deserialize)]
struct BackupReply {
    ok: bool,
    #[serde(default)]
    applicable: bool,
    #[serde(default)]
    error: Option<String>,
}

impl ActionExecutor {
    /// Click the element behind `handle`.
    ///
    /// Steps:
    /// 1. Look the handle up in the registry
    /// 2. Scroll, measure and move the cursor there
    /// 3. Dispatch the pointer sequence after hit-testing the point
    /// 4. On any failure, re-resolve by stable id and try the backup methods
    /// 5. Settle and recenter the cursor
    pub async fn click(
        &self,
        ctx: &PageContext,
        handle: ElementHandle,
    ) -> Result<ClickDiagnostics, ActionFailure> {
        let mut diag = ClickDiagnostics::default();
        info!(handle = %handle, "Executing click");

        let element = match self.registry.resolve(ctx, handle).await {
            Ok(element) => element,
            Err(e) => {
                diag.fail_at(FailedStep::Lookup, &e);
                return Err(ActionFailure::new(e, diag));
            }
        };

        match self.primary_click(ctx, &element, &mut diag).await {
            Ok(()) => {
                diag.succeeded_with = Some(ClickMethod::Pointer);
            }
            Err(failure) => {
                warn!(handle = %handle, error = %failure, "Pointer click failed, trying backup methods");
                diag.last_error = Some(failure.to_string());
                diag.used_backup = true;
                if let Err(e) = self.backup_click(ctx, handle, &mut diag).await {
                    return Err(ActionFailure::new(e, diag));
                }
            }
        }

        tokio::time::sleep(ctx.config().click_settle()).await;
        self.cursor.recenter(ctx).await;

        info!(
            handle = %handle,
            method = ?diag.succeeded_with,
            used_backup = diag.used_backup,
            "Click completed"
        );
        Ok(diag)
    }

    async fn primary_click(
        &self,
        ctx: &PageContext,
        element: &ResolvedElement,
        diag: &mut ClickDiagnostics,
    ) -> Result<(), StrategyFailure> {
        let point = match self.resolver.resolve(ctx, element, true).await {
            Ok(point) => point,
            Err(e) => {
                diag.failed_step = Some(FailedStep::Coordinates);
                return Err(e.into());
            }
        };
        diag.scroll = Some(point.scroll);
        diag.coordinates = Some(point.coordinates);
        diag.stale_coordinates = point.stale;
        if point.stale {
            debug!(handle = %element.handle, "Using coordinates from before a failed scroll");
        }

        diag.cursor_moved = self.cursor.move_to(ctx, point.coordinates).await;
        self.cursor.click_cue(ctx).await;

        let reply: PointerReply = match ctx
            .run(
                &scripts::POINTER_CLICK,
                vec![
                    json!(element.stable_id),
                    json!(point.coordinates.x),
                    json!(point.coordinates.y),
                ],
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                diag.record(ClickMethod::Pointer, AttemptOutcome::Failed, Some(e.to_string()));
                diag.failed_step = Some(FailedStep::PointerDispatch);
                return Err(e.into());
            }
        };

        if reply.landed() {
            diag.record(ClickMethod::Pointer, AttemptOutcome::Succeeded, None);
            diag.failed_step = None;
            return Ok(());
        }

        let detail = match (reply.hit, reply.blocker) {
            (Hit::Other, Some(blocker)) => format!("target obscured by <{}>", blocker),
            (Hit::Other, None) => "target obscured".to_string(),
            (Hit::None, _) => "nothing at the resolved point".to_string(),
            _ => "pointer events were not dispatched".to_string(),
        };
        diag.record(ClickMethod::Pointer, AttemptOutcome::Failed, Some(detail.clone()));
        diag.failed_step = Some(FailedStep::PointerDispatch);
        Err(StrategyFailure::Rejected(detail))
    }

    /// Try each backup method in order until one succeeds.
    async fn backup_click(
        &self,
        ctx: &PageContext,
        handle: ElementHandle,
        diag: &mut ClickDiagnostics,
    ) -> Result<(), EngineError> {
        let element = match self.registry.resolve(ctx, handle).await {
            Ok(element) => element,
            Err(e) => {
                diag.fail_at(FailedStep::BackupLookup, &e);
                return Err(e);
            }
        };

        for method in ClickMethod::BACKUP_ORDER {
            match self.try_backup(ctx, &element, method).await {
                Ok(()) => {
                    diag.record(method, AttemptOutcome::Succeeded, None);
                    diag.succeeded_with = Some(method);
                    diag.failed_step = None;
                    return Ok(());
                }
                Err(StrategyFailure::NotApplicable) => {
                    diag.record(method, AttemptOutcome::Skipped, None);
                }
                Err(e) => {
                    debug!(method = method.as_str(), error = %e, "Backup click method failed");
                    diag.record(method, AttemptOutcome::Failed, Some(e.to_string()));
                }
            }
        }

        let last = diag
            .last_error
            .clone()
            .unwrap_or_else(|| "no click method applied".to_string());
        diag.fail_at(FailedStep::BackupClick, &last);
        Err(EngineError::TerminalFailure(format!(
            "click on element {} failed: {}",
            handle, last
        )))
    }

    async fn try_backup(
        &self,
        ctx: &PageContext,
        element: &ResolvedElement,
        method: ClickMethod,
    ) -> Result<(), StrategyFailure> {
        let reply: BackupReply = ctx
            .run(
                &scripts::BACKUP_CLICK,
                vec![json!(element.stable_id), json!(method.as_str())],
            )
            .await?;
        if reply.ok {
            Ok(())
        } else if !reply.applicable {
            Err(StrategyFailure::NotApplicable)
        } else {
            Err(StrategyFailure::Rejected(
                reply.error.unwrap_or_else(|| "method reported failure".to_string()),
            ))
        }
    }
}
