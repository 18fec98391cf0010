//! The engine facade the planner talks to.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pagehands_config::EngineConfig;
use pagehands_protocols::{
    Action, ActionDiagnostics, ActionFailure, ActionId, ActionResult, ElementHandle, EngineError,
    PageHost, Snapshot, TabId,
};

use crate::context::PageContext;
use crate::cursor::CursorSimulator;
use crate::executor::{ActionExecutor, validate_url};
use crate::registry::ElementRegistry;
use crate::snapshot::{SNAPSHOT_UNAVAILABLE, SnapshotExtractor};
use crate::state::{ActionGuard, ActionStateManager};

/// One engine drives one tab.
///
/// Snapshots may be taken at any time. Actions are registered with the
/// [`ActionStateManager`] and run one at a time; concurrent callers queue.
pub struct PageEngine {
    host: Arc<dyn PageHost>,
    config: Arc<EngineConfig>,
    tab: OnceCell<TabId>,
    registry: Arc<ElementRegistry>,
    executor: ActionExecutor,
    extractor: SnapshotExtractor,
    state: Arc<ActionStateManager>,
    cancel: CancellationToken,
}

impl PageEngine {
    pub fn new(host: Arc<dyn PageHost>, config: EngineConfig) -> Self {
        let registry = Arc::new(ElementRegistry::new());
        let cursor = Arc::new(CursorSimulator::new());
        let state = Arc::new(ActionStateManager::new(config.history_limit));
        Self {
            host,
            config: Arc::new(config),
            tab: OnceCell::new(),
            executor: ActionExecutor::new(registry.clone(), cursor),
            registry,
            extractor: SnapshotExtractor::new(),
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Bind the engine to `tab`. Can be done exactly once.
    pub fn bind_tab(&self, tab: TabId) -> Result<(), EngineError> {
        self.tab.set(tab).map_err(|_| {
            EngineError::TabAlreadyBound(self.tab.get().copied().unwrap_or(tab))
        })?;
        info!(%tab, "Engine bound to tab");
        Ok(())
    }

    pub fn tab(&self) -> Option<TabId> {
        self.tab.get().copied()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    pub fn state(&self) -> &Arc<ActionStateManager> {
        &self.state
    }

    /// Token observed by in-flight typing.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel in-flight typing. Subsequent set_value calls fail immediately.
    pub fn stop(&self) {
        info!("Engine stop requested");
        self.cancel.cancel();
    }

    fn context(&self) -> Result<PageContext, EngineError> {
        let tab = self.tab().ok_or(EngineError::TabNotBound)?;
        Ok(PageContext::new(self.host.clone(), tab, self.config.clone()))
    }

    /// Take a fresh snapshot, replacing every previously issued handle.
    pub async fn snapshot(&self) -> Result<Snapshot, EngineError> {
        let ctx = self.context()?;
        self.extractor.extract(&ctx, &self.registry).await
    }

    /// Take a fresh snapshot and render it for the planner.
    ///
    /// Never fails; any error yields [`SNAPSHOT_UNAVAILABLE`].
    pub async fn extract_snapshot(&self) -> String {
        match self.context() {
            Ok(ctx) => self.extractor.extract_text(&ctx, &self.registry).await,
            Err(e) => {
                warn!(error = %e, "Snapshot requested without a bound tab");
                SNAPSHOT_UNAVAILABLE.to_string()
            }
        }
    }

    pub async fn click(&self, handle: ElementHandle) -> ActionResult {
        self.execute(Action::Click { handle }).await
    }

    pub async fn set_value(&self, handle: ElementHandle, text: impl Into<String>) -> ActionResult {
        self.execute(Action::SetValue {
            handle,
            text: text.into(),
        })
        .await
    }

    pub async fn navigate(&self, url: impl Into<String>) -> ActionResult {
        self.execute(Action::Navigate { url: url.into() }).await
    }

    pub async fn wait(&self, seconds: f64) -> ActionResult {
        self.execute(Action::Wait { seconds }).await
    }

    /// Parse a planner request and run it.
    ///
    /// Malformed requests are rejected without creating a record.
    pub async fn run_action(&self, action_type: &str, payload: Value) -> ActionResult {
        match Action::from_request(action_type, payload) {
            Ok(action) => self.execute(action).await,
            Err(e) => {
                warn!(action = action_type, error = %e, "Rejected action request");
                ActionResult::failure(ActionId::new(), 0, e.into())
            }
        }
    }

    /// Validate, register and run `action`, returning its structured result.
    pub async fn execute(&self, action: Action) -> ActionResult {
        let id = ActionId::new();
        let action_type = action.action_type();
        let handle = action.handle();

        let validated = match &action {
            Action::Navigate { url } => action.validate().and_then(|_| validate_url(url).map(drop)),
            _ => action.validate(),
        };
        if let Err(e) = validated {
            warn!(action_id = %id, action = %action_type, error = %e, "Action failed validation");
            return ActionResult::failure(id, 0, e.into());
        }
        let ctx = match &action {
            Action::Wait { .. } => None,
            _ => match self.context() {
                Ok(ctx) => Some(ctx),
                Err(e) => return ActionResult::failure(id, 0, e.into()),
            },
        };

        if let Err(e) = self.state.start(id, action_type) {
            return ActionResult::failure(id, 0, e.into());
        }
        let guard = ActionGuard::new(self.state.clone(), id);
        if let Err(e) = self.state.mark_in_progress(id).await {
            return ActionResult::failure(id, 0, e.into());
        }

        let started = Instant::now();
        info!(action_id = %id, action = %action_type, handle = ?handle, "Action started");

        let outcome = self.dispatch(ctx.as_ref(), action).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(diagnostics) => {
                if let Err(e) = guard.complete() {
                    warn!(action_id = %id, error = %e, "Could not mark action completed");
                }
                info!(action_id = %id, action = %action_type, handle = ?handle, duration_ms, "Action completed");
                ActionResult::success(id, duration_ms, diagnostics)
            }
            Err(failure) => {
                if let Err(e) = guard.fail(failure.error.to_string()) {
                    warn!(action_id = %id, error = %e, "Could not mark action failed");
                }
                warn!(
                    action_id = %id,
                    action = %action_type,
                    handle = ?handle,
                    duration_ms,
                    error = %failure.error,
                    failed_step = ?failure.diagnostics.failed_step(),
                    "Action failed"
                );
                ActionResult::failure(id, duration_ms, failure)
            }
        }
    }

    async fn dispatch(
        &self,
        ctx: Option<&PageContext>,
        action: Action,
    ) -> Result<ActionDiagnostics, ActionFailure> {
        let executor = &self.executor;
        match (action, ctx) {
            (Action::Wait { seconds }, _) => {
                executor.wait(&self.config, seconds).await.map(Into::into)
            }
            (Action::Click { handle }, Some(ctx)) => {
                executor.click(ctx, handle).await.map(Into::into)
            }
            (Action::SetValue { handle, text }, Some(ctx)) => executor
                .set_value(ctx, handle, &text, &self.cancel)
                .await
                .map(Into::into),
            (Action::Navigate { url }, Some(ctx)) => {
                executor.navigate(ctx, &url).await.map(Into::into)
            }
            (_, None) => Err(EngineError::TabNotBound.into()),
        }
    }

    /// Resolves once no action is pending or in progress.
    pub async fn wait_for_all_actions(&self) {
        self.state.wait_for_all_actions().await
    }
}
