//! [`PageHost`] backed by a CDP connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};

use pagehands_protocols::{HostError, PageHost, PageScript, TabId};

use crate::cdp::{CdpClient, CdpError, PageSession, TargetInfo};

/// Runs page scripts in attached Chrome tabs.
pub struct CdpHost {
    client: Arc<CdpClient>,
    sessions: DashMap<TabId, Arc<PageSession>>,
    next_tab: AtomicU64,
}

impl CdpHost {
    pub fn new(client: Arc<CdpClient>) -> Self {
        Self {
            client,
            sessions: DashMap::new(),
            next_tab: AtomicU64::new(1),
        }
    }

    /// Connect to the browser at `endpoint`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        Ok(Self::new(Arc::new(CdpClient::connect(endpoint).await?)))
    }

    pub fn client(&self) -> &Arc<CdpClient> {
        &self.client
    }

    /// Attach to `target_id` and return the tab id to bind an engine to.
    pub async fn attach(&self, target_id: &str) -> Result<TabId, CdpError> {
        let session = self.client.attach_page(target_id).await?;
        let tab = TabId(self.next_tab.fetch_add(1, Ordering::SeqCst));
        self.sessions.insert(tab, Arc::new(session));
        info!(%tab, target_id, "Attached tab");
        Ok(tab)
    }

    /// Attach to the first page whose URL contains `url_contains`, or the
    /// first page at all when no filter is given.
    pub async fn attach_first_page(&self, url_contains: Option<&str>) -> Result<TabId, CdpError> {
        let targets = self.client.get_targets().await?;
        let target = pick_page(&targets, url_contains).ok_or_else(|| {
            CdpError::PageNotFound(url_contains.unwrap_or("any page").to_string())
        })?;
        self.attach(&target.target_id).await
    }

    /// Drop the session for `tab`.
    pub fn detach(&self, tab: TabId) -> bool {
        self.sessions.remove(&tab).is_some()
    }

    fn session(&self, tab: TabId) -> Result<Arc<PageSession>, HostError> {
        self.sessions
            .get(&tab)
            .map(|s| s.value().clone())
            .ok_or(HostError::TabNotFound(tab))
    }
}

pub(crate) fn pick_page<'a>(
    targets: &'a [TargetInfo],
    url_contains: Option<&str>,
) -> Option<&'a TargetInfo> {
    targets
        .iter()
        .filter(|t| t.is_page())
        .find(|t| url_contains.is_none_or(|needle| t.url.contains(needle)))
}

#[async_trait]
impl PageHost for CdpHost {
    async fn run_script(
        &self,
        tab: TabId,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value, HostError> {
        let session = self.session(tab)?;
        let expression = script.to_expression(&args)?;
        debug!(%tab, script = script.name, "Running page script");
        Ok(session.evaluate(&expression).await?)
    }

    async fn set_url(&self, tab: TabId, url: &str) -> Result<(), HostError> {
        let session = self.session(tab)?;
        info!(%tab, url, "Navigating");
        Ok(session.navigate(url).await?)
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
