use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deliveroo_setup::{Credentials, FlowResult, SetupStep, TokenValidator, UserStep};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

const DEFAULT_FLOW_TTL: Duration = Duration::from_secs(30 * 60);

struct FlowEntry {
    step: Arc<Mutex<UserStep>>,
    started: Instant,
}

impl FlowEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.started.elapsed() >= ttl
    }
}

/// In-progress setup flows, one independent [`UserStep`] per flow id.
///
/// Submissions to the same flow are serialised by the per-flow mutex; distinct
/// flows validate concurrently. Flows older than the TTL are swept when a new
/// flow starts and are treated as missing before that.
#[derive(Clone)]
pub struct FlowRegistry {
    validator: Arc<dyn TokenValidator>,
    flows: Arc<RwLock<HashMap<String, FlowEntry>>>,
    ttl: Duration,
}

impl FlowRegistry {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            validator,
            flows: Arc::new(RwLock::new(HashMap::new())),
            ttl: DEFAULT_FLOW_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Open a new flow and return its id with the initial form.
    pub async fn start(&self) -> (String, FlowResult) {
        let flow_id = Uuid::new_v4().to_string();
        let mut step = UserStep::new(self.validator.clone());
        let result = step.step(None).await;

        let mut flows = self.flows.write().await;
        let before = flows.len();
        flows.retain(|_, entry| !entry.is_expired(self.ttl));
        let swept = before - flows.len();
        if swept > 0 {
            debug!(swept, "expired setup flows dropped");
        }
        flows.insert(
            flow_id.clone(),
            FlowEntry {
                step: Arc::new(Mutex::new(step)),
                started: Instant::now(),
            },
        );
        drop(flows);

        info!(%flow_id, "setup flow started");
        (flow_id, result)
    }

    /// Feed a form submission to a flow. Terminal results close the flow.
    ///
    /// A flow abandoned while its submission was validating answers
    /// [`ApiError::FlowNotFound`] and the result is dropped.
    pub async fn submit(
        &self,
        flow_id: &str,
        credentials: Credentials,
    ) -> Result<FlowResult, ApiError> {
        let step = self
            .flows
            .read()
            .await
            .get(flow_id)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| entry.step.clone())
            .ok_or_else(|| ApiError::FlowNotFound(flow_id.to_string()))?;

        let result = step.lock().await.step(Some(credentials)).await;

        let mut flows = self.flows.write().await;
        let still_open = flows
            .get(flow_id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.step, &step));
        if !still_open {
            info!(%flow_id, "setup flow closed during submission, result discarded");
            return Err(ApiError::FlowNotFound(flow_id.to_string()));
        }

        if result.is_terminal() {
            flows.remove(flow_id);
            match &result {
                FlowResult::CreateEntry { title, .. } => {
                    info!(%flow_id, %title, "setup flow finished with a new entry");
                }
                FlowResult::Abort { reason } => info!(%flow_id, %reason, "setup flow aborted"),
                FlowResult::Form { .. } => {}
            }
        }
        Ok(result)
    }

    /// Drop a flow. A submission already in progress finishes but its result is discarded.
    pub async fn abandon(&self, flow_id: &str) -> Result<(), ApiError> {
        match self.flows.write().await.remove(flow_id) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                info!(%flow_id, "setup flow abandoned");
                Ok(())
            }
            _ => Err(ApiError::FlowNotFound(flow_id.to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.flows.read().await.is_empty()
    }
}
