//! The generic CRUD reconciler surface and its type-erased registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{ApplianceClient, RuleKind};
use core_retry::{CancellationToken, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::resources::blob::{BlobFamily, ContentBlobReconciler};
use crate::resources::real_server::RealServerReconciler;
use crate::resources::rewrite_rule::RewriteRuleReconciler;
use crate::resources::sub_virtual_service::SubVirtualServiceReconciler;
use crate::resources::virtual_service::VirtualServiceReconciler;
use crate::resources::waf_attachment::WafAttachmentReconciler;

/// Result of a Read: the remote entity, or its observed absence.
///
/// Absence is not an error; the orchestrator reacts by dropping the
/// recorded state and re-creating on the next pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Present(T),
    Absent,
}

impl<T> Outcome<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent)
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Outcome::Present(state) => Some(state),
            Outcome::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Present(state) => Outcome::Present(f(state)),
            Outcome::Absent => Outcome::Absent,
        }
    }
}

/// One resource kind's reconciler.
///
/// Logical per-instance state machine: Absent → Present → Tombstoned,
/// with Present → Absent possible via drift observed on `read`.
///
/// Recorded state is always replaced wholesale by the returned value;
/// implementations never merge into prior state. Every remote call runs
/// under the shared retry policy, and the cancellation token aborts
/// further retries between attempts.
#[async_trait]
pub trait Reconcile: Send + Sync {
    type Desired: DeserializeOwned + Send + 'static;
    type State: Serialize + DeserializeOwned + Send + 'static;

    /// Stable resource-kind name; also the registry key
    fn kind(&self) -> &'static str;

    /// Create the remote entity and map the response into recorded state,
    /// including server-assigned identifiers and server-filled defaults
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State>;

    /// Fetch the remote entity; a table-matched not-found heals into
    /// [`Outcome::Absent`] with no error
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>>;

    /// Modify the remote entity in place. Replace-only kinds fail with
    /// [`ReconcileError::UnsupportedUpdate`](crate::ReconcileError::UnsupportedUpdate)
    async fn update(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
        desired: Self::Desired,
    ) -> Result<Self::State>;

    /// Destroy the remote entity. Failures always surface, including
    /// not-found: silently ignoring a failed delete could orphan remote
    /// state
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()>;

    /// Read using an externally supplied identifier to seed an initial
    /// recorded state
    async fn import_state(
        &self,
        cancel: &CancellationToken,
        id: &str,
    ) -> Result<Self::State>;
}

/// Object-safe reconciler moving attribute sets as JSON values.
///
/// Blanket-implemented for every [`Reconcile`]; the orchestrator only ever
/// sees this surface, keyed by resource-kind name.
#[async_trait]
pub trait ErasedReconcile: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn create(&self, cancel: &CancellationToken, desired: Value) -> Result<Value>;

    async fn read(&self, cancel: &CancellationToken, state: Value) -> Result<Outcome<Value>>;

    async fn update(
        &self,
        cancel: &CancellationToken,
        state: Value,
        desired: Value,
    ) -> Result<Value>;

    async fn delete(&self, cancel: &CancellationToken, state: Value) -> Result<()>;

    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Value>;
}

#[async_trait]
impl<R: Reconcile> ErasedReconcile for R {
    fn kind(&self) -> &'static str {
        Reconcile::kind(self)
    }

    async fn create(&self, cancel: &CancellationToken, desired: Value) -> Result<Value> {
        let desired = serde_json::from_value(desired)?;
        let state = Reconcile::create(self, cancel, desired).await?;
        Ok(serde_json::to_value(state)?)
    }

    async fn read(&self, cancel: &CancellationToken, state: Value) -> Result<Outcome<Value>> {
        let state = serde_json::from_value(state)?;
        match Reconcile::read(self, cancel, state).await? {
            Outcome::Present(state) => Ok(Outcome::Present(serde_json::to_value(state)?)),
            Outcome::Absent => Ok(Outcome::Absent),
        }
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        state: Value,
        desired: Value,
    ) -> Result<Value> {
        let state = serde_json::from_value(state)?;
        let desired = serde_json::from_value(desired)?;
        let state = Reconcile::update(self, cancel, state, desired).await?;
        Ok(serde_json::to_value(state)?)
    }

    async fn delete(&self, cancel: &CancellationToken, state: Value) -> Result<()> {
        let state = serde_json::from_value(state)?;
        Reconcile::delete(self, cancel, state).await
    }

    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Value> {
        let state = Reconcile::import_state(self, cancel, id).await?;
        Ok(serde_json::to_value(state)?)
    }
}

/// Registry mapping resource-kind name to its reconciler instance
#[derive(Default)]
pub struct ReconcilerRegistry {
    reconcilers: HashMap<&'static str, Arc<dyn ErasedReconcile>>,
}

impl ReconcilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, reconciler: Arc<dyn ErasedReconcile>) {
        self.reconcilers.insert(reconciler.kind(), reconciler);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ErasedReconcile>> {
        self.reconcilers.get(kind).cloned()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.reconcilers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

/// Build the full resource catalog against one injected client handle.
///
/// Every reconciler shares the same retry policy; backoff state itself is
/// private to each call, so instances are independent.
pub fn standard_registry(
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
) -> ReconcilerRegistry {
    let mut registry = ReconcilerRegistry::new();

    registry.register(Arc::new(VirtualServiceReconciler::new(
        client.clone(),
        retry.clone(),
    )));
    registry.register(Arc::new(SubVirtualServiceReconciler::new(
        client.clone(),
        retry.clone(),
    )));
    registry.register(Arc::new(RealServerReconciler::new(
        client.clone(),
        retry.clone(),
    )));

    for kind in RuleKind::ALL {
        registry.register(Arc::new(RewriteRuleReconciler::new(
            client.clone(),
            retry.clone(),
            kind,
        )));
    }

    registry.register(Arc::new(ContentBlobReconciler::new(
        client.clone(),
        retry.clone(),
        BlobFamily::CustomData,
    )));
    registry.register(Arc::new(ContentBlobReconciler::new(
        client.clone(),
        retry.clone(),
        BlobFamily::CustomRule,
    )));
    registry.register(Arc::new(WafAttachmentReconciler::new(client, retry)));

    registry
}
