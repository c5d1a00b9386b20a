//! Real server reconciler
//!
//! Real servers are scoped under a virtual service and addressed with the
//! (parent, child) pair; reads and writes after creation use the `!` exact
//! index sigil. The appliance answers every operation with the filtered
//! server collection, of which the last entry is authoritative.

use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{ApplianceClient, RealServerEntry, RealServerParameters};
use core_retry::{CancellationToken, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::address::ScopedId;
use crate::attr::Attr;
use crate::classify::classify_client_error;
use crate::drift::REAL_SERVER_ABSENT;
use crate::error::{Op, ReconcileError, Result};
use crate::reconciler::{Outcome, Reconcile};

const KIND: &str = "real_server";

/// Caller-declared real server attributes
#[derive(Debug, Clone, Deserialize)]
pub struct RealServerDesired {
    pub virtual_service_id: i32,
    pub address: String,
    pub port: i32,
    #[serde(default)]
    pub weight: Attr<i32>,
    #[serde(default)]
    pub forward: Attr<String>,
    #[serde(default)]
    pub enable: Attr<bool>,
    #[serde(default)]
    pub limit: Attr<i32>,
    #[serde(default)]
    pub critical: Attr<bool>,
    #[serde(default)]
    pub follow: Attr<i32>,
}

/// Last-synchronized view of a real server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealServerState {
    pub id: i32,
    pub virtual_service_id: i32,
    pub address: String,
    pub port: i32,
    pub weight: i32,
    pub forward: String,
    pub enable: bool,
    pub limit: i32,
    pub critical: bool,
    pub follow: i32,
    pub dns_name: String,
}

impl RealServerState {
    fn scoped_id(&self) -> ScopedId {
        ScopedId::new(self.virtual_service_id, self.id)
    }
}

pub struct RealServerReconciler {
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
}

impl RealServerReconciler {
    pub fn new(client: Arc<dyn ApplianceClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn map_state(entry: RealServerEntry) -> RealServerState {
        RealServerState {
            id: entry.rs_index,
            virtual_service_id: entry.vs_index,
            address: entry.addr,
            port: entry.port,
            weight: entry.weight,
            forward: entry.forward,
            enable: entry.enable.unwrap_or(false),
            limit: entry.limit,
            critical: entry.critical.unwrap_or(false),
            follow: entry.follow,
            dns_name: entry.dns_name,
        }
    }

    fn params_from(desired: &RealServerDesired) -> RealServerParameters {
        RealServerParameters {
            weight: desired.weight.copied(),
            forward: desired.forward.cloned(),
            enable: desired.enable.copied(),
            limit: desired.limit.copied(),
            critical: desired.critical.copied(),
            follow: desired.follow.copied(),
        }
    }
}

#[async_trait]
impl Reconcile for RealServerReconciler {
    type Desired = RealServerDesired;
    type State = RealServerState;

    fn kind(&self) -> &'static str {
        KIND
    }

    #[instrument(skip_all, fields(virtual_service_id = desired.virtual_service_id, address = %desired.address))]
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        debug!("creating real server");
        let parent = desired.virtual_service_id.to_string();
        let port = desired.port.to_string();
        let params = Self::params_from(&desired);

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client
                    .add_real_server(&parent, &desired.address, &port, params.clone())
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Create, KIND, &desired.address, e))?;

        let entry = response
            .rs
            .into_iter()
            .last()
            .ok_or_else(|| ReconcileError::MissingEntity {
                kind: KIND,
                id: desired.address.clone(),
            })?;

        Ok(Self::map_state(entry))
    }

    #[instrument(skip_all, fields(id = %state.scoped_id()))]
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>> {
        let scoped = state.scoped_id();
        let parent = scoped.parent_query();
        let child = scoped.child_query(true);

        let result = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_real_server(&parent, &child)
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if REAL_SERVER_ABSENT.matches_retry(&e) => {
                debug!(id = %scoped, "real server vanished remotely");
                return Ok(Outcome::Absent);
            }
            Err(e) => {
                return Err(ReconcileError::operation(Op::Read, KIND, scoped.to_string(), e))
            }
        };

        let entry = response
            .rs
            .into_iter()
            .last()
            .ok_or_else(|| ReconcileError::MissingEntity {
                kind: KIND,
                id: scoped.to_string(),
            })?;

        Ok(Outcome::Present(Self::map_state(entry)))
    }

    #[instrument(skip_all, fields(id = %state.scoped_id()))]
    async fn update(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        let scoped = state.scoped_id();
        let parent = scoped.parent_query();
        let child = scoped.child_query(true);
        let params = Self::params_from(&desired);

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.modify_real_server(&parent, &child, params.clone())
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Update, KIND, scoped.to_string(), e))?;

        let entry = response
            .rs
            .into_iter()
            .last()
            .ok_or_else(|| ReconcileError::MissingEntity {
                kind: KIND,
                id: scoped.to_string(),
            })?;

        Ok(Self::map_state(entry))
    }

    #[instrument(skip_all, fields(id = %state.scoped_id()))]
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()> {
        let scoped = state.scoped_id();
        let parent = scoped.parent_query();
        let child = scoped.child_query(true);

        self.retry
            .run(cancel, classify_client_error, || {
                self.client.delete_real_server(&parent, &child)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Delete, KIND, scoped.to_string(), e))?;

        Ok(())
    }

    #[instrument(skip_all, fields(id = id))]
    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Self::State> {
        let scoped = ScopedId::parse(id)?;
        let parent = scoped.parent_query();
        let child = scoped.child_query(true);

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_real_server(&parent, &child)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Import, KIND, id, e))?;

        let entry = response
            .rs
            .into_iter()
            .last()
            .ok_or_else(|| ReconcileError::MissingEntity {
                kind: KIND,
                id: id.to_string(),
            })?;

        Ok(Self::map_state(entry))
    }
}
