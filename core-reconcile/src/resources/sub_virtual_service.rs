//! Sub virtual service reconciler
//!
//! Creation is a two-call sequence: the add endpoint only allocates a child
//! under the parent, so type and nickname are applied with a follow-up
//! modify against the fresh child index.

use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{ApplianceClient, SubVirtualServiceResponse, VirtualServiceParameters};
use core_retry::{CancellationToken, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::attr::Attr;
use crate::classify::classify_client_error;
use crate::drift::SUB_VIRTUAL_SERVICE_ABSENT;
use crate::error::{Op, ReconcileError, Result};
use crate::reconciler::{Outcome, Reconcile};

const KIND: &str = "sub_virtual_service";

/// Caller-declared sub virtual service attributes
#[derive(Debug, Clone, Deserialize)]
pub struct SubVirtualServiceDesired {
    pub virtual_service_id: i32,
    #[serde(default)]
    pub vs_type: Attr<String>,
    #[serde(default)]
    pub nickname: Attr<String>,
}

/// Last-synchronized view of a sub virtual service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubVirtualServiceState {
    pub id: i32,
    pub virtual_service_id: i32,
    pub vs_type: String,
    pub nickname: String,
}

pub struct SubVirtualServiceReconciler {
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
}

impl SubVirtualServiceReconciler {
    pub fn new(client: Arc<dyn ApplianceClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn map_state(response: SubVirtualServiceResponse) -> SubVirtualServiceState {
        SubVirtualServiceState {
            id: response.index,
            virtual_service_id: response.master_index,
            vs_type: response.vs_type,
            nickname: response.nickname,
        }
    }
}

#[async_trait]
impl Reconcile for SubVirtualServiceReconciler {
    type Desired = SubVirtualServiceDesired;
    type State = SubVirtualServiceState;

    fn kind(&self) -> &'static str {
        KIND
    }

    #[instrument(skip_all, fields(virtual_service_id = desired.virtual_service_id))]
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        debug!("creating sub virtual service");
        let parent = desired.virtual_service_id.to_string();

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.add_sub_virtual_service(&parent)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Create, KIND, &parent, e))?;

        // The add endpoint answers with the parent's child list; the
        // freshly allocated child sorts last.
        let child = response
            .sub_vs
            .last()
            .ok_or_else(|| ReconcileError::MissingEntity {
                kind: KIND,
                id: parent.clone(),
            })?
            .vs_index
            .to_string();

        let params = VirtualServiceParameters {
            nickname: desired.nickname.cloned(),
            vs_type: desired.vs_type.cloned(),
            enable: None,
        };

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.modify_sub_virtual_service(&child, params.clone())
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Create, KIND, &child, e))?;

        Ok(Self::map_state(response))
    }

    #[instrument(skip_all, fields(id = state.id))]
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>> {
        let id = state.id.to_string();
        let result = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_sub_virtual_service(&id)
            })
            .await;

        match result {
            Ok(response) => Ok(Outcome::Present(Self::map_state(response))),
            Err(e) if SUB_VIRTUAL_SERVICE_ABSENT.matches_retry(&e) => {
                debug!(id = state.id, "sub virtual service vanished remotely");
                Ok(Outcome::Absent)
            }
            Err(e) => Err(ReconcileError::operation(Op::Read, KIND, id, e)),
        }
    }

    #[instrument(skip_all, fields(id = state.id))]
    async fn update(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        let id = state.id.to_string();
        let params = VirtualServiceParameters {
            nickname: desired.nickname.cloned(),
            vs_type: desired.vs_type.cloned(),
            enable: None,
        };

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.modify_sub_virtual_service(&id, params.clone())
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Update, KIND, &id, e))?;

        Ok(Self::map_state(response))
    }

    #[instrument(skip_all, fields(id = state.id))]
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()> {
        let id = state.id.to_string();
        self.retry
            .run(cancel, classify_client_error, || {
                self.client.delete_sub_virtual_service(&id)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Delete, KIND, &id, e))?;

        Ok(())
    }

    #[instrument(skip_all, fields(id = id))]
    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Self::State> {
        id.parse::<i32>()
            .map_err(|_| ReconcileError::invalid_id(id, "expected a numeric index"))?;

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_sub_virtual_service(id)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Import, KIND, id, e))?;

        Ok(Self::map_state(response))
    }
}
