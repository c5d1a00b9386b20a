//! Virtual service reconciler

use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{
    ApplianceClient, ClientError, VirtualServiceParameters, VirtualServiceResponse,
};
use core_retry::{CancellationToken, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::attr::Attr;
use crate::classify::classify_client_error;
use crate::drift::VIRTUAL_SERVICE_ABSENT;
use crate::error::{Op, ReconcileError, Result};
use crate::reconciler::{Outcome, Reconcile};

const KIND: &str = "virtual_service";

/// Caller-declared virtual service attributes
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualServiceDesired {
    pub address: String,
    pub port: String,
    pub protocol: String,
    #[serde(default)]
    pub nickname: Attr<String>,
    #[serde(default)]
    pub enabled: Attr<bool>,
}

/// Last-synchronized view of a virtual service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualServiceState {
    pub id: i32,
    pub address: String,
    pub port: String,
    pub protocol: String,
    pub nickname: String,
    pub enabled: bool,
}

/// What a restart request actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    /// The service was disabled; bouncing it would have enabled it
    SkippedDisabled,
}

pub struct VirtualServiceReconciler {
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
}

impl VirtualServiceReconciler {
    pub fn new(client: Arc<dyn ApplianceClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn map_state(response: VirtualServiceResponse) -> VirtualServiceState {
        VirtualServiceState {
            id: response.index,
            address: response.address,
            port: response.port,
            protocol: response.protocol,
            nickname: response.nickname,
            enabled: response.enable.unwrap_or(false),
        }
    }

    fn params_from(desired: &VirtualServiceDesired) -> VirtualServiceParameters {
        VirtualServiceParameters {
            nickname: desired.nickname.cloned(),
            vs_type: None,
            enable: desired.enabled.copied(),
        }
    }

    /// Restart the service by bouncing its enable flag, which some
    /// configuration changes need to take effect.
    ///
    /// A currently disabled service is left untouched: bouncing it would
    /// enable it as a side effect. The disable/enable pair runs as one
    /// retried operation so a mid-bounce transient failure replays both
    /// writes.
    #[instrument(skip_all, fields(id = id))]
    pub async fn restart(
        &self,
        cancel: &CancellationToken,
        id: i32,
    ) -> Result<RestartOutcome> {
        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_virtual_service(id)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Restart, KIND, id.to_string(), e))?;

        if !response.enable.unwrap_or(false) {
            warn!(id, "virtual service is disabled, restart skipped");
            return Ok(RestartOutcome::SkippedDisabled);
        }

        self.retry
            .run(cancel, classify_client_error, || async move {
                let off = VirtualServiceParameters {
                    enable: Some(false),
                    ..Default::default()
                };
                self.client.modify_virtual_service(id, off).await?;

                let on = VirtualServiceParameters {
                    enable: Some(true),
                    ..Default::default()
                };
                self.client.modify_virtual_service(id, on).await?;
                Ok::<_, ClientError>(())
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Restart, KIND, id.to_string(), e))?;

        debug!(id, "virtual service restarted");
        Ok(RestartOutcome::Restarted)
    }
}

#[async_trait]
impl Reconcile for VirtualServiceReconciler {
    type Desired = VirtualServiceDesired;
    type State = VirtualServiceState;

    fn kind(&self) -> &'static str {
        KIND
    }

    #[instrument(skip_all, fields(address = %desired.address, port = %desired.port))]
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        debug!("creating virtual service");
        let params = Self::params_from(&desired);

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.add_virtual_service(
                    &desired.address,
                    &desired.port,
                    &desired.protocol,
                    params.clone(),
                )
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Create, KIND, &desired.address, e))?;

        Ok(Self::map_state(response))
    }

    #[instrument(skip_all, fields(id = state.id))]
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>> {
        let result = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_virtual_service(state.id)
            })
            .await;

        match result {
            Ok(response) => Ok(Outcome::Present(Self::map_state(response))),
            Err(e) if VIRTUAL_SERVICE_ABSENT.matches_retry(&e) => {
                debug!(id = state.id, "virtual service vanished remotely");
                Ok(Outcome::Absent)
            }
            Err(e) => Err(ReconcileError::operation(
                Op::Read,
                KIND,
                state.id.to_string(),
                e,
            )),
        }
    }

    #[instrument(skip_all, fields(id = state.id))]
    async fn update(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        let params = Self::params_from(&desired);

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.modify_virtual_service(state.id, params.clone())
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Update, KIND, state.id.to_string(), e))?;

        Ok(Self::map_state(response))
    }

    #[instrument(skip_all, fields(id = state.id))]
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()> {
        self.retry
            .run(cancel, classify_client_error, || {
                self.client.delete_virtual_service(state.id)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Delete, KIND, state.id.to_string(), e))?;

        Ok(())
    }

    #[instrument(skip_all, fields(id = id))]
    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Self::State> {
        let index = id
            .parse::<i32>()
            .map_err(|_| ReconcileError::invalid_id(id, "expected a numeric index"))?;

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_virtual_service(index)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Import, KIND, id, e))?;

        Ok(Self::map_state(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{test_retry, MockClient};
    use client_traits::ClientError;

    fn vs_response(index: i32) -> VirtualServiceResponse {
        VirtualServiceResponse {
            index,
            address: "192.0.2.10".to_string(),
            port: "443".to_string(),
            protocol: "tcp".to_string(),
            nickname: "frontend".to_string(),
            enable: Some(true),
        }
    }

    #[tokio::test]
    async fn test_create_records_server_assigned_id_and_defaults() {
        let mut client = MockClient::new();
        client
            .expect_add_virtual_service()
            .times(1)
            .returning(|_, _, _, _| Ok(vs_response(7)));

        let reconciler = VirtualServiceReconciler::new(Arc::new(client), test_retry());
        let desired: VirtualServiceDesired = serde_json::from_str(
            r#"{"address": "192.0.2.10", "port": "443", "protocol": "tcp"}"#,
        )
        .unwrap();

        let state = reconciler
            .create(&CancellationToken::new(), desired)
            .await
            .unwrap();

        assert_eq!(state.id, 7);
        // Server-filled defaults are read back, never assumed.
        assert_eq!(state.nickname, "frontend");
        assert!(state.enabled);
    }

    #[tokio::test]
    async fn test_read_heals_drift_into_absent() {
        let mut client = MockClient::new();
        client
            .expect_show_virtual_service()
            .times(1)
            .returning(|_| Err(ClientError::api(422, "Unknown VS")));

        let reconciler = VirtualServiceReconciler::new(Arc::new(client), test_retry());
        let state = VirtualServiceState {
            id: 7,
            address: "192.0.2.10".to_string(),
            port: "443".to_string(),
            protocol: "tcp".to_string(),
            nickname: String::new(),
            enabled: true,
        };

        let outcome = reconciler
            .read(&CancellationToken::new(), state)
            .await
            .unwrap();
        assert!(outcome.is_absent());
    }

    #[tokio::test]
    async fn test_read_surfaces_other_failures() {
        let mut client = MockClient::new();
        client
            .expect_show_virtual_service()
            .times(1)
            .returning(|_| Err(ClientError::api(401, "Unauthorized")));

        let reconciler = VirtualServiceReconciler::new(Arc::new(client), test_retry());
        let state = VirtualServiceState {
            id: 7,
            address: "192.0.2.10".to_string(),
            port: "443".to_string(),
            protocol: "tcp".to_string(),
            nickname: String::new(),
            enabled: true,
        };

        let result = reconciler.read(&CancellationToken::new(), state).await;
        assert!(matches!(
            result,
            Err(ReconcileError::Operation { op: Op::Read, .. })
        ));
    }

    #[tokio::test]
    async fn test_restart_bounces_enable_flag() {
        let mut client = MockClient::new();
        client
            .expect_show_virtual_service()
            .times(1)
            .returning(|index| Ok(vs_response(index)));
        client
            .expect_modify_virtual_service()
            .times(1)
            .withf(|index, params| *index == 7 && params.enable == Some(false))
            .returning(|index, _| Ok(vs_response(index)));
        client
            .expect_modify_virtual_service()
            .times(1)
            .withf(|index, params| *index == 7 && params.enable == Some(true))
            .returning(|index, _| Ok(vs_response(index)));

        let reconciler = VirtualServiceReconciler::new(Arc::new(client), test_retry());
        let outcome = reconciler
            .restart(&CancellationToken::new(), 7)
            .await
            .unwrap();
        assert_eq!(outcome, RestartOutcome::Restarted);
    }

    #[tokio::test]
    async fn test_restart_skips_disabled_service() {
        let mut client = MockClient::new();
        client.expect_show_virtual_service().times(1).returning(|index| {
            Ok(VirtualServiceResponse {
                enable: Some(false),
                ..vs_response(index)
            })
        });
        // No modify expectation: bouncing a disabled service would enable it.

        let reconciler = VirtualServiceReconciler::new(Arc::new(client), test_retry());
        let outcome = reconciler
            .restart(&CancellationToken::new(), 7)
            .await
            .unwrap();
        assert_eq!(outcome, RestartOutcome::SkippedDisabled);
    }

    #[tokio::test]
    async fn test_restart_surfaces_lookup_failure() {
        let mut client = MockClient::new();
        client
            .expect_show_virtual_service()
            .times(1)
            .returning(|_| Err(ClientError::api(422, "Unknown VS")));

        let reconciler = VirtualServiceReconciler::new(Arc::new(client), test_retry());
        let result = reconciler.restart(&CancellationToken::new(), 7).await;
        assert!(matches!(
            result,
            Err(ReconcileError::Operation { op: Op::Restart, .. })
        ));
    }

    #[tokio::test]
    async fn test_import_rejects_non_numeric_id() {
        let reconciler =
            VirtualServiceReconciler::new(Arc::new(MockClient::new()), test_retry());

        let result = reconciler
            .import_state(&CancellationToken::new(), "not-a-number")
            .await;
        assert!(matches!(result, Err(ReconcileError::InvalidId { .. })));
    }
}
