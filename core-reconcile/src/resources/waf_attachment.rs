//! WAF rule attachment reconciler
//!
//! Binds a named firewall rule to a virtual service. The attach endpoint
//! answers with a bare status, so create reads the binding back to record
//! what the appliance actually stored.

use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{ApplianceClient, WafRuleResponse};
use core_retry::{CancellationToken, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::address::split_pair;
use crate::attr::Attr;
use crate::classify::classify_client_error;
use crate::drift::RULE_ABSENT;
use crate::error::{Op, ReconcileError, Result};
use crate::reconciler::{Outcome, Reconcile};

const KIND: &str = "waf_attachment";

/// Caller-declared attachment of a firewall rule to a virtual service
#[derive(Debug, Clone, Deserialize)]
pub struct WafAttachmentDesired {
    pub virtual_service_id: String,
    pub rule: String,
    #[serde(default)]
    pub run_first: Attr<bool>,
}

/// Last-synchronized view of a firewall rule attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WafAttachmentState {
    pub virtual_service_id: String,
    pub rule: String,
    pub run_first: bool,
}

pub struct WafAttachmentReconciler {
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
}

impl WafAttachmentReconciler {
    pub fn new(client: Arc<dyn ApplianceClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    fn map_state(vs: &str, response: WafRuleResponse) -> WafAttachmentState {
        WafAttachmentState {
            virtual_service_id: vs.to_string(),
            rule: response.rule.name,
            run_first: response.rule.run_first == "yes",
        }
    }
}

#[async_trait]
impl Reconcile for WafAttachmentReconciler {
    type Desired = WafAttachmentDesired;
    type State = WafAttachmentState;

    fn kind(&self) -> &'static str {
        KIND
    }

    #[instrument(skip_all, fields(vs = %desired.virtual_service_id, rule = %desired.rule))]
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        debug!("attaching firewall rule");
        let run_first = desired.run_first.copied().unwrap_or(false);

        self.retry
            .run(cancel, classify_client_error, || {
                self.client
                    .attach_waf_rule(&desired.virtual_service_id, &desired.rule, run_first)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Create, KIND, &desired.rule, e))?;

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client
                    .show_waf_rule(&desired.virtual_service_id, &desired.rule)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Create, KIND, &desired.rule, e))?;

        Ok(Self::map_state(&desired.virtual_service_id, response))
    }

    #[instrument(skip_all, fields(vs = %state.virtual_service_id, rule = %state.rule))]
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>> {
        let result = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client
                    .show_waf_rule(&state.virtual_service_id, &state.rule)
            })
            .await;

        match result {
            Ok(response) => Ok(Outcome::Present(Self::map_state(
                &state.virtual_service_id,
                response,
            ))),
            Err(e) if RULE_ABSENT.matches_retry(&e) => {
                debug!(rule = %state.rule, "attachment vanished remotely");
                Ok(Outcome::Absent)
            }
            Err(e) => Err(ReconcileError::operation(Op::Read, KIND, &state.rule, e)),
        }
    }

    async fn update(
        &self,
        _cancel: &CancellationToken,
        _state: Self::State,
        _desired: Self::Desired,
    ) -> Result<Self::State> {
        // Attachments have no mutable attributes; detach and re-attach.
        Err(ReconcileError::UnsupportedUpdate { kind: KIND })
    }

    #[instrument(skip_all, fields(vs = %state.virtual_service_id, rule = %state.rule))]
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()> {
        self.retry
            .run(cancel, classify_client_error, || {
                self.client
                    .detach_waf_rule(&state.virtual_service_id, &state.rule)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Delete, KIND, &state.rule, e))?;

        Ok(())
    }

    #[instrument(skip_all, fields(id = id))]
    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Self::State> {
        let (vs, rule) = split_pair(id)?;

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_waf_rule(vs, rule)
            })
            .await
            .map_err(|e| ReconcileError::operation(Op::Import, KIND, id, e))?;

        Ok(Self::map_state(vs, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{ok_status, test_retry, MockClient};
    use client_traits::{ClientError, WafRuleEntry};

    fn waf_response(run_first: &str) -> WafRuleResponse {
        WafRuleResponse {
            rule: WafRuleEntry {
                name: "sqli_block".to_string(),
                run_first: run_first.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_reads_binding_back() {
        let mut client = MockClient::new();
        client
            .expect_attach_waf_rule()
            .times(1)
            .withf(|vs, rule, run_first| vs == "4" && rule == "sqli_block" && *run_first)
            .returning(|_, _, _| Ok(ok_status()));
        client
            .expect_show_waf_rule()
            .times(1)
            .returning(|_, _| Ok(waf_response("yes")));

        let reconciler = WafAttachmentReconciler::new(Arc::new(client), test_retry());
        let desired: WafAttachmentDesired = serde_json::from_str(
            r#"{"virtual_service_id": "4", "rule": "sqli_block", "run_first": true}"#,
        )
        .unwrap();

        let state = reconciler
            .create(&CancellationToken::new(), desired)
            .await
            .unwrap();

        assert_eq!(state.virtual_service_id, "4");
        assert!(state.run_first);
    }

    #[tokio::test]
    async fn test_read_maps_run_first_flag() {
        let mut client = MockClient::new();
        client
            .expect_show_waf_rule()
            .times(1)
            .returning(|_, _| Ok(waf_response("no")));

        let reconciler = WafAttachmentReconciler::new(Arc::new(client), test_retry());
        let state = WafAttachmentState {
            virtual_service_id: "4".to_string(),
            rule: "sqli_block".to_string(),
            run_first: true,
        };

        let outcome = reconciler
            .read(&CancellationToken::new(), state)
            .await
            .unwrap();
        assert!(!outcome.into_present().unwrap().run_first);
    }

    #[tokio::test]
    async fn test_read_heals_missing_attachment() {
        let mut client = MockClient::new();
        client
            .expect_show_waf_rule()
            .times(1)
            .returning(|_, _| Err(ClientError::api(400, "Rule not found")));

        let reconciler = WafAttachmentReconciler::new(Arc::new(client), test_retry());
        let state = WafAttachmentState {
            virtual_service_id: "4".to_string(),
            rule: "gone".to_string(),
            run_first: false,
        };

        let outcome = reconciler
            .read(&CancellationToken::new(), state)
            .await
            .unwrap();
        assert!(outcome.is_absent());
    }

    #[tokio::test]
    async fn test_update_is_refused() {
        let reconciler = WafAttachmentReconciler::new(Arc::new(MockClient::new()), test_retry());
        let state = WafAttachmentState {
            virtual_service_id: "4".to_string(),
            rule: "sqli_block".to_string(),
            run_first: false,
        };
        let desired: WafAttachmentDesired = serde_json::from_str(
            r#"{"virtual_service_id": "4", "rule": "sqli_block"}"#,
        )
        .unwrap();

        let result = reconciler
            .update(&CancellationToken::new(), state, desired)
            .await;
        assert!(matches!(
            result,
            Err(ReconcileError::UnsupportedUpdate { kind: "waf_attachment" })
        ));
    }

    #[tokio::test]
    async fn test_import_splits_composite_id() {
        let mut client = MockClient::new();
        client
            .expect_show_waf_rule()
            .times(1)
            .withf(|vs, rule| vs == "4" && rule == "sqli_block")
            .returning(|_, _| Ok(waf_response("yes")));

        let reconciler = WafAttachmentReconciler::new(Arc::new(client), test_retry());
        let state = reconciler
            .import_state(&CancellationToken::new(), "4/sqli_block")
            .await
            .unwrap();
        assert_eq!(state.rule, "sqli_block");

        let reconciler = WafAttachmentReconciler::new(Arc::new(MockClient::new()), test_retry());
        let result = reconciler
            .import_state(&CancellationToken::new(), "missing-slash")
            .await;
        assert!(matches!(result, Err(ReconcileError::InvalidId { .. })));
    }
}
