//! Content rewrite rule reconciler
//!
//! One reconciler serves all six rule families; the family only decides
//! the discriminant sent on create and which collection of the grouped
//! response is read back.

use std::sync::Arc;

use async_trait::async_trait;
use client_traits::{ApplianceClient, RuleEntry, RuleKind, RuleListResponse, RuleParameters};
use core_retry::{CancellationToken, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::address::parse_flat;
use crate::attr::Attr;
use crate::classify::classify_client_error;
use crate::drift::RULE_ABSENT;
use crate::error::{Op, ReconcileError, Result};
use crate::reconciler::{Outcome, Reconcile};

/// Caller-declared rule attributes. Which fields the appliance honors
/// depends on the rule family; the rest are ignored remotely.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteRuleDesired {
    pub name: String,
    #[serde(default)]
    pub header: Attr<String>,
    #[serde(default)]
    pub replacement: Attr<String>,
    #[serde(default)]
    pub pattern: Attr<String>,
    #[serde(default)]
    pub match_type: Attr<String>,
    #[serde(default)]
    pub only_on_flag: Attr<i32>,
    #[serde(default)]
    pub only_on_no_flag: Attr<i32>,
}

/// Last-synchronized view of a content rewrite rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRuleState {
    pub name: String,
    pub header: Option<String>,
    pub replacement: Option<String>,
    pub pattern: Option<String>,
    pub match_type: Option<String>,
    pub only_on_flag: Option<i32>,
    pub only_on_no_flag: Option<i32>,
}

pub struct RewriteRuleReconciler {
    client: Arc<dyn ApplianceClient>,
    retry: RetryPolicy,
    family: RuleKind,
}

impl RewriteRuleReconciler {
    pub fn new(client: Arc<dyn ApplianceClient>, retry: RetryPolicy, family: RuleKind) -> Self {
        Self {
            client,
            retry,
            family,
        }
    }

    fn map_state(entry: RuleEntry) -> RewriteRuleState {
        RewriteRuleState {
            name: entry.name,
            header: entry.header,
            replacement: entry.replacement,
            pattern: entry.pattern,
            match_type: entry.match_type,
            only_on_flag: entry.only_on_flag,
            only_on_no_flag: entry.only_on_no_flag,
        }
    }

    fn params_from(desired: &RewriteRuleDesired) -> RuleParameters {
        RuleParameters {
            header: desired.header.cloned(),
            replacement: desired.replacement.cloned(),
            pattern: desired.pattern.cloned(),
            match_type: desired.match_type.cloned(),
            only_on_flag: desired.only_on_flag.copied(),
            only_on_no_flag: desired.only_on_no_flag.copied(),
        }
    }

    /// Authoritative entry of the grouped response: last of this family's
    /// collection
    fn select_entry(&self, response: RuleListResponse, id: &str) -> Result<RewriteRuleState> {
        response
            .rules_of(self.family)
            .last()
            .cloned()
            .map(Self::map_state)
            .ok_or_else(|| ReconcileError::MissingEntity {
                kind: self.family.kind_name(),
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl Reconcile for RewriteRuleReconciler {
    type Desired = RewriteRuleDesired;
    type State = RewriteRuleState;

    fn kind(&self) -> &'static str {
        self.family.kind_name()
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), name = %desired.name))]
    async fn create(
        &self,
        cancel: &CancellationToken,
        desired: Self::Desired,
    ) -> Result<Self::State> {
        debug!("creating rewrite rule");
        let params = Self::params_from(&desired);

        let response = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.add_rule(self.family, &desired.name, params.clone())
            })
            .await
            .map_err(|e| {
                ReconcileError::operation(Op::Create, self.family.kind_name(), &desired.name, e)
            })?;

        self.select_entry(response, &desired.name)
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), name = %state.name))]
    async fn read(
        &self,
        cancel: &CancellationToken,
        state: Self::State,
    ) -> Result<Outcome<Self::State>> {
        let result = self
            .retry
            .run(cancel, classify_client_error, || {
                self.client.show_rule(&state.name)
            })
            .await;

        match result {
            Ok(response) => Ok(Outcome::Present(self.select_entry(response, &state.name)?)),
            Err(e) if RULE_ABSENT.matches_retry(&e) => {
                debug!(name = %state.name, "rule vanished remotely");
                Ok(Outcome::Absent)
            }
            Err(e) => Err(ReconcileError::operation(
                Op::Read,
                self.family.kind_name(),
                &state.name,
                e,
            )),
        }
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), name = %state.name))]
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
                self.client.modify_rule(&state.name, params.clone())
            })
            .await
            .map_err(|e| {
                ReconcileError::operation(Op::Update, self.family.kind_name(), &state.name, e)
            })?;

        self.select_entry(response, &state.name)
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), name = %state.name))]
    async fn delete(&self, cancel: &CancellationToken, state: Self::State) -> Result<()> {
        self.retry
            .run(cancel, classify_client_error, || {
                self.client.delete_rule(&state.name)
            })
            .await
            .map_err(|e| {
                ReconcileError::operation(Op::Delete, self.family.kind_name(), &state.name, e)
            })?;

        Ok(())
    }

    #[instrument(skip_all, fields(kind = self.family.kind_name(), id = id))]
    async fn import_state(&self, cancel: &CancellationToken, id: &str) -> Result<Self::State> {
        let name = parse_flat(id)?;

        let response = self
            .retry
            .run(cancel, classify_client_error, || self.client.show_rule(name))
            .await
            .map_err(|e| ReconcileError::operation(Op::Import, self.family.kind_name(), id, e))?;

        self.select_entry(response, id)
    }
}
