//! The appliance management API trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ContentResponse, RealServerListResponse, RealServerParameters, RuleKind, RuleListResponse,
    RuleParameters, StatusResponse, SubVirtualServiceResponse, VirtualServiceParameters,
    VirtualServiceResponse, WafRuleResponse,
};

/// Typed client for the appliance management API.
///
/// One call pair per entity family. Implementations own transport and
/// authentication; every method maps to a single management request and
/// must be safe to invoke more than once, since the reconciliation core
/// retries transient failures.
///
/// Index parameters are passed as strings where the appliance overloads
/// the field: a child index prefixed with `!` addresses an exact index,
/// a bare value addresses by list position.
///
/// # Example
///
/// ```ignore
/// use client_traits::ApplianceClient;
///
/// async fn port_of(client: &dyn ApplianceClient, index: i32) -> client_traits::Result<String> {
///     let vs = client.show_virtual_service(index).await?;
///     Ok(vs.port)
/// }
/// ```
#[async_trait]
pub trait ApplianceClient: Send + Sync {
    // Virtual services

    async fn add_virtual_service(
        &self,
        address: &str,
        port: &str,
        protocol: &str,
        params: VirtualServiceParameters,
    ) -> Result<VirtualServiceResponse>;

    async fn show_virtual_service(&self, index: i32) -> Result<VirtualServiceResponse>;

    async fn modify_virtual_service(
        &self,
        index: i32,
        params: VirtualServiceParameters,
    ) -> Result<VirtualServiceResponse>;

    async fn delete_virtual_service(&self, index: i32) -> Result<StatusResponse>;

    // Sub virtual services

    async fn add_sub_virtual_service(&self, parent: &str) -> Result<SubVirtualServiceResponse>;

    async fn show_sub_virtual_service(&self, index: &str) -> Result<SubVirtualServiceResponse>;

    async fn modify_sub_virtual_service(
        &self,
        index: &str,
        params: VirtualServiceParameters,
    ) -> Result<SubVirtualServiceResponse>;

    async fn delete_sub_virtual_service(&self, index: &str) -> Result<StatusResponse>;

    // Real servers

    async fn add_real_server(
        &self,
        vs: &str,
        address: &str,
        port: &str,
        params: RealServerParameters,
    ) -> Result<RealServerListResponse>;

    async fn show_real_server(&self, vs: &str, rs: &str) -> Result<RealServerListResponse>;

    async fn modify_real_server(
        &self,
        vs: &str,
        rs: &str,
        params: RealServerParameters,
    ) -> Result<RealServerListResponse>;

    async fn delete_real_server(&self, vs: &str, rs: &str) -> Result<StatusResponse>;

    // Content rewrite rules

    async fn add_rule(
        &self,
        kind: RuleKind,
        name: &str,
        params: RuleParameters,
    ) -> Result<RuleListResponse>;

    async fn show_rule(&self, name: &str) -> Result<RuleListResponse>;

    async fn modify_rule(&self, name: &str, params: RuleParameters) -> Result<RuleListResponse>;

    async fn delete_rule(&self, name: &str) -> Result<StatusResponse>;

    // WAF custom data blobs

    async fn add_custom_data(&self, filename: &str, content: &str) -> Result<StatusResponse>;

    async fn show_custom_data(&self, filename: &str) -> Result<ContentResponse>;

    async fn delete_custom_data(&self, filename: &str) -> Result<StatusResponse>;

    // WAF custom rule blobs

    async fn add_custom_rule(&self, filename: &str, content: &str) -> Result<StatusResponse>;

    async fn show_custom_rule(&self, filename: &str) -> Result<ContentResponse>;

    async fn delete_custom_rule(&self, filename: &str) -> Result<StatusResponse>;

    // Virtual service <-> WAF rule attachments

    async fn attach_waf_rule(&self, vs: &str, rule: &str, run_first: bool)
        -> Result<StatusResponse>;

    async fn show_waf_rule(&self, vs: &str, rule: &str) -> Result<WafRuleResponse>;

    async fn detach_waf_rule(&self, vs: &str, rule: &str) -> Result<StatusResponse>;
}
