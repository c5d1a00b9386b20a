//! Mock client for consumers' tests, behind the `mocks` feature

use async_trait::async_trait;
use mockall::mock;

use crate::error::Result;
use crate::types::{
    ContentResponse, RealServerListResponse, RealServerParameters, RuleKind, RuleListResponse,
    RuleParameters, StatusResponse, SubVirtualServiceResponse, VirtualServiceParameters,
    VirtualServiceResponse, WafRuleResponse,
};
use crate::ApplianceClient;

mock! {
    pub ApplianceClient {}

    #[async_trait]
    impl ApplianceClient for ApplianceClient {
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

        async fn add_sub_virtual_service(&self, parent: &str) -> Result<SubVirtualServiceResponse>;
        async fn show_sub_virtual_service(&self, index: &str) -> Result<SubVirtualServiceResponse>;
        async fn modify_sub_virtual_service(
            &self,
            index: &str,
            params: VirtualServiceParameters,
        ) -> Result<SubVirtualServiceResponse>;
        async fn delete_sub_virtual_service(&self, index: &str) -> Result<StatusResponse>;

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

        async fn add_rule(
            &self,
            kind: RuleKind,
            name: &str,
            params: RuleParameters,
        ) -> Result<RuleListResponse>;
        async fn show_rule(&self, name: &str) -> Result<RuleListResponse>;
        async fn modify_rule(&self, name: &str, params: RuleParameters) -> Result<RuleListResponse>;
        async fn delete_rule(&self, name: &str) -> Result<StatusResponse>;

        async fn add_custom_data(&self, filename: &str, content: &str) -> Result<StatusResponse>;
        async fn show_custom_data(&self, filename: &str) -> Result<ContentResponse>;
        async fn delete_custom_data(&self, filename: &str) -> Result<StatusResponse>;

        async fn add_custom_rule(&self, filename: &str, content: &str) -> Result<StatusResponse>;
        async fn show_custom_rule(&self, filename: &str) -> Result<ContentResponse>;
        async fn delete_custom_rule(&self, filename: &str) -> Result<StatusResponse>;

        async fn attach_waf_rule(
            &self,
            vs: &str,
            rule: &str,
            run_first: bool,
        ) -> Result<StatusResponse>;
        async fn show_waf_rule(&self, vs: &str, rule: &str) -> Result<WafRuleResponse>;
        async fn detach_waf_rule(&self, vs: &str, rule: &str) -> Result<StatusResponse>;
    }
}
