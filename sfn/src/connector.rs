use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::bail;
use async_trait::async_trait;
use autoschematic_connector_aws_core::config::{AwsServiceConfig, load_sdk_config};
use autoschematic_core::{
    connector::{
        Connector, ConnectorOutbox, FilterOutput, GetResourceOutput, OpExecOutput, OpPlanOutput, Resource, ResourceAddress,
        SkeletonOutput, VirtToPhyOutput,
    },
    diag::DiagnosticOutput,
    skeleton,
    util::{optional_string_from_utf8, ron_check_syntax},
};
use tokio::sync::{Mutex, RwLock};

use crate::{
    addr::SfnResourceAddress,
    config::SfnConnectorConfig,
    resource::{Execution, SfnResource},
};

pub mod get;
pub mod list;
pub mod op_exec;
pub mod plan;

#[derive(Default)]
pub struct SfnConnector {
    pub client_cache: Mutex<HashMap<String, Arc<aws_sdk_sfn::Client>>>,
    pub account_id: Mutex<String>,
    pub config: RwLock<SfnConnectorConfig>,
    pub prefix: PathBuf,
}

impl SfnConnector {
    pub async fn get_or_init_client(&self, region_s: &str) -> anyhow::Result<Arc<aws_sdk_sfn::Client>> {
        let mut cache = self.client_cache.lock().await;

        if !cache.contains_key(region_s) {
            let config = self.config.read().await;
            let sdk_config = load_sdk_config(region_s, config.endpoint_url.as_deref(), config.timeout_config.as_ref()).await;
            let client = aws_sdk_sfn::Client::new(&sdk_config);
            cache.insert(region_s.to_string(), Arc::new(client));
        };

        let Some(client) = cache.get(region_s) else {
            bail!("Failed to get client for region {}", region_s);
        };

        Ok(client.clone())
    }
}

#[async_trait]
impl Connector for SfnConnector {
    async fn new(_name: &str, prefix: &Path, _outbox: ConnectorOutbox) -> Result<Arc<dyn Connector>, anyhow::Error>
    where
        Self: Sized,
    {
        Ok(Arc::new(SfnConnector {
            prefix: prefix.into(),
            ..Default::default()
        }))
    }

    async fn init(&self) -> Result<(), anyhow::Error> {
        let config = SfnConnectorConfig::try_load(&self.prefix).await?;

        let account_id = config.verify_sts().await?;

        *self.client_cache.lock().await = HashMap::new();
        *self.config.write().await = config;
        *self.account_id.lock().await = account_id;
        Ok(())
    }

    async fn filter(&self, addr: &Path) -> Result<FilterOutput, anyhow::Error> {
        if let Ok(_addr) = SfnResourceAddress::from_path(addr) {
            Ok(FilterOutput::Resource)
        } else {
            Ok(FilterOutput::None)
        }
    }

    async fn subpaths(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut res = Vec::new();

        for region in &self.config.read().await.enabled_regions {
            res.push(PathBuf::from(format!("aws/sfn/{}", region)));
        }

        Ok(res)
    }

    async fn list(&self, subpath: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
        self.do_list(subpath).await
    }

    async fn get(&self, addr: &Path) -> Result<Option<GetResourceOutput>, anyhow::Error> {
        self.do_get(addr).await
    }

    async fn plan(
        &self,
        addr: &Path,
        current: Option<Vec<u8>>,
        desired: Option<Vec<u8>>,
    ) -> Result<Vec<OpPlanOutput>, anyhow::Error> {
        self.do_plan(addr, optional_string_from_utf8(current)?, optional_string_from_utf8(desired)?)
            .await
    }

    async fn op_exec(&self, addr: &Path, op: &str) -> Result<OpExecOutput, anyhow::Error> {
        self.do_op_exec(addr, op).await
    }

    // Execution names are chosen by the user, the ARN is only an output.
    async fn addr_virt_to_phy(&self, addr: &Path) -> anyhow::Result<VirtToPhyOutput> {
        let addr = SfnResourceAddress::from_path(addr)?;
        Ok(VirtToPhyOutput::Present(addr.to_path_buf()))
    }

    async fn addr_phy_to_virt(&self, addr: &Path) -> anyhow::Result<Option<PathBuf>> {
        let addr = SfnResourceAddress::from_path(addr)?;
        Ok(Some(addr.to_path_buf()))
    }

    async fn get_skeletons(&self) -> Result<Vec<SkeletonOutput>, anyhow::Error> {
        let mut res = Vec::new();

        let region = String::from("[region]");
        let state_machine = String::from("[state_machine_name]");
        let execution_name = String::from("[execution_name]");
        res.push(skeleton!(
            SfnResourceAddress::Execution {
                region,
                state_machine,
                execution_name
            },
            SfnResource::Execution(Execution {
                state_machine_arn: String::from("arn:aws:states:[region]:[account_id]:stateMachine:[state_machine_name]"),
                input: Some(String::from("{}")),
            })
        ));

        Ok(res)
    }

    async fn eq(&self, addr: &Path, a: &[u8], b: &[u8]) -> Result<bool, anyhow::Error> {
        let addr = SfnResourceAddress::from_path(addr)?;

        let a = SfnResource::from_bytes(&addr, a)?.normalized();
        let b = SfnResource::from_bytes(&addr, b)?.normalized();
        Ok(a == b)
    }

    async fn diag(&self, addr: &Path, a: &[u8]) -> Result<DiagnosticOutput, anyhow::Error> {
        let addr = SfnResourceAddress::from_path(addr)?;

        match addr {
            SfnResourceAddress::Execution { .. } => ron_check_syntax::<Execution>(a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn eq_ignores_input_formatting() {
        let connector = SfnConnector::default();
        let addr = Path::new("aws/sfn/eu-west-1/state_machines/backfill/executions/backfill.ron");

        let a = br#"Execution(
            state_machine_arn: "arn:aws:states:eu-west-1:123456789012:stateMachine:backfill",
            input: Some("{ \"day\": 1 }"),
        )"#;
        let b = br#"Execution(
            state_machine_arn: "arn:aws:states:eu-west-1:123456789012:stateMachine:backfill",
            input: Some("{\"day\":1}"),
        )"#;
        let c = br#"Execution(
            state_machine_arn: "arn:aws:states:eu-west-1:123456789012:stateMachine:backfill",
            input: Some("{\"day\":2}"),
        )"#;

        assert!(connector.eq(addr, a, b).await.unwrap());
        assert!(!connector.eq(addr, a, c).await.unwrap());
    }

    #[tokio::test]
    async fn listed_executions_resolve_without_stored_outputs() {
        let connector = SfnConnector {
            prefix: PathBuf::from("/nonexistent/prefix"),
            ..Default::default()
        };
        let addr = SfnResourceAddress::Execution {
            region: String::from("eu-west-1"),
            state_machine: String::from("backfill"),
            execution_name: String::from("nightly"),
        };

        assert!(connector.resolve_execution_arn(&addr).await.is_err());

        *connector.account_id.lock().await = String::from("123456789012");
        let listed = SfnResourceAddress::from_path(&addr.to_path_buf()).unwrap();
        assert_eq!(
            connector.resolve_execution_arn(&listed).await.unwrap(),
            "arn:aws:states:eu-west-1:123456789012:execution:backfill:nightly"
        );
    }

    #[tokio::test]
    async fn subpaths_follow_enabled_regions() {
        let connector = SfnConnector::default();
        connector.config.write().await.enabled_regions = vec![String::from("eu-west-1"), String::from("us-east-1")];

        assert_eq!(
            connector.subpaths().await.unwrap(),
            vec![PathBuf::from("aws/sfn/eu-west-1"), PathBuf::from("aws/sfn/us-east-1")]
        );
    }
}
