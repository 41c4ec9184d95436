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
    addr::CloudFrontResourceAddress,
    config::CloudFrontConnectorConfig,
    resource::{CacheBehavior, CloudFrontResource, CookiePreference, CustomOriginConfig, ForwardedValues, Origin},
};

pub mod get;
pub mod list;
pub mod op_exec;
pub mod plan;

/// CloudFront is a global service whose control plane lives in us-east-1.
pub const CLOUDFRONT_REGION: &str = "us-east-1";

#[derive(Default)]
pub struct CloudFrontConnector {
    pub client_cache: Mutex<HashMap<String, Arc<aws_sdk_cloudfront::Client>>>,
    pub account_id: Mutex<String>,
    pub config: RwLock<CloudFrontConnectorConfig>,
    pub prefix: PathBuf,
}

impl CloudFrontConnector {
    pub async fn get_or_init_client(&self) -> anyhow::Result<Arc<aws_sdk_cloudfront::Client>> {
        let mut cache = self.client_cache.lock().await;

        if !cache.contains_key(CLOUDFRONT_REGION) {
            let config = self.config.read().await;
            let sdk_config = load_sdk_config(
                CLOUDFRONT_REGION,
                config.endpoint_url.as_deref(),
                config.timeout_config.as_ref(),
            )
            .await;
            let client = aws_sdk_cloudfront::Client::new(&sdk_config);
            cache.insert(CLOUDFRONT_REGION.to_string(), Arc::new(client));
        };

        let Some(client) = cache.get(CLOUDFRONT_REGION) else {
            bail!("Failed to get client for region {}", CLOUDFRONT_REGION);
        };

        Ok(client.clone())
    }
}

/// Compares two resource bodies after normalizing away ordering of unordered sets.
pub fn normalized_eq(addr: &CloudFrontResourceAddress, a: &[u8], b: &[u8]) -> anyhow::Result<bool> {
    let a = CloudFrontResource::from_bytes(addr, a)?.normalized();
    let b = CloudFrontResource::from_bytes(addr, b)?.normalized();
    Ok(a == b)
}

#[async_trait]
impl Connector for CloudFrontConnector {
    async fn new(_name: &str, prefix: &Path, _outbox: ConnectorOutbox) -> Result<Arc<dyn Connector>, anyhow::Error>
    where
        Self: Sized,
    {
        Ok(Arc::new(CloudFrontConnector {
            prefix: prefix.into(),
            ..Default::default()
        }))
    }

    async fn init(&self) -> Result<(), anyhow::Error> {
        let config = CloudFrontConnectorConfig::try_load(&self.prefix).await?;

        let account_id = config.verify_sts().await?;

        *self.client_cache.lock().await = HashMap::new();
        *self.config.write().await = config;
        *self.account_id.lock().await = account_id;
        Ok(())
    }

    async fn filter(&self, addr: &Path) -> Result<FilterOutput, anyhow::Error> {
        if let Ok(_addr) = CloudFrontResourceAddress::from_path(addr) {
            tracing::debug!("CloudFrontConnector::filter({}) = true", addr.display());
            Ok(FilterOutput::Resource)
        } else {
            Ok(FilterOutput::None)
        }
    }

    async fn subpaths(&self) -> anyhow::Result<Vec<PathBuf>> {
        Ok(vec![PathBuf::from("aws/cloudfront/distributions")])
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

    // Distribution IDs and keys are assigned by the user, so virtual and physical addresses coincide.
    async fn addr_virt_to_phy(&self, addr: &Path) -> anyhow::Result<VirtToPhyOutput> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;
        Ok(VirtToPhyOutput::Present(addr.to_path_buf()))
    }

    async fn addr_phy_to_virt(&self, addr: &Path) -> anyhow::Result<Option<PathBuf>> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;
        Ok(Some(addr.to_path_buf()))
    }

    async fn get_skeletons(&self) -> Result<Vec<SkeletonOutput>, anyhow::Error> {
        let mut res = Vec::new();

        let distribution_id = String::from("[distribution_id]");
        let path_pattern = String::from("/[path]/*");
        res.push(skeleton!(
            CloudFrontResourceAddress::CacheBehavior {
                distribution_id,
                path_pattern
            },
            CloudFrontResource::CacheBehavior(CacheBehavior {
                target_origin_id: String::from("[origin_id]"),
                viewer_protocol_policy: String::from("redirect-to-https"),
                allowed_methods: vec![String::from("GET"), String::from("HEAD")],
                cached_methods: vec![String::from("GET"), String::from("HEAD")],
                compress: true,
                default_ttl: 86400,
                max_ttl: 31536000,
                min_ttl: 0,
                field_level_encryption_id: None,
                forwarded_values: ForwardedValues {
                    query_string: false,
                    query_string_cache_keys: vec![],
                    headers: vec![],
                    cookies: CookiePreference {
                        forward: String::from("none"),
                        whitelisted_names: vec![],
                    },
                },
                lambda_function_associations: vec![],
                smooth_streaming: None,
                trusted_signers: vec![],
            })
        ));

        let distribution_id = String::from("[distribution_id]");
        let origin_id = String::from("[origin_id]");
        res.push(skeleton!(
            CloudFrontResourceAddress::Origin {
                distribution_id,
                origin_id
            },
            CloudFrontResource::Origin(Origin {
                domain_name: String::from("[domain_name]"),
                origin_path: None,
                custom_headers: vec![],
                custom_origin_config: Some(CustomOriginConfig {
                    http_port: 80,
                    https_port: 443,
                    origin_protocol_policy: String::from("https-only"),
                    origin_ssl_protocols: vec![String::from("TLSv1.2")],
                    origin_keepalive_timeout: 5,
                    origin_read_timeout: 30,
                }),
                s3_origin_config: None,
            })
        ));

        Ok(res)
    }

    async fn eq(&self, addr: &Path, a: &[u8], b: &[u8]) -> Result<bool, anyhow::Error> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;
        normalized_eq(&addr, a, b)
    }

    async fn diag(&self, addr: &Path, a: &[u8]) -> Result<DiagnosticOutput, anyhow::Error> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;

        match addr {
            CloudFrontResourceAddress::CacheBehavior { .. } => ron_check_syntax::<CacheBehavior>(a),
            CloudFrontResourceAddress::Origin { .. } => ron_check_syntax::<Origin>(a),
        }
    }
}
