use std::{path::Path, time::Duration};

use anyhow::bail;
use aws_config::{BehaviorVersion, Region, SdkConfig, meta::region::RegionProviderChain};
use serde::{Deserialize, Serialize};

use autoschematic_core::util::RON;

/// Per-call timeouts applied to every SDK client a connector builds.
/// Unset fields fall back to 30 seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    pub connect_timeout_secs: Option<u64>,
    pub operation_timeout_secs: Option<u64>,
    pub operation_attempt_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

impl TimeoutConfig {
    pub fn to_sdk(&self) -> aws_config::timeout::TimeoutConfig {
        let secs = |v: Option<u64>| v.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT);

        aws_config::timeout::TimeoutConfig::builder()
            .connect_timeout(secs(self.connect_timeout_secs))
            .operation_timeout(secs(self.operation_timeout_secs))
            .operation_attempt_timeout(secs(self.operation_attempt_timeout_secs))
            .read_timeout(secs(self.read_timeout_secs))
            .build()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AwsConnectorConfig {
    pub account_id:      Option<String>,
    pub endpoint_url:    Option<String>,
    pub timeout_config:  Option<TimeoutConfig>,
    pub sts_region:      String,
    pub enabled_regions: Vec<String>,
}

impl Default for AwsConnectorConfig {
    fn default() -> Self {
        Self {
            account_id:      Default::default(),
            endpoint_url:    Default::default(),
            timeout_config:  Default::default(),
            sts_region:      String::from("us-east-1"),
            enabled_regions: ["eu-west-1", "eu-west-2", "us-east-1", "us-east-2", "us-west-1", "us-west-2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AwsConnectorConfig {
    pub fn try_load(prefix: &Path) -> anyhow::Result<AwsConnectorConfig> {
        let config_path = prefix.join("aws/config.ron");
        if config_path.is_file() {
            tracing::info!("Loading AwsConnector config file at {:?}", config_path);
            let config: AwsConnectorConfig = RON.from_str(&std::fs::read_to_string(config_path)?)?;
            Ok(config)
        } else {
            tracing::info!("AwsConnector config file at {:?} not present, skipping.", config_path);
            Ok(AwsConnectorConfig::default())
        }
    }
}

/// Loads an SDK config pinned to `region`, honouring the endpoint override and timeouts.
pub async fn load_sdk_config(
    region: &str,
    endpoint_url: Option<&str>,
    timeout_config: Option<&TimeoutConfig>,
) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(RegionProviderChain::first_try(Region::new(region.to_owned())))
        .timeout_config(timeout_config.cloned().unwrap_or_default().to_sdk());

    if let Some(endpoint_url) = endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    loader.load().await
}

pub async fn verify_sts_account_id(sts_region: String, account_id: Option<String>) -> anyhow::Result<String> {
    let sts_config = aws_config::defaults(BehaviorVersion::latest())
        .region(RegionProviderChain::first_try(Region::new(sts_region)))
        .load()
        .await;

    let sts_client = aws_sdk_sts::Client::new(&sts_config);
    let caller_identity = sts_client.get_caller_identity().send().await;

    match caller_identity {
        Ok(caller_identity) => {
            let Some(caller_account_id) = caller_identity.account else {
                bail!("Failed to get current account ID!");
            };

            if let Some(account_id) = account_id
                && caller_account_id != account_id
            {
                bail!(
                    "AWS: Account ID mismatch. Configured to use account ID {account_id}, \nbut credentials provided are for account ID {caller_account_id}."
                )
            }
            Ok(caller_account_id)
        }
        Err(e) => {
            tracing::error!("Failed to call sts:GetCallerIdentity: {}", e);
            Err(e.into())
        }
    }
}

pub trait AwsServiceConfig: From<AwsConnectorConfig> {
    async fn try_load(prefix: &Path) -> anyhow::Result<Self>;
    async fn verify_sts(&self) -> anyhow::Result<String>;
}

/// Implements `From<AwsConnectorConfig>`, `Default` and `AwsServiceConfig` for a
/// per-service config struct carrying the same five fields. The service file at
/// `$path` wins over the shared `aws/config.ron`.
#[macro_export]
macro_rules! impl_aws_config {
    ($type:ty, $path:expr) => {
        impl From<$crate::config::AwsConnectorConfig> for $type {
            fn from(value: $crate::config::AwsConnectorConfig) -> Self {
                Self {
                    account_id:      value.account_id,
                    endpoint_url:    value.endpoint_url,
                    timeout_config:  value.timeout_config,
                    sts_region:      value.sts_region,
                    enabled_regions: value.enabled_regions,
                }
            }
        }

        impl Default for $type {
            fn default() -> Self {
                Self::from($crate::config::AwsConnectorConfig::default())
            }
        }

        impl $crate::config::AwsServiceConfig for $type {
            async fn try_load(prefix: &::std::path::Path) -> anyhow::Result<Self> {
                let config_path = prefix.join($path);
                if config_path.is_file() {
                    tracing::info!("Loading {} at {:?}", stringify!($type), config_path);
                    let config: $type =
                        autoschematic_core::util::RON.from_str(&::std::fs::read_to_string(config_path)?)?;
                    Ok(config)
                } else {
                    Ok(<$type>::from($crate::config::AwsConnectorConfig::try_load(prefix)?))
                }
            }

            async fn verify_sts(&self) -> anyhow::Result<String> {
                $crate::config::verify_sts_account_id(self.sts_region.clone(), self.account_id.clone()).await
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let prefix = Path::new("/nonexistent/autoschematic/prefix");
        let config = AwsConnectorConfig::try_load(prefix).unwrap();
        assert_eq!(config, AwsConnectorConfig::default());
        assert_eq!(config.sts_region, "us-east-1");
        assert!(config.enabled_regions.contains(&String::from("us-east-1")));
    }

    #[test]
    fn parses_partial_timeouts() {
        let config: AwsConnectorConfig = RON
            .from_str(
                r#"(
                    account_id: Some("123456789012"),
                    endpoint_url: None,
                    timeout_config: Some((connect_timeout_secs: Some(5))),
                    sts_region: "eu-west-1",
                    enabled_regions: ["eu-west-1"],
                )"#,
            )
            .unwrap();

        assert_eq!(config.account_id.as_deref(), Some("123456789012"));
        let timeouts = config.timeout_config.unwrap();
        assert_eq!(timeouts.connect_timeout_secs, Some(5));
        assert_eq!(timeouts.read_timeout_secs, None);

        let sdk = timeouts.to_sdk();
        assert_eq!(sdk.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(sdk.read_timeout(), Some(DEFAULT_TIMEOUT));
    }
}
