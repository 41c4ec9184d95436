use autoschematic_connector_aws_core::{config::TimeoutConfig, impl_aws_config};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct SfnConnectorConfig {
    pub account_id:      Option<String>,
    pub endpoint_url:    Option<String>,
    pub timeout_config:  Option<TimeoutConfig>,
    pub sts_region:      String,
    pub enabled_regions: Vec<String>,
}

impl_aws_config!(SfnConnectorConfig, "aws/sfn/config.ron");
