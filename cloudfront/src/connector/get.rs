use std::path::Path;

use autoschematic_connector_aws_core::merge::select_items;
use autoschematic_core::{
    connector::{GetResourceOutput, Resource, ResourceAddress},
    get_resource_output,
};

use super::CloudFrontConnector;
use crate::{
    addr::CloudFrontResourceAddress,
    convert::{cache_behavior_from_sdk, origin_from_sdk},
    resource::CloudFrontResource,
    util::get_distribution_config,
};

impl CloudFrontConnector {
    pub async fn do_get(&self, addr: &Path) -> Result<Option<GetResourceOutput>, anyhow::Error> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;
        let client = self.get_or_init_client().await?;

        let Some((_etag, config)) = get_distribution_config(addr.distribution_id(), &client).await? else {
            return Ok(None);
        };

        match &addr {
            CloudFrontResourceAddress::CacheBehavior {
                distribution_id,
                path_pattern,
            } => {
                let items = config.cache_behaviors().map(|cb| cb.items()).unwrap_or_default();
                let Some(behavior) = select_items(items, &[path_pattern.as_str()]).into_iter().next() else {
                    tracing::debug!("No cache behavior {} on distribution {}", path_pattern, distribution_id);
                    return Ok(None);
                };

                get_resource_output!(
                    CloudFrontResource::CacheBehavior(cache_behavior_from_sdk(behavior)),
                    [(String::from("distribution_id"), Some(distribution_id.clone()))]
                )
            }
            CloudFrontResourceAddress::Origin {
                distribution_id,
                origin_id,
            } => {
                let items = config.origins().map(|o| o.items()).unwrap_or_default();
                let Some(origin) = select_items(items, &[origin_id.as_str()]).into_iter().next() else {
                    tracing::debug!("No origin {} on distribution {}", origin_id, distribution_id);
                    return Ok(None);
                };

                get_resource_output!(
                    CloudFrontResource::Origin(origin_from_sdk(origin)),
                    [(String::from("distribution_id"), Some(distribution_id.clone()))]
                )
            }
        }
    }
}
