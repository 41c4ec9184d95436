use std::path::{Path, PathBuf};

use autoschematic_core::{connector::ResourceAddress, glob::addr_matches_filter};

use super::CloudFrontConnector;
use crate::{
    addr::CloudFrontResourceAddress,
    util::{get_distribution_config, list_distributions},
};

impl CloudFrontConnector {
    pub async fn do_list(&self, subpath: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
        let mut results = Vec::<PathBuf>::new();
        let client = self.get_or_init_client().await?;

        for summary in list_distributions(&client).await? {
            let distribution_id = summary.id();
            if !addr_matches_filter(
                &PathBuf::from(format!("aws/cloudfront/distributions/{}", distribution_id)),
                subpath,
            ) {
                continue;
            }

            // The summary only carries partial items, so read the full config.
            let Some((_etag, config)) = get_distribution_config(distribution_id, &client).await? else {
                continue;
            };

            if let Some(cache_behaviors) = config.cache_behaviors() {
                for behavior in cache_behaviors.items() {
                    results.push(
                        CloudFrontResourceAddress::CacheBehavior {
                            distribution_id: distribution_id.to_string(),
                            path_pattern:    behavior.path_pattern().to_string(),
                        }
                        .to_path_buf(),
                    );
                }
            }

            if let Some(origins) = config.origins() {
                for origin in origins.items() {
                    results.push(
                        CloudFrontResourceAddress::Origin {
                            distribution_id: distribution_id.to_string(),
                            origin_id:       origin.id().to_string(),
                        }
                        .to_path_buf(),
                    );
                }
            }
        }

        Ok(results)
    }
}
