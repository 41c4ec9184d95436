use std::path::Path;

use anyhow::bail;
use autoschematic_core::connector::{ConnectorOp, OpExecOutput, ResourceAddress};

use super::CloudFrontConnector;
use crate::{addr::CloudFrontResourceAddress, op::CloudFrontConnectorOp, op_impl};

impl CloudFrontConnector {
    pub async fn do_op_exec(&self, addr: &Path, op: &str) -> Result<OpExecOutput, anyhow::Error> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;
        let op = CloudFrontConnectorOp::from_str(op)?;
        let client = self.get_or_init_client().await?;

        match &addr {
            CloudFrontResourceAddress::CacheBehavior {
                distribution_id,
                path_pattern,
            } => match op {
                CloudFrontConnectorOp::AddCacheBehavior(behavior) => {
                    op_impl::add_cache_behavior(&client, distribution_id, path_pattern, &behavior).await
                }
                CloudFrontConnectorOp::UpdateCacheBehavior(behavior) => {
                    op_impl::update_cache_behavior(&client, distribution_id, path_pattern, &behavior).await
                }
                CloudFrontConnectorOp::RemoveCacheBehavior => {
                    op_impl::remove_cache_behavior(&client, distribution_id, path_pattern).await
                }
                op => bail!("Invalid operation {:?} for cache behavior {}", op, path_pattern),
            },
            CloudFrontResourceAddress::Origin {
                distribution_id,
                origin_id,
            } => match op {
                CloudFrontConnectorOp::AddOrigin(origin) => {
                    op_impl::add_origin(&client, distribution_id, origin_id, &origin).await
                }
                CloudFrontConnectorOp::UpdateOrigin(origin) => {
                    op_impl::update_origin(&client, distribution_id, origin_id, &origin).await
                }
                CloudFrontConnectorOp::RemoveOrigin => op_impl::remove_origin(&client, distribution_id, origin_id).await,
                op => bail!("Invalid operation {:?} for origin {}", op, origin_id),
            },
        }
    }
}
