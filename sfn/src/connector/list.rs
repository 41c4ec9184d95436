use std::path::{Path, PathBuf};

use autoschematic_core::{connector::ResourceAddress, glob::addr_matches_filter};

use super::SfnConnector;
use crate::{
    addr::SfnResourceAddress,
    util::{list_execution_names, list_state_machines},
};

impl SfnConnector {
    pub async fn do_list(&self, subpath: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
        let mut results = Vec::<PathBuf>::new();
        let config = self.config.read().await;

        for region in &config.enabled_regions {
            if !addr_matches_filter(&PathBuf::from(format!("aws/sfn/{}", region)), subpath) {
                continue;
            }
            let client = self.get_or_init_client(region).await?;

            for (state_machine, state_machine_arn) in list_state_machines(&client).await? {
                for execution_name in list_execution_names(&client, &state_machine_arn).await? {
                    results.push(
                        SfnResourceAddress::Execution {
                            region: region.clone(),
                            state_machine: state_machine.clone(),
                            execution_name,
                        }
                        .to_path_buf(),
                    );
                }
            }
        }

        Ok(results)
    }
}
