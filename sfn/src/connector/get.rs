use std::path::Path;

use anyhow::bail;
use autoschematic_core::{
    connector::{GetResourceOutput, Resource, ResourceAddress},
    get_resource_output,
};

use super::SfnConnector;
use crate::{
    addr::SfnResourceAddress,
    resource::{Execution, SfnResource},
    util::{describe_execution, execution_arn, format_date},
};

impl SfnConnector {
    /// Prefers the ARN recorded when the execution was started. Executions found by
    /// `list` have no record, so their ARN is derived from the address.
    pub async fn resolve_execution_arn(&self, addr: &SfnResourceAddress) -> anyhow::Result<String> {
        if let Some(arn) = addr.get_output(&self.prefix, "execution_arn")? {
            return Ok(arn);
        }

        let SfnResourceAddress::Execution {
            region,
            state_machine,
            execution_name,
        } = addr;

        let account_id = self.account_id.lock().await;
        if account_id.is_empty() {
            bail!("Cannot derive the ARN of Step Function Execution {}: account ID unknown", execution_name);
        }

        Ok(execution_arn(region, &account_id, state_machine, execution_name))
    }

    pub async fn do_get(&self, addr: &Path) -> Result<Option<GetResourceOutput>, anyhow::Error> {
        let addr = SfnResourceAddress::from_path(addr)?;

        match &addr {
            SfnResourceAddress::Execution { region, .. } => {
                let execution_arn = self.resolve_execution_arn(&addr).await?;

                let client = self.get_or_init_client(region).await?;
                tracing::debug!("Reading Step Function Execution {}", execution_arn);

                let Some(execution) = describe_execution(&client, &execution_arn).await? else {
                    return Ok(None);
                };

                let resource = SfnResource::Execution(Execution {
                    state_machine_arn: execution.state_machine_arn().to_string(),
                    input: execution.input().map(String::from),
                });

                get_resource_output!(
                    resource.normalized(),
                    [
                        (String::from("execution_arn"), Some(execution.execution_arn().to_string())),
                        (String::from("status"), Some(execution.status().as_str().to_string())),
                        (String::from("start_date"), Some(format_date(execution.start_date())?)),
                    ]
                )
            }
        }
    }
}
