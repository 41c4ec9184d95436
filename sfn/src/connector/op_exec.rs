use std::path::Path;

use autoschematic_core::connector::{ConnectorOp, OpExecOutput, ResourceAddress};

use super::SfnConnector;
use crate::{addr::SfnResourceAddress, op::SfnConnectorOp, op_impl};

impl SfnConnector {
    pub async fn do_op_exec(&self, addr: &Path, op: &str) -> Result<OpExecOutput, anyhow::Error> {
        let addr = SfnResourceAddress::from_path(addr)?;
        let op = SfnConnectorOp::from_str(op)?;

        match &addr {
            SfnResourceAddress::Execution {
                region,
                state_machine,
                execution_name,
            } => match op {
                SfnConnectorOp::StartExecution(execution) => {
                    let client = self.get_or_init_client(region).await?;
                    op_impl::start_execution(&client, state_machine, execution_name, &execution).await
                }
                SfnConnectorOp::ForgetExecution => op_impl::forget_execution(execution_name).await,
            },
        }
    }
}
