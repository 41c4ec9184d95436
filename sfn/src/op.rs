use autoschematic_core::{connector::ConnectorOp, util::RON};
use serde::{Deserialize, Serialize};

use super::resource::Execution;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum SfnConnectorOp {
    StartExecution(Execution),
    /// Executions cannot be deleted remotely; this only drops the local record.
    ForgetExecution,
}

impl ConnectorOp for SfnConnectorOp {
    fn to_string(&self) -> Result<String, anyhow::Error> {
        Ok(RON.to_string(self)?)
    }

    fn from_str(s: &str) -> Result<Self, anyhow::Error>
    where
        Self: Sized,
    {
        Ok(RON.from_str(s)?)
    }
}
