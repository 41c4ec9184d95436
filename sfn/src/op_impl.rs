use std::collections::HashMap;

use anyhow::anyhow;
use autoschematic_core::{connector::OpExecOutput, op_exec_output};
use aws_sdk_sfn::error::DisplayErrorContext;

use crate::{
    resource::{Execution, validate_execution_name},
    util::format_date,
};

pub async fn start_execution(
    client: &aws_sdk_sfn::Client,
    state_machine: &str,
    execution_name: &str,
    execution: &Execution,
) -> Result<OpExecOutput, anyhow::Error> {
    validate_execution_name(execution_name)?;
    execution.validate_for(state_machine)?;

    tracing::debug!(
        "Starting Step Function Execution {} of {}",
        execution_name,
        execution.state_machine_arn
    );

    let resp = client
        .start_execution()
        .state_machine_arn(&execution.state_machine_arn)
        .name(execution_name)
        .set_input(execution.input.clone())
        .send()
        .await
        .map_err(|e| anyhow!("Error running Step Function Execution: {}", DisplayErrorContext(&e)))?;

    let mut outputs = HashMap::new();
    outputs.insert(String::from("execution_arn"), Some(resp.execution_arn().to_string()));
    outputs.insert(String::from("start_date"), Some(format_date(resp.start_date())?));

    Ok(OpExecOutput {
        outputs: Some(outputs),
        friendly_message: Some(format!(
            "Started Step Function Execution {} ({})",
            execution_name,
            resp.execution_arn()
        )),
    })
}

pub async fn forget_execution(execution_name: &str) -> Result<OpExecOutput, anyhow::Error> {
    tracing::debug!("Removing Step Function Execution {} from state", execution_name);

    op_exec_output!(format!(
        "Step Function Execution {} removed from state, it cannot be deleted remotely",
        execution_name
    ))
}
