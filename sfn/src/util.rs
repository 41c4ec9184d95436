use aws_sdk_sfn::{
    error::{ProvideErrorMetadata, SdkError},
    operation::describe_execution::{DescribeExecutionError, DescribeExecutionOutput},
    primitives::DateTime,
};
use aws_smithy_types::date_time::Format;

pub fn is_execution_not_found<R>(err: &SdkError<DescribeExecutionError, R>) -> bool {
    err.as_service_error()
        .is_some_and(|e| e.is_execution_does_not_exist() || e.code() == Some("NotFoundException"))
}

pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    }
}

pub fn execution_arn(region: &str, account_id: &str, state_machine: &str, execution_name: &str) -> String {
    format!(
        "arn:{}:states:{}:{}:execution:{}:{}",
        partition_for_region(region),
        region,
        account_id,
        state_machine,
        execution_name
    )
}

pub fn format_date(date: &DateTime) -> anyhow::Result<String> {
    Ok(date.fmt(Format::DateTime)?)
}

/// Returns `None` if the execution no longer exists.
pub async fn describe_execution(
    client: &aws_sdk_sfn::Client,
    execution_arn: &str,
) -> anyhow::Result<Option<DescribeExecutionOutput>> {
    match client.describe_execution().execution_arn(execution_arn).send().await {
        Ok(resp) => Ok(Some(resp)),
        Err(e) if is_execution_not_found(&e) => {
            tracing::warn!("Step Function Execution {} not found, removing from state", execution_arn);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Returns `(name, arn)` for every state machine in the client's region.
pub async fn list_state_machines(client: &aws_sdk_sfn::Client) -> anyhow::Result<Vec<(String, String)>> {
    let mut results = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let resp = client.list_state_machines().set_next_token(next_token.take()).send().await?;

        results.extend(
            resp.state_machines()
                .iter()
                .map(|sm| (sm.name().to_string(), sm.state_machine_arn().to_string())),
        );

        match resp.next_token() {
            Some(token) => next_token = Some(token.to_string()),
            None => break,
        }
    }

    Ok(results)
}

pub async fn list_execution_names(client: &aws_sdk_sfn::Client, state_machine_arn: &str) -> anyhow::Result<Vec<String>> {
    let mut results = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let resp = client
            .list_executions()
            .state_machine_arn(state_machine_arn)
            .set_next_token(next_token.take())
            .send()
            .await?;

        results.extend(resp.executions().iter().map(|e| e.name().to_string()));

        match resp.next_token() {
            Some(token) => next_token = Some(token.to_string()),
            None => break,
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use aws_sdk_sfn::{
        error::ErrorMetadata,
        types::error::{ExecutionDoesNotExist, InvalidArn},
    };

    use super::*;

    #[test]
    fn missing_executions_are_recognized() {
        let missing: SdkError<DescribeExecutionError, ()> = SdkError::service_error(
            DescribeExecutionError::ExecutionDoesNotExist(ExecutionDoesNotExist::builder().build()),
            (),
        );
        assert!(is_execution_not_found(&missing));

        let not_found: SdkError<DescribeExecutionError, ()> = SdkError::service_error(
            DescribeExecutionError::generic(ErrorMetadata::builder().code("NotFoundException").build()),
            (),
        );
        assert!(is_execution_not_found(&not_found));

        let invalid: SdkError<DescribeExecutionError, ()> =
            SdkError::service_error(DescribeExecutionError::InvalidArn(InvalidArn::builder().build()), ());
        assert!(!is_execution_not_found(&invalid));
    }

    #[test]
    fn execution_arns_follow_the_region_partition() {
        assert_eq!(
            execution_arn("eu-west-1", "123456789012", "backfill", "nightly"),
            "arn:aws:states:eu-west-1:123456789012:execution:backfill:nightly"
        );
        assert_eq!(
            execution_arn("cn-north-1", "123456789012", "backfill", "nightly"),
            "arn:aws-cn:states:cn-north-1:123456789012:execution:backfill:nightly"
        );
    }

    #[test]
    fn dates_are_rfc3339() {
        let date = DateTime::from_secs(1_717_200_000);
        assert_eq!(format_date(&date).unwrap(), "2024-06-01T00:00:00Z");
    }
}
