use std::path::Path;

use anyhow::bail;
use autoschematic_core::{
    connector::{ConnectorOp, OpPlanOutput, ResourceAddress},
    connector_op,
    util::RON,
};

use super::SfnConnector;
use crate::{
    addr::SfnResourceAddress,
    op::SfnConnectorOp,
    resource::{Execution, validate_execution_name},
};

/// Executions are immutable and their names cannot be reused within a state machine,
/// so a changed definition is refused rather than planned.
pub fn plan_execution(
    state_machine: &str,
    execution_name: &str,
    current: Option<Execution>,
    desired: Option<Execution>,
) -> anyhow::Result<Option<SfnConnectorOp>> {
    if let Some(desired) = &desired {
        validate_execution_name(execution_name)?;
        desired.validate_for(state_machine)?;
    }

    match (current, desired) {
        (None, None) => Ok(None),
        (None, Some(new)) => Ok(Some(SfnConnectorOp::StartExecution(new))),
        (Some(_), None) => Ok(Some(SfnConnectorOp::ForgetExecution)),
        (Some(old), Some(new)) if old.clone().normalized() == new.clone().normalized() => Ok(None),
        (Some(_), Some(_)) => bail!(
            "Step Function Execution {} of {} has already started and cannot be changed; \
             file the new definition under a new execution name",
            execution_name,
            state_machine
        ),
    }
}

impl SfnConnector {
    pub async fn do_plan(
        &self,
        addr: &Path,
        current: Option<String>,
        desired: Option<String>,
    ) -> Result<Vec<OpPlanOutput>, anyhow::Error> {
        let addr = SfnResourceAddress::from_path(addr)?;

        match addr {
            SfnResourceAddress::Execution {
                region,
                state_machine,
                execution_name,
            } => {
                let current: Option<Execution> = current.map(|s| RON.from_str(&s)).transpose()?;
                let desired: Option<Execution> = desired.map(|s| RON.from_str(&s)).transpose()?;

                match plan_execution(&state_machine, &execution_name, current, desired)? {
                    None => Ok(vec![]),
                    Some(op @ SfnConnectorOp::StartExecution(_)) => Ok(vec![connector_op!(
                        op,
                        format!(
                            "Start Step Function Execution {} of {} in {}",
                            execution_name, state_machine, region
                        )
                    )]),
                    Some(op @ SfnConnectorOp::ForgetExecution) => Ok(vec![connector_op!(
                        op,
                        format!("Remove Step Function Execution {} from state", execution_name)
                    )]),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ValidationError;

    fn execution(input: &str) -> Execution {
        Execution {
            state_machine_arn: String::from("arn:aws:states:eu-west-1:123456789012:stateMachine:backfill"),
            input: Some(input.to_string()),
        }
    }

    #[test]
    fn execution_lifecycle() {
        assert_eq!(plan_execution("backfill", "run", None, None).unwrap(), None);
        assert_eq!(
            plan_execution("backfill", "run", None, Some(execution("{}"))).unwrap(),
            Some(SfnConnectorOp::StartExecution(execution("{}")))
        );
        assert_eq!(
            plan_execution("backfill", "run", Some(execution("{}")), None).unwrap(),
            Some(SfnConnectorOp::ForgetExecution)
        );
        assert_eq!(
            plan_execution(
                "backfill",
                "run",
                Some(execution("{\"a\":1}")),
                Some(execution("{ \"a\": 1 }"))
            )
            .unwrap(),
            None
        );
    }

    #[test]
    fn changed_execution_is_refused() {
        let err = plan_execution(
            "backfill",
            "run",
            Some(execution("{\"a\":1}")),
            Some(execution("{\"a\":2}")),
        )
        .unwrap_err();
        assert!(err.to_string().contains("new execution name"), "{err}");
    }

    #[test]
    fn invalid_names_fail_planning() {
        let err = plan_execution("backfill", "bad name", None, Some(execution("{}"))).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NameCharacter(' '))
        );

        // Forgetting never needs a valid name.
        assert!(plan_execution("backfill", "bad name", Some(execution("{}")), None).is_ok());
    }

    #[test]
    fn execution_must_belong_to_its_state_machine() {
        let err = plan_execution("reports", "run", None, Some(execution("{}"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::StateMachineMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn plan_rejects_invalid_input() {
        let connector = SfnConnector::default();
        let addr = Path::new("aws/sfn/eu-west-1/state_machines/backfill/executions/run.ron");

        let desired = String::from(
            r#"Execution(state_machine_arn: "arn:aws:states:eu-west-1:123456789012:stateMachine:backfill", input: Some("{"))"#,
        );
        assert!(connector.do_plan(addr, None, Some(desired)).await.is_err());
    }
}
