use autoschematic_core::{
    connector::{Resource, ResourceAddress},
    util::{PrettyConfig, RON},
};
use serde::{Deserialize, Serialize};

use super::addr::SfnResourceAddress;

pub const MAX_EXECUTION_NAME_LEN: usize = 80;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("execution name must be 1 to 80 characters long, got {0}")]
    NameLength(usize),
    #[error("execution name contains the forbidden character {0:?}")]
    NameCharacter(char),
    #[error("state_machine_arn is not an ARN: {0}")]
    InvalidArn(String),
    #[error("input is not a JSON document: {0}")]
    InvalidInput(String),
    #[error("state_machine_arn names state machine {found:?}, but the execution is filed under {expected:?}")]
    StateMachineMismatch { expected: String, found: String },
}

/// Rejects whitespace, brackets, wildcards, special and control characters.
pub fn validate_execution_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_EXECUTION_NAME_LEN {
        return Err(ValidationError::NameLength(len));
    }

    match name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || "<>{}[]?*\"#%\\^|~`$&,;:/".contains(*c))
    {
        Some(c) => Err(ValidationError::NameCharacter(c)),
        None => Ok(()),
    }
}

/// `arn:partition:service:region:account:resource`
pub fn is_arn(s: &str) -> bool {
    let parts: Vec<&str> = s.splitn(6, ':').collect();
    parts.len() == 6 && parts[0] == "arn" && !parts[1].is_empty() && !parts[2].is_empty() && !parts[5].is_empty()
}

/// The state machine name of `arn:partition:states:region:account:stateMachine:name`.
pub fn state_machine_name(arn: &str) -> Option<&str> {
    match arn.split(':').collect::<Vec<&str>>()[..] {
        ["arn", _, "states", _, _, "stateMachine", name] if !name.is_empty() => Some(name),
        _ => None,
    }
}

/// A single run of a state machine. The execution name is part of the address.
/// Executions cannot be changed once started.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Execution {
    pub state_machine_arn: String,
    #[serde(default)]
    pub input: Option<String>,
}

impl Execution {
    /// Re-serializes `input` compactly so formatting differences do not count as changes.
    pub fn normalized(mut self) -> Self {
        if let Some(input) = &self.input {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(input) {
                self.input = Some(value.to_string());
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_arn(&self.state_machine_arn) {
            return Err(ValidationError::InvalidArn(self.state_machine_arn.clone()));
        }
        if let Some(input) = &self.input {
            if let Err(e) = serde_json::from_str::<serde_json::Value>(input) {
                return Err(ValidationError::InvalidInput(e.to_string()));
            }
        }
        Ok(())
    }

    /// Validates the execution as filed under `state_machine`.
    pub fn validate_for(&self, state_machine: &str) -> Result<(), ValidationError> {
        self.validate()?;
        match state_machine_name(&self.state_machine_arn) {
            Some(name) if name == state_machine => Ok(()),
            found => Err(ValidationError::StateMachineMismatch {
                expected: state_machine.to_string(),
                found:    found.unwrap_or(&self.state_machine_arn).to_string(),
            }),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SfnResource {
    Execution(Execution),
}

impl SfnResource {
    pub fn normalized(self) -> Self {
        match self {
            SfnResource::Execution(execution) => SfnResource::Execution(execution.normalized()),
        }
    }
}

impl Resource for SfnResource {
    fn to_bytes(&self) -> Result<Vec<u8>, anyhow::Error> {
        let pretty_config = PrettyConfig::default().struct_names(true);
        match self {
            SfnResource::Execution(execution) => match RON.to_string_pretty(&execution, pretty_config) {
                Ok(s) => Ok(s.into()),
                Err(e) => Err(e.into()),
            },
        }
    }

    fn from_bytes(addr: &impl ResourceAddress, s: &[u8]) -> Result<Self, anyhow::Error>
    where
        Self: Sized,
    {
        let addr = SfnResourceAddress::from_path(&addr.to_path_buf())?;

        let s = str::from_utf8(s)?;
        match addr {
            SfnResourceAddress::Execution { .. } => Ok(SfnResource::Execution(RON.from_str(s)?)),
        }
    }
}
