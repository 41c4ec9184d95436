use std::path::{Path, PathBuf};

use autoschematic_core::{connector::ResourceAddress, error_util::invalid_addr_path};

/// Execution names are only unique within their state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SfnResourceAddress {
    Execution {
        region: String,
        state_machine: String,
        execution_name: String,
    },
}

impl ResourceAddress for SfnResourceAddress {
    fn to_path_buf(&self) -> PathBuf {
        match &self {
            SfnResourceAddress::Execution {
                region,
                state_machine,
                execution_name,
            } => PathBuf::from(format!(
                "aws/sfn/{}/state_machines/{}/executions/{}.ron",
                region, state_machine, execution_name
            )),
        }
    }

    fn from_path(path: &Path) -> Result<Self, anyhow::Error> {
        let path_components: Vec<&str> = path.components().map(|s| s.as_os_str().to_str().unwrap_or_default()).collect();

        match &path_components[..] {
            ["aws", "sfn", region, "state_machines", state_machine, "executions", name] if name.ends_with(".ron") => {
                let execution_name = name.strip_suffix(".ron").unwrap_or_default();
                if execution_name.is_empty() {
                    return Err(invalid_addr_path(path));
                }
                Ok(SfnResourceAddress::Execution {
                    region: region.to_string(),
                    state_machine: state_machine.to_string(),
                    execution_name: execution_name.to_string(),
                })
            }
            _ => Err(invalid_addr_path(path)),
        }
    }
}
