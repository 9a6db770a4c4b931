//! `opencga_variableset`.
//!
//! Variable definitions travel as JSON text at the caller boundary and as a
//! JSON array on the wire. Drift detection uses the weak name-only comparison
//! from [`crate::equivalence`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::client::{params, OpencgaClient};
use crate::equivalence::{description_equivalent, variables_json_equivalent};
use crate::error::{OpencgaError, Result};
use crate::resources::{require, ManagedResource};
use crate::state::ResourceState;
use crate::types::VariableSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSetConfig {
    pub study: Option<String>,
    pub name: String,
    /// Only one instance may be attached to a record when true.
    pub unique: bool,
    pub description: String,
    /// JSON array of variable definitions.
    pub variables: String,
    #[serde(default = "default_check_description")]
    pub check_description: bool,
}

fn default_check_description() -> bool {
    true
}

impl Default for VariableSetConfig {
    fn default() -> Self {
        Self {
            study: None,
            name: String::new(),
            unique: false,
            description: String::new(),
            variables: "[]".to_string(),
            check_description: true,
        }
    }
}

impl VariableSetConfig {
    fn parsed_variables(&self) -> Result<Vec<Value>> {
        serde_json::from_str(&self.variables).map_err(|e| {
            OpencgaError::Validation(format!("unable to parse variables as a JSON list: {e}"))
        })
    }
}

pub struct VariableSetResource;

impl VariableSetResource {
    pub(crate) fn state(variable_set: &VariableSet) -> Result<ResourceState> {
        let variables = serde_json::to_string(&variable_set.variables)
            .map_err(|e| OpencgaError::Serialization(e.to_string()))?;
        Ok(ResourceState::new(variable_set.id.to_string())
            .with("name", variable_set.name.as_str())
            .with("description", variable_set.description.as_str())
            .with("unique", variable_set.unique)
            .with("variables", variables))
    }
}

impl ManagedResource for VariableSetResource {
    type Config = VariableSetConfig;

    const TYPE_NAME: &'static str = "opencga_variableset";

    fn create(client: &OpencgaClient, config: &VariableSetConfig) -> Result<ResourceState> {
        let variables = config.parsed_variables()?;
        let study = require(
            config.study.as_deref(),
            "study must be provided for variable set creation",
        )?;

        let path = "variableset/create";
        let payload = json!({
            "name": config.name,
            "description": config.description,
            "unique": config.unique,
            "variables": variables,
        });
        let response = client.post(path, &params([("study", study)]), &payload)?;
        let variable_set: VariableSet = response.decode_first(path, "variable set")?;
        info!(id = variable_set.id, name = %config.name, study, "created variable set");

        Self::read(client, &variable_set.id.to_string(), config)
    }

    fn read(client: &OpencgaClient, id: &str, _config: &VariableSetConfig) -> Result<ResourceState> {
        let path = format!("variableset/{id}/info");
        let response = client.get(&path, &params([]))?;
        let variable_set: VariableSet = response.decode_single(&path, "variable set")?;
        Ok(Self::state(&variable_set)?.with_id(id))
    }

    fn update(client: &OpencgaClient, id: &str, config: &VariableSetConfig) -> Result<ResourceState> {
        Self::read(client, id, config)
    }

    fn in_sync(config: &VariableSetConfig, state: &ResourceState) -> bool {
        state.get_str("name") == Some(config.name.as_str())
            && state.get_bool("unique") == Some(config.unique)
            && description_equivalent(
                config.check_description,
                &config.description,
                state.get_str("description").unwrap_or(""),
            )
            && variables_json_equivalent(&config.variables, state.get_str("variables").unwrap_or("[]"))
    }
}
