//! `opencga_study`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{params, OpencgaClient, QueryParams};
use crate::equivalence::project_reference_equivalent;
use crate::error::Result;
use crate::resources::{require, ManagedResource};
use crate::state::ResourceState;
use crate::types::Study;

pub(crate) const STUDY_INCLUDE: &str = "name,description,alias";

/// Study type sent on creation.
const STUDY_TYPE: &str = "CASE_CONTROL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Parent project id or alias.
    pub project: String,
    pub name: String,
    pub alias: String,
    pub description: String,
}

pub struct StudyResource;

impl StudyResource {
    pub(crate) fn read_params() -> QueryParams {
        params([("include", STUDY_INCLUDE), ("exclude", "groups")])
    }

    pub(crate) fn state(study: &Study) -> ResourceState {
        ResourceState::new(study.id.to_string())
            .with("name", study.name.as_str())
            .with("alias", study.alias.as_str())
            .with("description", study.description.as_str())
    }
}

impl ManagedResource for StudyResource {
    type Config = StudyConfig;

    const TYPE_NAME: &'static str = "opencga_study";

    fn create(client: &OpencgaClient, config: &StudyConfig) -> Result<ResourceState> {
        let project = require(Some(config.project.as_str()), "project is required to create a study")?;
        let path = "studies/create";
        let payload = json!({
            "name": config.name,
            "alias": config.alias,
            "description": config.description,
            "type": STUDY_TYPE,
        });
        let query = params([("projectId", project), ("exclude", "groups")]);
        let response = client.post(path, &query, &payload)?;
        let study: Study = response.decode_first(path, "study")?;
        info!(id = study.id, alias = %config.alias, project, "created study");

        Self::read(client, &study.id.to_string(), config)
    }

    fn read(client: &OpencgaClient, id: &str, _config: &StudyConfig) -> Result<ResourceState> {
        let path = format!("studies/{id}/info");
        let response = client.get(&path, &Self::read_params())?;
        let study: Study = response.decode_single(&path, "study")?;
        Ok(Self::state(&study).with_id(id))
    }

    /// Re-submits the create payload, then reads back the new record.
    fn update(client: &OpencgaClient, _id: &str, config: &StudyConfig) -> Result<ResourceState> {
        Self::create(client, config)
    }

    fn in_sync(config: &StudyConfig, state: &ResourceState) -> bool {
        // The project cannot be read back from a study.
        project_reference_equivalent(&config.project, "")
            && state.get_str("name") == Some(config.name.as_str())
            && state.get_str("alias") == Some(config.alias.as_str())
            && state.get_str("description") == Some(config.description.as_str())
    }
}
