//! `opencga_project`: create-only, never updated in place.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{params, OpencgaClient, QueryParams};
use crate::equivalence::{aliases_equivalent, normalize_alias};
use crate::error::Result;
use crate::resources::ManagedResource;
use crate::state::ResourceState;
use crate::types::Project;

/// Fields requested when reading projects.
pub(crate) const PROJECT_INCLUDE: &str = "name,description,alias,organism";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    /// Alias without the `null@` prefix; OpenCGA adds it.
    pub alias: String,
    pub description: String,
    pub scientific_name: String,
    pub taxonomy_code: i64,
    pub assembly: String,
}

pub struct ProjectResource;

impl ProjectResource {
    pub(crate) fn read_params() -> QueryParams {
        params([("include", PROJECT_INCLUDE), ("exclude", "studies")])
    }

    pub(crate) fn state(project: &Project) -> ResourceState {
        ResourceState::new(project.id.to_string())
            .with("name", project.name.as_str())
            .with("description", project.description.as_str())
            .with("alias", normalize_alias(&project.alias))
            .with("scientific_name", project.organism.scientific_name.as_str())
            .with("taxonomy_code", project.organism.taxonomy_code)
            .with("assembly", project.organism.assembly.as_str())
    }
}

impl ManagedResource for ProjectResource {
    type Config = ProjectConfig;

    const TYPE_NAME: &'static str = "opencga_project";

    fn create(client: &OpencgaClient, config: &ProjectConfig) -> Result<ResourceState> {
        let path = "projects/create";
        let payload = json!({
            "name": config.name,
            "alias": config.alias,
            "description": config.description,
            "organism": {
                "scientificName": config.scientific_name,
                "taxonomyCode": config.taxonomy_code,
                "assembly": config.assembly,
            },
        });
        let response = client.post(path, &QueryParams::new(), &payload)?;
        let project: Project = response.decode_first(path, "project")?;
        info!(id = project.id, alias = %config.alias, "created project");

        Self::read(client, &project.id.to_string(), config)
    }

    fn read(client: &OpencgaClient, id: &str, _config: &ProjectConfig) -> Result<ResourceState> {
        let path = format!("projects/{id}/info");
        let response = client.get(&path, &Self::read_params())?;
        let project: Project = response.decode_single(&path, "project")?;
        Ok(Self::state(&project).with_id(id))
    }

    /// Projects are immutable here; update only refreshes.
    fn update(client: &OpencgaClient, id: &str, config: &ProjectConfig) -> Result<ResourceState> {
        Self::read(client, id, config)
    }

    fn in_sync(config: &ProjectConfig, state: &ResourceState) -> bool {
        state.get_str("name") == Some(config.name.as_str())
            && state
                .get_str("alias")
                .is_some_and(|alias| aliases_equivalent(alias, &config.alias))
            && state.get_str("description") == Some(config.description.as_str())
            && state.get_str("scientific_name") == Some(config.scientific_name.as_str())
            && state.get_i64("taxonomy_code") == Some(config.taxonomy_code)
            && state.get_str("assembly") == Some(config.assembly.as_str())
    }
}
