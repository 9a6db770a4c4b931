//! `opencga_study_group`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::client::{params, OpencgaClient, QueryParams};
use crate::error::Result;
use crate::resources::{require, ManagedResource};
use crate::state::ResourceState;
use crate::types::StudyGroup;

/// Groups have no server identifier usable for reads; they are looked up by
/// study and name, so every group shares this placeholder id.
pub const GROUP_PLACEHOLDER_ID: &str = "0";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyGroupConfig {
    pub study: String,
    pub name: String,
}

pub struct StudyGroupResource;

impl ManagedResource for StudyGroupResource {
    type Config = StudyGroupConfig;

    const TYPE_NAME: &'static str = "opencga_study_group";

    fn create(client: &OpencgaClient, config: &StudyGroupConfig) -> Result<ResourceState> {
        let study = require(Some(config.study.as_str()), "study is required for a study group")?;
        let path = format!("studies/{study}/groups/create");
        let payload = json!({ "id": config.name, "name": config.name });
        let response = client.post(&path, &QueryParams::new(), &payload)?;
        let group: StudyGroup = response.decode_first(&path, "study group")?;
        info!(group = %group.id, study, "created study group");

        Self::read(client, GROUP_PLACEHOLDER_ID, config)
    }

    fn read(client: &OpencgaClient, _id: &str, config: &StudyGroupConfig) -> Result<ResourceState> {
        let study = require(Some(config.study.as_str()), "study is required for a study group")?;
        let path = format!("studies/{study}/groups");
        let response = client.get(&path, &params([("name", config.name.as_str())]))?;
        let group: StudyGroup = response.decode_single(&path, "study group")?;
        Ok(ResourceState::new(GROUP_PLACEHOLDER_ID)
            .with("name", group.name)
            .with("study", study))
    }

    fn update(client: &OpencgaClient, id: &str, config: &StudyGroupConfig) -> Result<ResourceState> {
        Self::read(client, id, config)
    }

    fn in_sync(config: &StudyGroupConfig, state: &ResourceState) -> bool {
        state.get_str("name") == Some(config.name.as_str())
            && state.get_str("study") == Some(config.study.as_str())
    }
}
