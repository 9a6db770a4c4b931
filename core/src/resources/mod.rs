//! Managed resources: create, read, update and delete over typed configs.
//!
//! # Design
//! Every resource follows the same lifecycle. `create` submits a payload,
//! takes the identifier from the echoed record and immediately re-reads so the
//! returned state comes from the server rather than the payload. `read`
//! requires exactly one result. `update` is resource specific: some re-submit
//! the create payload, the rest only refresh. `delete` never touches the
//! server; OpenCGA offers no destructive delete through this interface, so it
//! only drops local bookkeeping.
//!
//! `in_sync` tells the caller whether the freshly read state already matches
//! the config, using the predicates from [`crate::equivalence`].

use tracing::info;

use crate::client::OpencgaClient;
use crate::error::{OpencgaError, Result};
use crate::state::ResourceState;

pub mod file;
pub mod project;
pub mod study;
pub mod study_acl;
pub mod study_group;
pub mod variable_set;

pub use file::{FileLinkConfig, FileResource};
pub use project::{ProjectConfig, ProjectResource};
pub use study::{StudyConfig, StudyResource};
pub use study_acl::{AclTemplate, StudyAclConfig, StudyAclResource};
pub use study_group::{StudyGroupConfig, StudyGroupResource};
pub use variable_set::{VariableSetConfig, VariableSetResource};

pub trait ManagedResource {
    type Config;

    /// Name the resource is registered under, e.g. `opencga_project`.
    const TYPE_NAME: &'static str;

    fn create(client: &OpencgaClient, config: &Self::Config) -> Result<ResourceState>;

    fn read(client: &OpencgaClient, id: &str, config: &Self::Config) -> Result<ResourceState>;

    fn update(client: &OpencgaClient, id: &str, config: &Self::Config) -> Result<ResourceState>;

    fn delete(id: &str) {
        info!(resource = Self::TYPE_NAME, id, "delete is a no-op, dropping local state only");
    }

    /// True when `state` already reflects `config` and no update is needed.
    fn in_sync(config: &Self::Config, state: &ResourceState) -> bool;
}

/// Reject an empty required parameter before any HTTP call.
pub(crate) fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OpencgaError::Validation(message.to_string())),
    }
}
