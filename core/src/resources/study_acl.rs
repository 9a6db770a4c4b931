//! `opencga_study_acl`: grants a member permissions on a study, either from a
//! preset template or from an explicit permission list.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::client::{params, OpencgaClient, QueryParams};
use crate::error::{OpencgaError, Result};
use crate::resources::{require, ManagedResource};
use crate::state::ResourceState;
use crate::types::StudyAcl;

/// Preset permission bundles understood by OpenCGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclTemplate {
    Admin,
    Analyst,
    ViewOnly,
}

impl AclTemplate {
    pub const ALL: [AclTemplate; 3] = [AclTemplate::Admin, AclTemplate::Analyst, AclTemplate::ViewOnly];

    pub fn as_str(&self) -> &'static str {
        match self {
            AclTemplate::Admin => "admin",
            AclTemplate::Analyst => "analyst",
            AclTemplate::ViewOnly => "view_only",
        }
    }
}

impl fmt::Display for AclTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclTemplate {
    type Err = OpencgaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                OpencgaError::Validation(format!(
                    "template must be one of admin, analyst, view_only, got: {s}"
                ))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyAclConfig {
    pub study: String,
    /// User name or group id.
    pub member: String,
    pub template: Option<String>,
    /// Comma separated OpenCGA permissions.
    pub permissions: Option<String>,
}

/// Exactly one of template or permissions, resolved.
enum Grant<'a> {
    Template(AclTemplate),
    Permissions(&'a str),
}

impl StudyAclConfig {
    fn grant(&self) -> Result<Grant<'_>> {
        let template = self.template.as_deref().filter(|t| !t.is_empty());
        let permissions = self.permissions.as_deref().filter(|p| !p.is_empty());
        match (template, permissions) {
            (None, None) => Err(OpencgaError::Validation(
                "must provide either template or permissions".to_string(),
            )),
            (Some(_), Some(_)) => Err(OpencgaError::Validation(
                "must provide either template or permissions but not both".to_string(),
            )),
            (Some(template), None) => Ok(Grant::Template(template.parse()?)),
            (None, Some(permissions)) => Ok(Grant::Permissions(permissions)),
        }
    }
}

pub struct StudyAclResource;

impl StudyAclResource {
    /// The server only reports expanded permissions, so the configured
    /// template is carried over from the config.
    fn state(config: &StudyAclConfig, acl: &StudyAcl) -> ResourceState {
        let state = ResourceState::new(acl.member.as_str())
            .with("member", acl.member.as_str())
            .with("study", config.study.as_str())
            .with("permissions", acl.permissions.join(","));
        match config.template.as_deref().filter(|t| !t.is_empty()) {
            Some(template) => state.with("template", template),
            None => state,
        }
    }
}

impl ManagedResource for StudyAclResource {
    type Config = StudyAclConfig;

    const TYPE_NAME: &'static str = "opencga_study_acl";

    fn create(client: &OpencgaClient, config: &StudyAclConfig) -> Result<ResourceState> {
        let study = require(Some(config.study.as_str()), "study is required for a study ACL")?;
        let member = require(Some(config.member.as_str()), "member is required for a study ACL")?;

        let mut payload = Map::new();
        payload.insert("action".to_string(), json!("SET"));
        payload.insert("study".to_string(), json!(study));
        match config.grant()? {
            Grant::Template(template) => {
                payload.insert("template".to_string(), json!(template.as_str()));
            }
            Grant::Permissions(permissions) => {
                payload.insert("permissions".to_string(), json!(permissions));
            }
        }

        let path = format!("studies/acl/{member}/update");
        let response = client.post(&path, &QueryParams::new(), &Value::Object(payload))?;
        let acl: StudyAcl = response.decode_first(&path, "study ACL")?;
        info!(member = %acl.member, study, "set study ACL");

        Self::read(client, &acl.member, config)
    }

    fn read(client: &OpencgaClient, _id: &str, config: &StudyAclConfig) -> Result<ResourceState> {
        let study = require(Some(config.study.as_str()), "study is required for a study ACL")?;
        let path = format!("studies/{study}/acl");
        let response = client.get(&path, &params([("member", config.member.as_str())]))?;
        let acl: StudyAcl = response.decode_single(&path, "study ACL")?;
        Ok(Self::state(config, &acl))
    }

    /// Re-runs the SET action.
    fn update(client: &OpencgaClient, _id: &str, config: &StudyAclConfig) -> Result<ResourceState> {
        Self::create(client, config)
    }

    fn in_sync(config: &StudyAclConfig, state: &ResourceState) -> bool {
        if state.get_str("member") != Some(config.member.as_str())
            || state.get_str("study") != Some(config.study.as_str())
        {
            return false;
        }
        // Template expansion happens server side; a template is compared by
        // name, an explicit list by its permission set.
        match config.grant() {
            Ok(Grant::Permissions(wanted)) => {
                permission_set(wanted) == permission_set(state.get_str("permissions").unwrap_or(""))
            }
            Ok(Grant::Template(template)) => state.get_str("template") == Some(template.as_str()),
            Err(_) => false,
        }
    }
}

fn permission_set(list: &str) -> BTreeSet<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
