//! Entity records decoded from OpenCGA results.
//!
//! # Design
//! These are not exhaustive models of the OpenCGA catalog; they carry the
//! fields the resource operations project into state. Every struct uses
//! `#[serde(default)]` so missing fields and unknown extras are tolerated,
//! while a present field of the wrong JSON type still fails the decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Organism block nested inside a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organism {
    pub scientific_name: String,
    pub taxonomy_code: i64,
    pub assembly: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub alias: String,
    pub organism: Organism,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Study {
    pub id: i64,
    pub name: String,
    pub alias: String,
    pub description: String,
}

/// Permissions granted to one member (user or group) on a study.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyAcl {
    pub member: String,
    pub permissions: Vec<String>,
}

/// A study user group such as `@members` or `@admins`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyGroup {
    pub id: String,
    pub name: String,
}

/// A variable set. `variables` is kept as opaque JSON; its schema belongs to
/// whoever declared the set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableSet {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub unique: bool,
    pub variables: Vec<Value>,
}

/// A catalog entry describing a file on a mounted filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub format: String,
    pub bioformat: String,
    pub uri: String,
    pub path: String,
}

/// Result of a login request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Login {
    pub token: String,
}
