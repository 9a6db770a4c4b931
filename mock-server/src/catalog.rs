//! In-memory catalog backing the mock server.
//!
//! Records are defined independently of the client crate; integration tests
//! catch drift between the two.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix OpenCGA puts in front of project aliases.
pub const ALIAS_PREFIX: &str = "null@";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organism {
    #[serde(default)]
    pub scientific_name: String,
    #[serde(default)]
    pub taxonomy_code: i64,
    #[serde(default)]
    pub assembly: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub alias: String,
    pub description: String,
    pub organism: Organism,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Study {
    pub id: i64,
    pub name: String,
    pub alias: String,
    pub description: String,
    #[serde(rename = "type")]
    pub study_type: String,
    #[serde(skip)]
    pub project_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Acl {
    pub member: String,
    pub permissions: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub users: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariableSet {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub unique: bool,
    pub variables: Vec<Value>,
    #[serde(skip)]
    pub study_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub format: String,
    pub bioformat: String,
    pub uri: String,
    pub path: String,
    #[serde(skip)]
    pub study_id: i64,
}

// --- request payloads ---

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organism: Organism,
}

#[derive(Deserialize)]
pub struct CreateStudy {
    pub name: String,
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub study_type: String,
}

#[derive(Deserialize)]
pub struct UpdateAcl {
    pub action: String,
    pub study: String,
    pub template: Option<String>,
    pub permissions: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateGroup {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateVariableSet {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub variables: Vec<Value>,
}

#[derive(Deserialize)]
pub struct LinkFile {
    pub uri: String,
    pub path: String,
}

/// Whole catalog state.
#[derive(Debug, Default)]
pub struct Catalog {
    users: HashMap<String, String>,
    sessions: HashSet<String>,
    next_id: i64,
    pub projects: BTreeMap<i64, Project>,
    pub studies: BTreeMap<i64, Study>,
    pub acls: BTreeMap<(i64, String), Vec<String>>,
    pub groups: BTreeMap<i64, Vec<Group>>,
    pub variable_sets: BTreeMap<i64, VariableSet>,
    pub files: BTreeMap<i64, File>,
}

impl Catalog {
    pub fn with_user(user: &str, password: &str) -> Self {
        let mut catalog = Self::default();
        catalog.users.insert(user.to_string(), password.to_string());
        catalog
    }

    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn check_password(&self, user: &str, password: &str) -> bool {
        self.users.get(user).is_some_and(|p| p == password)
    }

    pub fn open_session(&mut self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone());
        token
    }

    pub fn has_session(&self, token: &str) -> bool {
        self.sessions.contains(token)
    }

    /// Resolve a project by numeric id or alias (with or without prefix).
    pub fn find_project(&self, key: &str) -> Option<&Project> {
        self.projects.values().find(|p| {
            p.id.to_string() == key
                || p.alias == key
                || p.alias.strip_prefix(ALIAS_PREFIX) == Some(key)
        })
    }

    /// Resolve a study by numeric id or alias.
    pub fn find_study(&self, key: &str) -> Option<&Study> {
        self.studies
            .values()
            .find(|s| s.id.to_string() == key || s.alias == key)
    }
}

/// Permissions a template expands to.
pub fn template_permissions(template: &str) -> Option<Vec<String>> {
    let perms: &[&str] = match template {
        "admin" => &[
            "VIEW_FILES",
            "WRITE_FILES",
            "DELETE_FILES",
            "VIEW_SAMPLES",
            "WRITE_SAMPLES",
            "DELETE_SAMPLES",
        ],
        "analyst" => &["VIEW_FILES", "WRITE_FILES", "VIEW_SAMPLES", "WRITE_SAMPLES"],
        "view_only" => &["VIEW_FILES", "VIEW_SAMPLES"],
        _ => return None,
    };
    Some(perms.iter().map(|p| p.to_string()).collect())
}
