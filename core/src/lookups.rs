//! Read-only lookups over existing catalog entries.
//!
//! Unlike managed resources these never create anything. List lookups return
//! a synthetic identifier built from the filters so repeated reads with the
//! same filters map to the same state entry.

use tracing::debug;

use crate::client::{params, OpencgaClient};
use crate::error::{OpencgaError, Result};
use crate::resources::project::ProjectResource;
use crate::resources::study::StudyResource;
use crate::state::ResourceState;
use crate::types::{Project, Study, VariableSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub id_filter: Option<i64>,
    pub name_filter: Option<String>,
}

impl ProjectFilter {
    fn path(&self) -> String {
        match self.id_filter {
            Some(id) => format!("projects/{id}/info"),
            None => "projects/search".to_string(),
        }
    }

    /// `"{id}|{name}"`, with absent filters left empty.
    pub fn synthetic_id(&self) -> String {
        synthetic_id(self.id_filter, self.name_filter.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyFilter {
    pub id_filter: Option<i64>,
    pub alias_filter: Option<String>,
    /// Project id or alias; required unless `id_filter` is set.
    pub project: Option<String>,
}

impl StudyFilter {
    pub fn synthetic_id(&self) -> String {
        synthetic_id(self.id_filter, self.alias_filter.as_deref())
    }
}

/// Result of a list lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub id: String,
    pub items: Vec<T>,
}

/// Single project lookup. The first match wins.
pub fn project(client: &OpencgaClient, filter: &ProjectFilter) -> Result<ResourceState> {
    let mut query = ProjectResource::read_params();
    if let Some(name) = filter.name_filter.as_deref() {
        query.insert("name".to_string(), name.to_string());
    }
    let path = filter.path();
    let response = client.get(&path, &query)?;
    let project: Project = response.decode_first(&path, "project").map_err(|e| match e {
        OpencgaError::NotFound { path, .. } => OpencgaError::NotFound {
            path,
            entity: format!("project '{}'", filter.name_filter.as_deref().unwrap_or("")),
        },
        other => other,
    })?;
    Ok(ProjectResource::state(&project).with("id", project.id))
}

pub fn projects(client: &OpencgaClient, filter: &ProjectFilter) -> Result<Listing<Project>> {
    let mut query = ProjectResource::read_params();
    if let Some(name) = filter.name_filter.as_deref() {
        query.insert("name".to_string(), name.to_string());
    }
    let response = client.get(&filter.path(), &query)?;
    let items: Vec<Project> = response.decode_all("project")?;
    debug!(count = items.len(), "listed projects");
    Ok(Listing {
        id: filter.synthetic_id(),
        items,
    })
}

/// Studies by id, or by project with an optional alias filter. Fails before
/// any HTTP call when neither an id nor a project is given.
pub fn studies(client: &OpencgaClient, filter: &StudyFilter) -> Result<Listing<Study>> {
    let mut query = StudyResource::read_params();
    let path = match (filter.id_filter, filter.project.as_deref()) {
        (Some(id), _) => format!("studies/{id}/info"),
        (None, Some(project)) if !project.is_empty() => {
            query.insert("project".to_string(), project.to_string());
            "studies/search".to_string()
        }
        _ => {
            return Err(OpencgaError::Validation(
                "must supply project id or alias for study search".to_string(),
            ))
        }
    };
    if let Some(alias) = filter.alias_filter.as_deref() {
        query.insert("name".to_string(), alias.to_string());
    }

    let response = client.get(&path, &query)?;
    let items: Vec<Study> = response.decode_all("study")?;
    debug!(count = items.len(), "listed studies");
    Ok(Listing {
        id: filter.synthetic_id(),
        items,
    })
}

/// Variable sets of a study, without their variable definitions.
pub fn variable_sets(client: &OpencgaClient, study: &str) -> Result<Listing<VariableSet>> {
    if study.is_empty() {
        return Err(OpencgaError::Validation(
            "study is required to list variable sets".to_string(),
        ));
    }
    let response = client.get(
        "variableset/search",
        &params([("study", study), ("exclude", "variables")]),
    )?;
    let items: Vec<VariableSet> = response.decode_all("variable set")?;
    Ok(Listing {
        id: study.to_string(),
        items,
    })
}

fn synthetic_id(id: Option<i64>, text: Option<&str>) -> String {
    format!(
        "{}|{}",
        id.map(|id| id.to_string()).unwrap_or_default(),
        text.unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{ok, RecordingTransport};
    use serde_json::json;

    fn client() -> (OpencgaClient, RecordingTransport) {
        let transport = RecordingTransport::default();
        (OpencgaClient::with_transport("http://h", transport.clone()), transport)
    }

    #[test]
    fn synthetic_ids() {
        let filter = ProjectFilter {
            id_filter: Some(4),
            name_filter: None,
        };
        assert_eq!(filter.synthetic_id(), "4|");
        let filter = StudyFilter {
            alias_filter: Some("s1".to_string()),
            ..StudyFilter::default()
        };
        assert_eq!(filter.synthetic_id(), "|s1");
    }

    #[test]
    fn study_search_without_project_or_id_makes_no_call() {
        let (client, transport) = client();
        let err = studies(&client, &StudyFilter::default()).unwrap_err();
        assert!(matches!(err, OpencgaError::Validation(_)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn study_search_by_project_and_alias() {
        let (client, transport) = client();
        transport.reply(ok(json!([{"id": 1, "alias": "s1"}, {"id": 2, "alias": "s1b"}])));
        let listing = studies(
            &client,
            &StudyFilter {
                id_filter: None,
                alias_filter: Some("s1".to_string()),
                project: Some("null@p1".to_string()),
            },
        )
        .unwrap();
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.id, "|s1");

        let sent = transport.sent();
        assert!(sent[0].url.ends_with("/studies/search"));
        assert_eq!(sent[0].query_param("project"), Some("null@p1"));
        assert_eq!(sent[0].query_param("name"), Some("s1"));
    }

    #[test]
    fn study_by_id_skips_project() {
        let (client, transport) = client();
        transport.reply(ok(json!([{"id": 7}])));
        studies(
            &client,
            &StudyFilter {
                id_filter: Some(7),
                ..StudyFilter::default()
            },
        )
        .unwrap();
        let sent = transport.sent();
        assert!(sent[0].url.ends_with("/studies/7/info"));
        assert_eq!(sent[0].query_param("project"), None);
    }

    #[test]
    fn project_lookup_takes_first_match() {
        let (client, transport) = client();
        transport.reply(ok(json!([
            {"id": 1, "name": "P", "alias": "null@p1"},
            {"id": 2, "name": "P", "alias": "null@p2"}
        ])));
        let state = project(
            &client,
            &ProjectFilter {
                id_filter: None,
                name_filter: Some("P".to_string()),
            },
        )
        .unwrap();
        assert_eq!(state.id, "1");
        assert_eq!(state.get_i64("id"), Some(1));
        assert_eq!(transport.sent()[0].query_param("name"), Some("P"));
    }

    #[test]
    fn project_lookup_not_found_names_filter() {
        let (client, transport) = client();
        transport.reply(ok(json!([])));
        let err = project(
            &client,
            &ProjectFilter {
                id_filter: None,
                name_filter: Some("ghost".to_string()),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("project 'ghost' not found"));
    }

    #[test]
    fn projects_by_id() {
        let (client, transport) = client();
        transport.reply(ok(json!([{"id": 4, "name": "P"}])));
        let listing = projects(
            &client,
            &ProjectFilter {
                id_filter: Some(4),
                name_filter: None,
            },
        )
        .unwrap();
        assert_eq!(listing.items[0].id, 4);
        assert!(transport.sent()[0].url.ends_with("/projects/4/info"));
    }

    #[test]
    fn variable_sets_exclude_definitions() {
        let (client, transport) = client();
        transport.reply(ok(json!([{"id": 3, "name": "vs", "unique": true}])));
        let listing = variable_sets(&client, "s1").unwrap();
        assert_eq!(listing.id, "s1");
        assert!(listing.items[0].variables.is_empty());
        assert_eq!(transport.sent()[0].query_param("exclude"), Some("variables"));
    }
}
