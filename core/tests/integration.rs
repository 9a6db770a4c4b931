//! Resource lifecycles against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, logs in over real HTTP with the
//! default `ureq` transport and drives every resource and lookup. Validates
//! that request building, envelope decoding and state projection line up
//! with the server's schema.

use std::sync::Arc;
use std::thread;

use opencga_core::equivalence::variables_json_equivalent;
use opencga_core::lookups::{self, ProjectFilter, StudyFilter};
use opencga_core::resources::{
    FileLinkConfig, FileResource, ProjectConfig, ProjectResource, StudyAclConfig, StudyAclResource,
    StudyConfig, StudyGroupConfig, StudyGroupResource, StudyResource, VariableSetConfig,
    VariableSetResource,
};
use opencga_core::{ManagedResource, OpencgaClient, OpencgaError, ProviderConfig};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn connect() -> OpencgaClient {
    let config = ProviderConfig {
        username: mock_server::DEFAULT_USER.to_string(),
        password: mock_server::DEFAULT_PASSWORD.to_string(),
        base_url: start_server(),
    };
    config.connect().unwrap()
}

fn project_config(alias: &str) -> ProjectConfig {
    ProjectConfig {
        name: "P".to_string(),
        alias: alias.to_string(),
        description: "d".to_string(),
        scientific_name: "Homo sapiens".to_string(),
        taxonomy_code: 9606,
        assembly: "GRCh38".to_string(),
    }
}

fn study_config(project: &str) -> StudyConfig {
    StudyConfig {
        project: project.to_string(),
        name: "Study one".to_string(),
        alias: "s1".to_string(),
        description: "first".to_string(),
    }
}

#[test]
fn login_failure_is_auth_error() {
    let client = OpencgaClient::new(&start_server());
    let err = client.login(mock_server::DEFAULT_USER, "wrong").unwrap_err();
    assert!(matches!(err, OpencgaError::Auth { .. }), "got {err:?}");
}

#[test]
fn calls_before_login_surface_api_error() {
    let client = OpencgaClient::new(&start_server());
    let err = lookups::projects(&client, &ProjectFilter::default()).unwrap_err();
    assert!(matches!(err, OpencgaError::Api { ref message, .. } if message == "Invalid authentication token"));
}

#[test]
fn project_alias_reads_back_prefixed() {
    let client = connect();

    let state = ProjectResource::create(&client, &project_config("p1")).unwrap();
    assert_eq!(state.get_str("alias"), Some("null@p1"));
    assert_eq!(state.get_i64("taxonomy_code"), Some(9606));
    assert!(ProjectResource::in_sync(&project_config("p1"), &state));

    let refreshed = ProjectResource::update(&client, &state.id, &project_config("p1")).unwrap();
    assert_eq!(refreshed, state);

    let found = lookups::project(
        &client,
        &ProjectFilter {
            id_filter: None,
            name_filter: Some("P".to_string()),
        },
    )
    .unwrap();
    assert_eq!(found.get_str("alias"), Some("null@p1"));

    ProjectResource::delete(&state.id);
    // Delete only drops local state; the project is still there.
    assert!(ProjectResource::read(&client, &state.id, &project_config("p1")).is_ok());
}

#[test]
fn study_search_requires_project_or_id() {
    let client = connect();
    let err = lookups::studies(&client, &StudyFilter::default()).unwrap_err();
    assert!(matches!(err, OpencgaError::Validation(_)));
}

#[test]
fn study_lifecycle_and_search() {
    let client = connect();
    let project = ProjectResource::create(&client, &project_config("p1")).unwrap();
    let study = StudyResource::create(&client, &study_config(&project.id)).unwrap();
    assert_eq!(study.get_str("alias"), Some("s1"));

    let listing = lookups::studies(
        &client,
        &StudyFilter {
            id_filter: None,
            alias_filter: Some("s1".to_string()),
            project: Some("null@p1".to_string()),
        },
    )
    .unwrap();
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].id.to_string(), study.id);
    assert_eq!(listing.id, "|s1");

    let missing = StudyResource::read(&client, "9999", &study_config(&project.id)).unwrap_err();
    assert!(matches!(missing, OpencgaError::Api { .. }));
}

#[test]
fn acl_group_variable_set_and_file() {
    let client = connect();
    let project = ProjectResource::create(&client, &project_config("p1")).unwrap();
    let study = StudyResource::create(&client, &study_config(&project.id)).unwrap();

    // group
    let group_config = StudyGroupConfig {
        study: study.id.clone(),
        name: "@analysts".to_string(),
    };
    let group = StudyGroupResource::create(&client, &group_config).unwrap();
    assert!(StudyGroupResource::in_sync(&group_config, &group));

    // acl, first from a template, then switched to explicit permissions
    let mut acl_config = StudyAclConfig {
        study: study.id.clone(),
        member: "@analysts".to_string(),
        template: Some("view_only".to_string()),
        permissions: None,
    };
    let acl = StudyAclResource::create(&client, &acl_config).unwrap();
    assert_eq!(acl.id, "@analysts");
    assert_eq!(acl.get_str("permissions"), Some("VIEW_FILES,VIEW_SAMPLES"));
    assert!(StudyAclResource::in_sync(&acl_config, &acl));

    acl_config.template = None;
    acl_config.permissions = Some("VIEW_FILES".to_string());
    assert!(!StudyAclResource::in_sync(&acl_config, &acl));
    let acl = StudyAclResource::update(&client, &acl.id, &acl_config).unwrap();
    assert!(StudyAclResource::in_sync(&acl_config, &acl));

    // variable set: server hands variables back reordered
    let vs_config = VariableSetConfig {
        study: Some(study.id.clone()),
        name: "phenotypes".to_string(),
        unique: true,
        description: "managed".to_string(),
        variables: r#"[{"name":"b","type":"TEXT"},{"name":"a","type":"TEXT"}]"#.to_string(),
        check_description: true,
    };
    let vs = VariableSetResource::create(&client, &vs_config).unwrap();
    let fetched = vs.get_str("variables").unwrap();
    assert_ne!(fetched, vs_config.variables);
    assert!(variables_json_equivalent(&vs_config.variables, fetched));
    assert!(VariableSetResource::in_sync(&vs_config, &vs));

    let listing = lookups::variable_sets(&client, &study.id).unwrap();
    assert_eq!(listing.items.len(), 1);
    assert!(listing.items[0].variables.is_empty());

    // file link
    let file_config = FileLinkConfig {
        study: Some(study.id.clone()),
        uri: "/genomes/sample/A00001.cram".to_string(),
        path: "sample/".to_string(),
    };
    let file = FileResource::create(&client, &file_config).unwrap();
    assert_eq!(file.get_str("uri"), Some("/genomes/sample/A00001.cram"));
    assert_eq!(file.get_str("path"), Some("sample/"));
    let relinked = FileResource::update(&client, &file.id, &file_config).unwrap();
    assert_eq!(relinked.id, file.id);
}

#[test]
fn concurrent_links_share_one_session() {
    let client = Arc::new(connect());
    let project = ProjectResource::create(&client, &project_config("p1")).unwrap();
    let study = StudyResource::create(&client, &study_config(&project.id)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let client = Arc::clone(&client);
            let config = FileLinkConfig {
                study: Some(study.id.clone()),
                uri: format!("/genomes/sample/A{i}.cram"),
                path: "sample/".to_string(),
            };
            thread::spawn(move || FileResource::create(&client, &config))
        })
        .collect();

    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
