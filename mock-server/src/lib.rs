//! In-memory emulation of the OpenCGA REST surface used by the client.
//!
//! Every reply uses the OpenCGA envelope. Authentication failures are
//! reported in the envelope `error` with a 401; lookups and conflicts are
//! reported in the single response's `errorMsg` with a 200, the way OpenCGA
//! does for most catalog errors.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub mod catalog;

pub use catalog::Catalog;
use catalog::{
    template_permissions, CreateGroup, CreateProject, CreateStudy, CreateVariableSet, File, Group,
    LinkFile, LoginRequest, Project, Study, UpdateAcl, VariableSet, ALIAS_PREFIX,
};

pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "demo";

pub const REST_PREFIX: &str = "/opencga/webservices/rest/v1";

pub type Db = Arc<RwLock<Catalog>>;

type Params = Query<HashMap<String, String>>;
type Reply = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_user(DEFAULT_USER, DEFAULT_PASSWORD)
}

pub fn app_with_user(user: &str, password: &str) -> Router {
    let db: Db = Arc::new(RwLock::new(Catalog::with_user(user, password)));
    let api = Router::new()
        .route("/users/{user}/login", post(login))
        .route("/projects/create", post(create_project))
        .route("/projects/search", get(search_projects))
        .route("/projects/{id}/info", get(project_info))
        .route("/studies/create", post(create_study))
        .route("/studies/search", get(search_studies))
        .route("/studies/{id}/info", get(study_info))
        .route("/studies/acl/{member}/update", post(update_acl))
        .route("/studies/{id}/acl", get(study_acl))
        .route("/studies/{id}/groups", get(study_groups))
        .route("/studies/{id}/groups/create", post(create_group))
        .route("/variableset/create", post(create_variable_set))
        .route("/variableset/search", get(search_variable_sets))
        .route("/variableset/{id}/info", get(variable_set_info))
        .route("/files/link", post(link_file))
        .route("/files/{id}/info", get(file_info))
        .with_state(db);
    Router::new().nest(REST_PREFIX, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- envelope helpers ---

fn ok<T: Serialize>(id: &str, results: Vec<T>) -> Reply {
    let count = results.len();
    (
        StatusCode::OK,
        Json(json!({
            "error": "",
            "response": [{
                "id": id,
                "dbTime": 0,
                "numResults": count,
                "numTotalResults": count,
                "warningMsg": "",
                "errorMsg": "",
                "resultType": "",
                "result": results,
            }]
        })),
    )
}

fn response_error(id: &str, message: &str) -> Reply {
    (
        StatusCode::OK,
        Json(json!({
            "error": "",
            "response": [{"id": id, "errorMsg": message, "result": []}]
        })),
    )
}

fn envelope_error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"error": message, "response": []})))
}

fn authorize(catalog: &Catalog, params: &HashMap<String, String>) -> Result<(), Reply> {
    match params.get("sid") {
        Some(token) if catalog.has_session(token) => Ok(()),
        _ => Err(envelope_error(
            StatusCode::UNAUTHORIZED,
            "Invalid authentication token",
        )),
    }
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

// --- users ---

async fn login(
    State(db): State<Db>,
    Path(user): Path<String>,
    Json(input): Json<LoginRequest>,
) -> Reply {
    let mut catalog = db.write().await;
    if !catalog.check_password(&user, &input.password) {
        return envelope_error(StatusCode::UNAUTHORIZED, "Incorrect user or password.");
    }
    let token = catalog.open_session();
    debug!(user, "opened session");
    ok("login", vec![json!({ "token": token })])
}

// --- projects ---

async fn create_project(
    State(db): State<Db>,
    Query(params): Params,
    Json(input): Json<CreateProject>,
) -> Result<Reply, Reply> {
    let mut catalog = db.write().await;
    authorize(&catalog, &params)?;

    let alias = format!("{ALIAS_PREFIX}{}", input.alias);
    if catalog.projects.values().any(|p| p.alias == alias) {
        return Err(response_error("create", "Project alias already exists"));
    }
    let project = Project {
        id: catalog.next_id(),
        name: input.name,
        alias,
        description: input.description,
        organism: input.organism,
    };
    catalog.projects.insert(project.id, project.clone());
    Ok(ok("create", vec![project]))
}

async fn search_projects(State(db): State<Db>, Query(params): Params) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;
    let name = param(&params, "name");
    let found: Vec<Project> = catalog
        .projects
        .values()
        .filter(|p| name.is_none_or(|n| p.name == n))
        .cloned()
        .collect();
    Ok(ok("search", found))
}

async fn project_info(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;
    match catalog.find_project(&id) {
        Some(project) => Ok(ok("info", vec![project.clone()])),
        None => Err(response_error("info", &format!("Project {id} not found"))),
    }
}

// --- studies ---

async fn create_study(
    State(db): State<Db>,
    Query(params): Params,
    Json(input): Json<CreateStudy>,
) -> Result<Reply, Reply> {
    let mut catalog = db.write().await;
    authorize(&catalog, &params)?;

    let project_key = param(&params, "projectId").unwrap_or_default();
    let project_id = catalog
        .find_project(project_key)
        .map(|p| p.id)
        .ok_or_else(|| response_error("create", &format!("Project {project_key} not found")))?;
    let study = Study {
        id: catalog.next_id(),
        name: input.name,
        alias: input.alias,
        description: input.description,
        study_type: input.study_type,
        project_id,
    };
    catalog.studies.insert(study.id, study.clone());
    Ok(ok("create", vec![study]))
}

async fn search_studies(State(db): State<Db>, Query(params): Params) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;

    let project_key = param(&params, "project")
        .ok_or_else(|| response_error("search", "Missing project"))?;
    let project_id = catalog
        .find_project(project_key)
        .map(|p| p.id)
        .ok_or_else(|| response_error("search", &format!("Project {project_key} not found")))?;
    let name = param(&params, "name");
    let found: Vec<Study> = catalog
        .studies
        .values()
        .filter(|s| s.project_id == project_id)
        .filter(|s| name.is_none_or(|n| s.name == n || s.alias == n))
        .cloned()
        .collect();
    Ok(ok("search", found))
}

async fn study_info(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;
    match catalog.find_study(&id) {
        Some(study) => Ok(ok("info", vec![study.clone()])),
        None => Err(response_error("info", &format!("Study {id} not found"))),
    }
}

async fn update_acl(
    State(db): State<Db>,
    Path(member): Path<String>,
    Query(params): Params,
    Json(input): Json<UpdateAcl>,
) -> Result<Reply, Reply> {
    let mut catalog = db.write().await;
    authorize(&catalog, &params)?;

    if input.action != "SET" {
        return Err(response_error("update", "Only the SET action is supported"));
    }
    let study_id = catalog
        .find_study(&input.study)
        .map(|s| s.id)
        .ok_or_else(|| response_error("update", &format!("Study {} not found", input.study)))?;
    let permissions = match (input.template.as_deref(), input.permissions.as_deref()) {
        (Some(template), None) => template_permissions(template)
            .ok_or_else(|| response_error("update", &format!("Unknown template {template}")))?,
        (None, Some(list)) => list
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        _ => return Err(response_error("update", "Expected template or permissions")),
    };
    catalog
        .acls
        .insert((study_id, member.clone()), permissions.clone());
    Ok(ok("update", vec![json!({"member": member, "permissions": permissions})]))
}

async fn study_acl(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;

    let study_id = catalog
        .find_study(&id)
        .map(|s| s.id)
        .ok_or_else(|| response_error("acl", &format!("Study {id} not found")))?;
    let member = param(&params, "member");
    let found: Vec<Value> = catalog
        .acls
        .iter()
        .filter(|((sid, m), _)| *sid == study_id && member.is_none_or(|want| m == want))
        .map(|((_, m), perms)| json!({"member": m, "permissions": perms}))
        .collect();
    Ok(ok("acl", found))
}

async fn study_groups(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;

    let study_id = catalog
        .find_study(&id)
        .map(|s| s.id)
        .ok_or_else(|| response_error("groups", &format!("Study {id} not found")))?;
    let name = param(&params, "name");
    let found: Vec<Group> = catalog
        .groups
        .get(&study_id)
        .into_iter()
        .flatten()
        .filter(|g| name.is_none_or(|n| g.name == n))
        .cloned()
        .collect();
    Ok(ok("groups", found))
}

async fn create_group(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
    Json(input): Json<CreateGroup>,
) -> Result<Reply, Reply> {
    let mut catalog = db.write().await;
    authorize(&catalog, &params)?;

    let study_id = catalog
        .find_study(&id)
        .map(|s| s.id)
        .ok_or_else(|| response_error("create", &format!("Study {id} not found")))?;
    let groups = catalog.groups.entry(study_id).or_default();
    if groups.iter().any(|g| g.id == input.id) {
        return Err(response_error("create", &format!("Group {} already exists", input.id)));
    }
    let group = Group {
        id: input.id,
        name: input.name,
        users: Vec::new(),
    };
    groups.push(group.clone());
    Ok(ok("create", vec![group]))
}

// --- variable sets ---

async fn create_variable_set(
    State(db): State<Db>,
    Query(params): Params,
    Json(input): Json<CreateVariableSet>,
) -> Result<Reply, Reply> {
    let mut catalog = db.write().await;
    authorize(&catalog, &params)?;

    let study_key = param(&params, "study").unwrap_or_default();
    let study_id = catalog
        .find_study(study_key)
        .map(|s| s.id)
        .ok_or_else(|| response_error("create", &format!("Study {study_key} not found")))?;

    // OpenCGA keeps variables in a set; hand them back in name order.
    let mut variables = input.variables;
    variables.sort_by(|a, b| {
        let name = |v: &Value| v.get("name").and_then(Value::as_str).unwrap_or("").to_string();
        name(a).cmp(&name(b))
    });
    let variable_set = VariableSet {
        id: catalog.next_id(),
        name: input.name,
        description: input.description,
        unique: input.unique,
        variables,
        study_id,
    };
    catalog
        .variable_sets
        .insert(variable_set.id, variable_set.clone());
    Ok(ok("create", vec![variable_set]))
}

async fn search_variable_sets(
    State(db): State<Db>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;

    let study_key = param(&params, "study").unwrap_or_default();
    let study_id = catalog
        .find_study(study_key)
        .map(|s| s.id)
        .ok_or_else(|| response_error("search", &format!("Study {study_key} not found")))?;
    let without_variables = param(&params, "exclude") == Some("variables");
    let found: Vec<Value> = catalog
        .variable_sets
        .values()
        .filter(|vs| vs.study_id == study_id)
        .map(|vs| {
            let mut value = json!(vs);
            if without_variables {
                if let Some(obj) = value.as_object_mut() {
                    obj.remove("variables");
                }
            }
            value
        })
        .collect();
    Ok(ok("search", found))
}

async fn variable_set_info(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;
    match catalog.variable_sets.get(&id) {
        Some(vs) => Ok(ok("info", vec![vs.clone()])),
        None => Err(response_error("info", &format!("VariableSet {id} not found"))),
    }
}

// --- files ---

async fn link_file(
    State(db): State<Db>,
    Query(params): Params,
    Json(input): Json<LinkFile>,
) -> Result<Reply, Reply> {
    let mut catalog = db.write().await;
    authorize(&catalog, &params)?;

    let study_key = param(&params, "study").unwrap_or_default();
    let study_id = catalog
        .find_study(study_key)
        .map(|s| s.id)
        .ok_or_else(|| response_error("link", &format!("Study {study_key} not found")))?;

    let name = input.uri.rsplit('/').next().unwrap_or_default().to_string();
    let path = format!("{}{name}", input.path);
    if let Some(existing) = catalog
        .files
        .values()
        .find(|f| f.study_id == study_id && f.path == path)
    {
        return Ok(ok("link", vec![existing.clone()]));
    }
    let file = File {
        id: catalog.next_id(),
        name,
        file_type: param(&params, "type").unwrap_or("FILE").to_string(),
        format: "UNKNOWN".to_string(),
        bioformat: "NONE".to_string(),
        uri: format!("file://{}", input.uri),
        path,
        study_id,
    };
    catalog.files.insert(file.id, file.clone());
    Ok(ok("link", vec![file]))
}

async fn file_info(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Query(params): Params,
) -> Result<Reply, Reply> {
    let catalog = db.read().await;
    authorize(&catalog, &params)?;
    match catalog.files.get(&id) {
        Some(file) => Ok(ok("info", vec![file.clone()])),
        None => Err(response_error("info", &format!("File {id} not found"))),
    }
}
