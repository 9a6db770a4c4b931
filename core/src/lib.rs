//! Client core for the OpenCGA biomedical data catalog REST API.
//!
//! # Overview
//! Maps declarative resource definitions (projects, studies, ACLs, groups,
//! variable sets, file links) onto OpenCGA calls: build query and payload,
//! issue the call, unwrap the response envelope, decode typed records and
//! project them into a flat [`ResourceState`].
//!
//! # Design
//! - `OpencgaClient` owns one session: base URL, token set by `login`, and a
//!   pluggable blocking `Transport` (`ureq` by default).
//! - Requests and responses are plain data, so everything up to the transport
//!   is testable without a network.
//! - The envelope decoder accepts a call only when it carries no error and
//!   exactly one response without an error message.
//! - `equivalence` holds the predicates callers use to suppress spurious
//!   updates.
//! - File-link creation is serialized by a lock owned by the client.

pub mod client;
pub mod config;
pub mod envelope;
pub mod equivalence;
pub mod error;
pub mod http;
pub mod logging;
pub mod lookups;
pub mod resources;
pub mod state;
pub mod types;

pub use client::{params, OpencgaClient, QueryParams};
pub use config::ProviderConfig;
pub use envelope::{Envelope, Response};
pub use error::{OpencgaError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use resources::ManagedResource;
pub use state::ResourceState;
pub use types::{File, Login, Organism, Project, Study, StudyAcl, StudyGroup, VariableSet};
