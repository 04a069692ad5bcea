//! Request classification.
//!
//! # Responsibilities
//! - Store the relay prefix set, alias list and mount table
//! - Map a request path to exactly one dispatch target
//! - Rewrite relay paths before delegation
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Relay prefixes first, then aliases, then mounts in registration order
//! - Explicit `Rejected` rather than a silent default

use std::path::{Path, PathBuf};

use axum::http::{uri::PathAndQuery, Request, Uri};

use crate::config::{GatewayConfig, RelayPrefixConfig};
use crate::routing::matcher::PathPrefix;

/// A relay-bound prefix and its optional rewrite target.
#[derive(Debug, Clone)]
pub struct RelayRoute {
    prefix: PathPrefix,
    rewrite_to: Option<String>,
}

impl RelayRoute {
    pub fn new(prefix: impl Into<String>, rewrite_to: Option<String>) -> Self {
        Self {
            prefix: PathPrefix::new(prefix),
            rewrite_to,
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    /// Path handed to the relay for a request on `path`.
    pub fn rewrite_path(&self, path: &str) -> String {
        match &self.rewrite_to {
            Some(target) => self.prefix.replace(path, target).into_owned(),
            None => path.to_string(),
        }
    }

    /// Apply the rewrite to a request, leaving everything but the path alone.
    pub fn rewrite_request<B>(&self, mut req: Request<B>) -> Request<B> {
        if self.rewrite_to.is_none() {
            return req;
        }

        let path = self.rewrite_path(req.uri().path());
        let path_and_query = match req.uri().query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        let mut parts = req.uri().clone().into_parts();
        match PathAndQuery::try_from(path_and_query) {
            Ok(pq) => parts.path_and_query = Some(pq),
            Err(e) => {
                tracing::warn!(error = %e, "Relay rewrite produced an invalid path; forwarding unchanged");
                return req;
            }
        }
        if let Ok(uri) = Uri::from_parts(parts) {
            *req.uri_mut() = uri;
        }
        req
    }
}

impl From<&RelayPrefixConfig> for RelayRoute {
    fn from(config: &RelayPrefixConfig) -> Self {
        Self::new(config.prefix.clone(), config.rewrite_to.clone())
    }
}

/// A static asset mount.
#[derive(Debug, Clone)]
pub struct Mount {
    prefix: PathPrefix,
    root: PathBuf,
    indexable: bool,
}

impl Mount {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>, indexable: bool) -> Self {
        Self {
            prefix: PathPrefix::new(prefix),
            root: root.into(),
            indexable,
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn indexable(&self) -> bool {
        self.indexable
    }
}

/// A file served from an exact path.
#[derive(Debug, Clone)]
pub struct Alias {
    path: String,
    file: PathBuf,
}

impl Alias {
    pub fn new(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Where a static request is served from.
#[derive(Debug, Clone, Copy)]
pub enum StaticTarget<'a> {
    Alias(&'a Alias),
    Mount { mount: &'a Mount, remainder: &'a str },
}

/// Outcome of classifying a request path.
#[derive(Debug, Clone, Copy)]
pub enum Classification<'a> {
    Relay(&'a RelayRoute),
    Static(StaticTarget<'a>),
    Rejected,
}

impl Classification<'_> {
    pub fn is_relay(&self) -> bool {
        matches!(self, Classification::Relay(_))
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Relay(_) => "relay",
            Classification::Static(_) => "static",
            Classification::Rejected => "rejected",
        }
    }
}

/// Immutable classification tables compiled at startup.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    relay: Vec<RelayRoute>,
    aliases: Vec<Alias>,
    mounts: Vec<Mount>,
}

impl Classifier {
    pub fn new(relay: Vec<RelayRoute>, aliases: Vec<Alias>, mounts: Vec<Mount>) -> Self {
        Self {
            relay,
            aliases,
            mounts,
        }
    }

    /// Compile the tables from a validated configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let relay = config.relay.prefixes.iter().map(RelayRoute::from).collect();
        let aliases = config
            .aliases
            .iter()
            .map(|a| Alias::new(a.path.clone(), a.file.clone()))
            .collect();
        let mounts = config
            .mounts
            .iter()
            .map(|m| Mount::new(m.prefix.clone(), m.root.clone(), m.indexable))
            .collect();
        Self::new(relay, aliases, mounts)
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn relay_routes(&self) -> &[RelayRoute] {
        &self.relay
    }

    /// Classify a request path. Pure: depends only on `path` and the tables.
    pub fn classify<'a>(&'a self, path: &'a str) -> Classification<'a> {
        if let Some(route) = self.relay.iter().find(|r| r.prefix.matches(path)) {
            return Classification::Relay(route);
        }

        if let Some(alias) = self.aliases.iter().find(|a| a.path == path) {
            return Classification::Static(StaticTarget::Alias(alias));
        }

        for mount in &self.mounts {
            if let Some(remainder) = mount.prefix.strip(path) {
                return Classification::Static(StaticTarget::Mount { mount, remainder });
            }
        }

        Classification::Rejected
    }
}
