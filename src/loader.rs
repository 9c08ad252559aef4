use chrono::{DateTime, Utc};
use kube::ResourceExt;
use kube::core::DynamicObject;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::debug;

use crate::api::ApiError;
use crate::catalog::ResourceKind;
use crate::model::{Described, ListResult, Scope};
use crate::session::ClusterSession;

pub const GLOBAL_NAMESPACE: &str = "(Global)";
pub const MANIFEST_HEADER: &str = "Manifest:";

#[derive(Debug, Error)]
#[error("Cannot load {kind} due to error - {source}")]
pub struct LoadError {
    pub kind: String,
    pub scope: Scope,
    pub source: ApiError,
}

#[derive(Debug, Default)]
pub struct InFlight {
    lists: HashSet<(&'static str, Scope)>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair busy; false means a list is already outstanding and the
    /// request must be dropped.
    pub fn try_begin(&mut self, code: &'static str, scope: &Scope) -> bool {
        self.lists.insert((code, scope.clone()))
    }

    pub fn finish(&mut self, code: &'static str, scope: &Scope) {
        self.lists.remove(&(code, scope.clone()));
    }

    pub fn is_busy(&self, code: &'static str, scope: &Scope) -> bool {
        self.lists.contains(&(code, scope.clone()))
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceLoader {
    kind: ResourceKind,
}

impl ResourceLoader {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub async fn list(
        &self,
        session: &ClusterSession,
        scope: &Scope,
    ) -> Result<ListResult, LoadError> {
        match session.api().list(&self.kind, scope.namespace()).await {
            Ok(items) => {
                debug!("listed {} {} in {scope}", items.len(), self.kind.plural);
                Ok(items)
            }
            Err(error) if error.is_not_found() && !self.kind.namespaced => {
                debug!("{} not served in {scope}, treating as empty", self.kind.plural);
                Ok(Vec::new())
            }
            Err(source) => Err(LoadError {
                kind: self.kind.display_name.to_lowercase(),
                scope: scope.clone(),
                source,
            }),
        }
    }

    pub async fn describe(
        &self,
        session: &ClusterSession,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Described {
        let name = object.name_any();
        let namespace = namespace
            .map(str::to_string)
            .or_else(|| object.namespace())
            .filter(|_| self.kind.namespaced);
        match session
            .api()
            .get(&self.kind, namespace.as_deref(), &name)
            .await
        {
            Ok(fetched) => {
                // a namespace is shown as living in itself
                let header_namespace = if self.kind.is_namespace() {
                    Some(name.as_str())
                } else {
                    namespace.as_deref()
                };
                Described {
                    title: format!("{} - {}", self.kind.title_label(), fetched.name_any()),
                    body: render_document(&self.kind, header_namespace, &fetched, Utc::now()),
                }
            }
            Err(error) => {
                let error = anyhow::Error::new(error).context(format!(
                    "failed to fetch {} {}",
                    self.kind.title_label(),
                    qualified_name(namespace.as_deref(), &name)
                ));
                Described::error(format!("{error:#}"))
            }
        }
    }
}

fn qualified_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(namespace) => format!("{namespace}/{name}"),
        None => name.to_string(),
    }
}

pub fn render_document(
    kind: &ResourceKind,
    namespace: Option<&str>,
    object: &DynamicObject,
    now: DateTime<Utc>,
) -> String {
    let api_version = object
        .types
        .as_ref()
        .map(|types| types.api_version.clone())
        .unwrap_or_else(|| kind.api_version());
    let object_kind = object
        .types
        .as_ref()
        .map(|types| types.kind.clone())
        .unwrap_or_else(|| kind.kind.to_string());
    let metadata = &object.metadata;

    let mut out = String::new();
    let _ = writeln!(out, "Namespace: {}", namespace.unwrap_or(GLOBAL_NAMESPACE));
    let _ = writeln!(out, "Object Type: {object_kind} ({api_version})");
    let _ = writeln!(out, "API Version: {api_version}");
    let _ = writeln!(out, "Kind: {object_kind}");
    let _ = writeln!(out, "Metadata:");
    let _ = writeln!(out, "- Name: {}", object.name_any());
    if let Some(namespace) = metadata.namespace.as_deref() {
        let _ = writeln!(out, "- Namespace: {namespace}");
    }
    if let Some(uid) = metadata.uid.as_deref() {
        let _ = writeln!(out, "- UID: {uid}");
    }
    if let Some(created) = metadata.creation_timestamp.as_ref() {
        let _ = writeln!(
            out,
            "- Created: {} ({} ago)",
            created.0.to_rfc3339(),
            human_age(created.0, now)
        );
    }
    write_pairs(&mut out, "Labels", metadata.labels.as_ref());
    write_pairs(&mut out, "Annotations", metadata.annotations.as_ref());
    if let Some(owners) = metadata.owner_references.as_ref().filter(|owners| !owners.is_empty()) {
        let _ = writeln!(out, "- Owners:");
        for owner in owners {
            let _ = writeln!(out, "    {}/{}", owner.kind, owner.name);
        }
    }

    let _ = writeln!(out, "{MANIFEST_HEADER}");
    out.push_str(&manifest_yaml(kind, object));
    out
}

fn write_pairs(out: &mut String, title: &str, pairs: Option<&BTreeMap<String, String>>) {
    let Some(pairs) = pairs.filter(|pairs| !pairs.is_empty()) else {
        return;
    };
    let _ = writeln!(out, "- {title}:");
    for (key, value) in pairs {
        let _ = writeln!(out, "    {key}={value}");
    }
}

fn manifest_yaml(kind: &ResourceKind, object: &DynamicObject) -> String {
    let mut value = match serde_json::to_value(object) {
        Ok(value) => value,
        Err(error) => return format!("failed to format manifest: {error}\n"),
    };
    if kind.is_secret() {
        redact_secret(&mut value);
    }
    serde_yaml::to_string(&value).unwrap_or_else(|error| format!("failed to format manifest: {error}\n"))
}

fn redact_secret(value: &mut Value) {
    let Some(map) = value.as_object_mut() else {
        return;
    };
    for (field, encoded) in [("data", true), ("stringData", false)] {
        let Some(entries) = map.get_mut(field).and_then(Value::as_object_mut) else {
            continue;
        };
        for entry in entries.values_mut() {
            let bytes = match entry.as_str() {
                Some(text) if encoded => decoded_len(text),
                Some(text) => text.len(),
                None => 0,
            };
            *entry = Value::String(format!("<redacted: {bytes} bytes>"));
        }
    }
}

fn decoded_len(base64: &str) -> usize {
    let trimmed = base64.trim();
    let padding = trimmed.chars().rev().take_while(|ch| *ch == '=').count();
    (trimmed.len() / 4 * 3).saturating_sub(padding)
}

pub fn human_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_elapsed_seconds((now - since).num_seconds().max(0))
}

fn format_elapsed_seconds(seconds: i64) -> String {
    if seconds >= 86_400 {
        return format!("{}d", seconds / 86_400);
    }

    if seconds >= 3_600 {
        return format!("{}h", seconds / 3_600);
    }

    if seconds >= 60 {
        return format!("{}m", seconds / 60);
    }

    format!("{seconds}s")
}
