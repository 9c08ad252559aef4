use kube::ResourceExt;
use kube::core::DynamicObject;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::catalog::ResourceKind;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Scope {
    Cluster,
    Namespace(String),
}

impl Scope {
    pub fn for_kind(kind: &ResourceKind, namespace: Option<&str>) -> Self {
        match namespace {
            Some(namespace) if kind.namespaced => Self::Namespace(namespace.to_string()),
            _ => Self::Cluster,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Cluster => None,
            Self::Namespace(namespace) => Some(namespace),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Cluster => "cluster".to_string(),
            Self::Namespace(namespace) => namespace.clone(),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cluster => write!(f, "cluster"),
            Self::Namespace(namespace) => write!(f, "namespace {namespace}"),
        }
    }
}

/// Equal only when both handles share the same fetched instance.
#[derive(Debug, Clone)]
pub struct ObjectHandle(Arc<DynamicObject>);

impl ObjectHandle {
    pub fn new(object: DynamicObject) -> Self {
        Self(Arc::new(object))
    }

    pub fn name(&self) -> String {
        self.0.name_any()
    }

    pub fn object(&self) -> &DynamicObject {
        &self.0
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectHandle {}

pub type ListResult = Vec<DynamicObject>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Described {
    pub title: String,
    pub body: String,
}

impl Described {
    pub const ERROR_TITLE: &'static str = "Error";

    pub fn error(body: impl Into<String>) -> Self {
        Self {
            title: Self::ERROR_TITLE.to_string(),
            body: body.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.title == Self::ERROR_TITLE
    }
}
