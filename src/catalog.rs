use kube::core::{ApiResource, GroupVersionKind};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ResourceKind {
    pub code: &'static str,
    pub display_name: &'static str,
    pub namespaced: bool,
    pub icon_key: &'static str,
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub section: &'static [&'static str],
}

impl ResourceKind {
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(self.group, self.version, self.kind);
        ApiResource::from_gvk_with_plural(&gvk, self.plural)
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn title_label(&self) -> String {
        let mut out = String::with_capacity(self.kind.len() + 4);
        let mut prev_lower = false;
        for ch in self.kind.chars() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push(' ');
            }
            prev_lower = ch.is_ascii_lowercase();
            out.push(ch);
        }
        out
    }

    pub fn is_namespace(&self) -> bool {
        self.code == NAMESPACE_CODE
    }

    pub fn is_secret(&self) -> bool {
        self.group.is_empty() && self.kind == "Secret"
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

pub const NAMESPACE_CODE: &str = "ns";

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CatalogError {
    #[error("resource code '{0}' is already registered")]
    DuplicateCode(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kinds: Vec<ResourceKind>,
    index: HashMap<&'static str, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ResourceKind) -> Result<(), CatalogError> {
        if self.index.contains_key(kind.code) {
            return Err(CatalogError::DuplicateCode(kind.code));
        }
        self.index.insert(kind.code, self.kinds.len());
        self.kinds.push(kind);
        Ok(())
    }

    pub fn lookup(&self, code: &str) -> Option<&ResourceKind> {
        self.index.get(code).map(|idx| &self.kinds[*idx])
    }

    pub fn all(&self) -> &[ResourceKind] {
        &self.kinds
    }

    pub fn cluster_scoped(&self) -> impl Iterator<Item = &ResourceKind> {
        self.kinds.iter().filter(|kind| !kind.namespaced)
    }

    pub fn namespaced(&self) -> impl Iterator<Item = &ResourceKind> {
        self.kinds.iter().filter(|kind| kind.namespaced)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn builtin(hidden: &[String]) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for kind in BUILTIN_KINDS {
            if hidden
                .iter()
                .any(|code| code.eq_ignore_ascii_case(kind.code))
            {
                continue;
            }
            catalog.register(*kind)?;
        }
        Ok(catalog)
    }
}

const fn cluster(
    code: &'static str,
    display_name: &'static str,
    group: &'static str,
    version: &'static str,
    kind: &'static str,
    plural: &'static str,
) -> ResourceKind {
    ResourceKind {
        code,
        display_name,
        namespaced: false,
        icon_key: code,
        group,
        version,
        kind,
        plural,
        section: &[],
    }
}

const fn namespaced(
    code: &'static str,
    display_name: &'static str,
    group: &'static str,
    version: &'static str,
    kind: &'static str,
    plural: &'static str,
    section: &'static [&'static str],
) -> ResourceKind {
    ResourceKind {
        code,
        display_name,
        namespaced: true,
        icon_key: code,
        group,
        version,
        kind,
        plural,
        section,
    }
}

const APPS: &[&str] = &["Applications"];
const AUTOSCALING: &[&str] = &["Auto Scaling"];
const BATCH: &[&str] = &["Batch"];
const EXTENSIONS: &[&str] = &["Extensions"];
const POLICY: &[&str] = &["Policy"];
const COORDINATION: &[&str] = &["Misc", "Coordination"];
const EVENTS: &[&str] = &["Misc", "Events"];
const NETWORKING: &[&str] = &["Misc", "Networking"];
const RBAC: &[&str] = &["Misc", "Role Based Access Control"];

pub const BUILTIN_KINDS: &[ResourceKind] = &[
    cluster(NAMESPACE_CODE, "Namespaces", "", "v1", "Namespace", "namespaces"),
    cluster("node", "Nodes", "", "v1", "Node", "nodes"),
    cluster(
        "cs",
        "Component Statuses",
        "",
        "v1",
        "ComponentStatus",
        "componentstatuses",
    ),
    cluster(
        "pv",
        "Persistent Volumes",
        "",
        "v1",
        "PersistentVolume",
        "persistentvolumes",
    ),
    cluster(
        "mutatingwebhookconfiguration",
        "Mutating Webhook Configurations",
        "admissionregistration.k8s.io",
        "v1",
        "MutatingWebhookConfiguration",
        "mutatingwebhookconfigurations",
    ),
    cluster(
        "validatingwebhookconfiguration",
        "Validating Webhook Configurations",
        "admissionregistration.k8s.io",
        "v1",
        "ValidatingWebhookConfiguration",
        "validatingwebhookconfigurations",
    ),
    cluster(
        "crds",
        "Custom Resource Definitions",
        "apiextensions.k8s.io",
        "v1",
        "CustomResourceDefinition",
        "customresourcedefinitions",
    ),
    cluster(
        "apiservice",
        "API Services",
        "apiregistration.k8s.io",
        "v1",
        "APIService",
        "apiservices",
    ),
    cluster(
        "csr",
        "Certificate Signing Requests",
        "certificates.k8s.io",
        "v1",
        "CertificateSigningRequest",
        "certificatesigningrequests",
    ),
    cluster(
        "psp",
        "Pod Security Policies",
        "policy",
        "v1beta1",
        "PodSecurityPolicy",
        "podsecuritypolicies",
    ),
    cluster(
        "clusterrolebinding",
        "Cluster Role Bindings",
        "rbac.authorization.k8s.io",
        "v1",
        "ClusterRoleBinding",
        "clusterrolebindings",
    ),
    cluster(
        "clusterrole",
        "Cluster Roles",
        "rbac.authorization.k8s.io",
        "v1",
        "ClusterRole",
        "clusterroles",
    ),
    cluster(
        "pc",
        "Priority Classes",
        "scheduling.k8s.io",
        "v1",
        "PriorityClass",
        "priorityclasses",
    ),
    cluster(
        "csidriver",
        "CSI Drivers",
        "storage.k8s.io",
        "v1",
        "CSIDriver",
        "csidrivers",
    ),
    cluster(
        "csinode",
        "CSI Nodes",
        "storage.k8s.io",
        "v1",
        "CSINode",
        "csinodes",
    ),
    cluster(
        "sc",
        "Storage Classes",
        "storage.k8s.io",
        "v1",
        "StorageClass",
        "storageclasses",
    ),
    cluster(
        "volumeattachment",
        "Volume Attachments",
        "storage.k8s.io",
        "v1",
        "VolumeAttachment",
        "volumeattachments",
    ),
    namespaced("pod", "Pods", "", "v1", "Pod", "pods", &[]),
    namespaced("svc", "Services", "", "v1", "Service", "services", &[]),
    namespaced("cm", "Config Maps", "", "v1", "ConfigMap", "configmaps", &[]),
    namespaced("ep", "Endpoints", "", "v1", "Endpoints", "endpoints", &[]),
    namespaced(
        "limits",
        "Limit Ranges",
        "",
        "v1",
        "LimitRange",
        "limitranges",
        &[],
    ),
    namespaced(
        "pvc",
        "Persistent Volume Claims",
        "",
        "v1",
        "PersistentVolumeClaim",
        "persistentvolumeclaims",
        &[],
    ),
    namespaced(
        "podtemplates",
        "Pod Templates",
        "",
        "v1",
        "PodTemplate",
        "podtemplates",
        &[],
    ),
    namespaced(
        "rc",
        "Replication Controllers",
        "",
        "v1",
        "ReplicationController",
        "replicationcontrollers",
        &[],
    ),
    namespaced("secrets", "Secrets", "", "v1", "Secret", "secrets", &[]),
    namespaced(
        "sa",
        "Service Accounts",
        "",
        "v1",
        "ServiceAccount",
        "serviceaccounts",
        &[],
    ),
    namespaced(
        "controllerrevisions",
        "Controller Revisions",
        "apps",
        "v1",
        "ControllerRevision",
        "controllerrevisions",
        APPS,
    ),
    namespaced(
        "ds",
        "Daemon Sets",
        "apps",
        "v1",
        "DaemonSet",
        "daemonsets",
        APPS,
    ),
    namespaced(
        "deploy",
        "Deployments",
        "apps",
        "v1",
        "Deployment",
        "deployments",
        APPS,
    ),
    namespaced(
        "rs",
        "Replica Sets",
        "apps",
        "v1",
        "ReplicaSet",
        "replicasets",
        APPS,
    ),
    namespaced(
        "sts",
        "Stateful Sets",
        "apps",
        "v1",
        "StatefulSet",
        "statefulsets",
        APPS,
    ),
    namespaced(
        "hpa",
        "Horizontal Pod Auto Scalers",
        "autoscaling",
        "v2",
        "HorizontalPodAutoscaler",
        "horizontalpodautoscalers",
        AUTOSCALING,
    ),
    namespaced("cj", "Cron Jobs", "batch", "v1", "CronJob", "cronjobs", BATCH),
    namespaced("jobs", "Jobs", "batch", "v1", "Job", "jobs", BATCH),
    namespaced(
        "ing",
        "Ingress",
        "networking.k8s.io",
        "v1",
        "Ingress",
        "ingresses",
        EXTENSIONS,
    ),
    namespaced(
        "pdb",
        "Pod Disruption Budgets",
        "policy",
        "v1",
        "PodDisruptionBudget",
        "poddisruptionbudgets",
        POLICY,
    ),
    namespaced(
        "lease",
        "Leases",
        "coordination.k8s.io",
        "v1",
        "Lease",
        "leases",
        COORDINATION,
    ),
    namespaced(
        "event",
        "Events",
        "events.k8s.io",
        "v1",
        "Event",
        "events",
        EVENTS,
    ),
    namespaced(
        "netpol",
        "Network Policies",
        "networking.k8s.io",
        "v1",
        "NetworkPolicy",
        "networkpolicies",
        NETWORKING,
    ),
    namespaced(
        "rolebinding",
        "Role Bindings",
        "rbac.authorization.k8s.io",
        "v1",
        "RoleBinding",
        "rolebindings",
        RBAC,
    ),
    namespaced(
        "role",
        "Roles",
        "rbac.authorization.k8s.io",
        "v1",
        "Role",
        "roles",
        RBAC,
    ),
];
