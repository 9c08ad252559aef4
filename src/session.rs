use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::api::{ClusterApi, KubeApi};

#[derive(Clone)]
pub struct ClusterSession {
    config_source: PathBuf,
    context: String,
    cluster_url: String,
    default_namespace: String,
    api: Arc<dyn ClusterApi>,
}

impl ClusterSession {
    pub async fn open(path: &Path, context: Option<&str>, page_size: u32) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("selected file does not exist: {}", path.display());
        }

        let kubeconfig = Kubeconfig::read_from(path)
            .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
        let active_context = context
            .map(str::to_string)
            .or_else(|| kubeconfig.current_context.clone())
            .unwrap_or_else(|| "-".to_string());
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            cluster: None,
            user: None,
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .with_context(|| format!("failed to load Kubernetes configuration from {}", path.display()))?;

        let cluster_url = config.cluster_url.to_string();
        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        info!(
            "opened session for context {active_context} at {cluster_url} from {}",
            path.display()
        );

        Ok(Self {
            config_source: path.to_path_buf(),
            context: active_context,
            cluster_url,
            default_namespace,
            api: Arc::new(KubeApi::new(client, page_size)),
        })
    }

    #[cfg(test)]
    pub fn with_api(config_source: impl Into<PathBuf>, api: Arc<dyn ClusterApi>) -> Self {
        Self {
            config_source: config_source.into(),
            context: "test".to_string(),
            cluster_url: "https://127.0.0.1:6443/".to_string(),
            default_namespace: "default".to_string(),
            api,
        }
    }

    pub fn config_source(&self) -> &Path {
        &self.config_source
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn cluster_url(&self) -> &str {
        &self.cluster_url
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub fn api(&self) -> &dyn ClusterApi {
        self.api.as_ref()
    }

    pub fn label(&self) -> String {
        source_label(&self.config_source)
    }
}

impl Debug for ClusterSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterSession")
            .field("config_source", &self.config_source)
            .field("context", &self.context)
            .field("cluster_url", &self.cluster_url)
            .field("default_namespace", &self.default_namespace)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ClusterSession {
    fn eq(&self, other: &Self) -> bool {
        self.config_source == other.config_source
            && self.context == other.context
            && Arc::ptr_eq(&self.api, &other.api)
    }
}

pub fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::{ClusterSession, source_label};
    use crate::api::fake::FakeApi;
    use std::path::Path;
    use std::sync::Arc;

    #[tokio::test]
    async fn opening_missing_file_is_a_configuration_error() {
        let error = ClusterSession::open(Path::new("/nonexistent/kubetree/config"), None, 500)
            .await
            .expect_err("missing file must fail");
        assert!(error.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn opening_unparseable_file_reports_the_path() {
        let path = std::env::temp_dir().join(format!("kubetree-bad-{}.yaml", std::process::id()));
        std::fs::write(&path, "clusters: [not: {valid").expect("write temp kubeconfig");

        let error = ClusterSession::open(&path, None, 500)
            .await
            .expect_err("garbage kubeconfig must fail");
        assert!(format!("{error:#}").contains("failed to read kubeconfig"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn label_is_the_file_name() {
        let session = ClusterSession::with_api("/home/me/.kube/staging", Arc::new(FakeApi::new()));
        assert_eq!(session.label(), "staging");
        assert_eq!(source_label(Path::new("/")), "/");
        assert!(format!("{session:?}").contains("staging"));
    }
}
