use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RuntimeConfig {
    pub source: Option<PathBuf>,
    pub kubeconfigs: Vec<PathBuf>,
    pub list_page_size: u32,
    pub hidden_kinds: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            source: None,
            kubeconfigs: Vec::new(),
            list_page_size: DEFAULT_PAGE_SIZE,
            hidden_kinds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct KubetreeConfigFile {
    #[serde(default, alias = "kubeconfig")]
    kubeconfigs: Vec<String>,
    #[serde(default, alias = "page_size")]
    list_page_size: Option<u32>,
    #[serde(default, alias = "hidden")]
    hidden_kinds: Vec<String>,
}

impl RuntimeConfig {
    pub fn load() -> Result<Self> {
        match discover_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config {}", path.display()))?;
        let mut config = Self::from_yaml(&raw)
            .with_context(|| format!("failed to parse runtime config {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let parsed: KubetreeConfigFile = if raw.trim().is_empty() {
            KubetreeConfigFile::default()
        } else {
            serde_yaml::from_str(raw)?
        };

        Ok(Self {
            source: None,
            kubeconfigs: parsed
                .kubeconfigs
                .iter()
                .map(|path| path.trim())
                .filter(|path| !path.is_empty())
                .map(expand_home)
                .collect(),
            list_page_size: parsed
                .list_page_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            hidden_kinds: parsed.hidden_kinds,
        })
    }

    pub fn startup_kubeconfigs(&self, cli_paths: &[PathBuf]) -> Vec<PathBuf> {
        if !cli_paths.is_empty() {
            return cli_paths.to_vec();
        }
        if !self.kubeconfigs.is_empty() {
            return self.kubeconfigs.clone();
        }
        default_kubeconfig().into_iter().collect()
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBETREE_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kubetree.yaml"),
        PathBuf::from("kubetree.yml"),
        PathBuf::from(".kubetree.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/kubetree/config.yaml"),
            PathBuf::from(&home).join(".config/kubetree/config.yml"),
            PathBuf::from(&home).join(".kubetree.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn default_kubeconfig() -> Option<PathBuf> {
    default_kubeconfig_from(
        std::env::var("KUBECONFIG").ok().as_deref(),
        std::env::var("HOME").ok().as_deref(),
    )
}

fn default_kubeconfig_from(kubeconfig: Option<&str>, home: Option<&str>) -> Option<PathBuf> {
    if let Some(first) = kubeconfig
        .and_then(|value| std::env::split_paths(value).next())
        .filter(|path| !path.as_os_str().is_empty())
    {
        return Some(first);
    }
    home.filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".kube").join("config"))
}

pub fn expand_home(path: &str) -> PathBuf {
    expand_home_with(path, std::env::var("HOME").ok().as_deref())
}

fn expand_home_with(path: &str, home: Option<&str>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ if path == "~" => home.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}
