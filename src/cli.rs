use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kubetree",
    version,
    about = "Read-only Kubernetes resource tree browser for the terminal."
)]
pub struct CliArgs {
    /// Kubeconfig files to open, one view each
    #[arg(value_name = "KUBECONFIG")]
    pub kubeconfigs: Vec<PathBuf>,

    /// Use this context instead of the kubeconfig's current context
    #[arg(long)]
    pub context: Option<String>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Append logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
