//! Session setup shared by the commands

use anyhow::Context;
use clap::Args;
use pubflow::collect::ManifestCollector;
use pubflow::config::PublisherConfig;
use pubflow::context::CancelToken;
use pubflow::plugin::{CopyFilePlugin, PublishPlugin};
use pubflow::progress::ProgressSink;
use pubflow::publisher::Publisher;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments naming what to publish
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Manifest listing the items to publish (TOML or JSON)
    pub manifest: PathBuf,

    /// Publish description (e.g. "CL 123456 - comp fixes")
    #[arg(short, long)]
    pub description: Option<String>,

    /// Folder published files are copied into
    #[arg(long)]
    pub publish_folder: Option<PathBuf>,
}

/// Load config, register plugins and collect the manifest
pub fn open_session(
    args: &SessionArgs,
    config_path: Option<&Path>,
    validate_on_publish: Option<bool>,
    progress: &dyn ProgressSink,
) -> anyhow::Result<Publisher> {
    let mut config = PublisherConfig::load(config_path).context("Failed to load config")?;
    if let Some(validate) = validate_on_publish {
        config.validate_on_publish = validate;
    }

    let mut copy = CopyFilePlugin::new(&["*"]);
    if let Some(folder) = &args.publish_folder {
        copy = copy.with_publish_folder(folder);
    }
    let plugins: Vec<Arc<dyn PublishPlugin>> = vec![Arc::new(copy)];

    let mut publisher = Publisher::new(config, plugins)?;
    publisher.collect(&ManifestCollector::new(&args.manifest), progress)?;
    if let Some(description) = &args.description {
        publisher.set_summary_description(description);
    }
    Ok(publisher)
}

/// Run `work` on a blocking thread; Ctrl-C flags `cancel` while it runs
pub async fn with_ctrl_c<T, F>(cancel: CancelToken, work: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });
    let result = tokio::task::spawn_blocking(work).await;
    watcher.abort();
    Ok(result?)
}
