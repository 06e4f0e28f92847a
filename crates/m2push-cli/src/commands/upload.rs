//! Handler for `m2push [REPOSITORY_ROOT REMOTE_URL USERNAME PASSWORD SNAPSHOTS_ONLY]`.

use m2push_core::config::{GlobalConfig, UploadParams};
use m2push_ops::ops_upload::{print_banner, report_summary, UploadRun};
use m2push_util::errors::M2PushError;
use m2push_util::progress::status_warn;
use miette::Result;

use crate::cli::Cli;

const USAGE: &str =
    "m2push <REPOSITORY_ROOT> <REMOTE_URL> <USERNAME> <PASSWORD> <SNAPSHOTS_ONLY>";

pub fn exec(cli: Cli) -> Result<()> {
    let params = match UploadParams::from_positional(&cli.positionals()) {
        Some(params) => params,
        None => {
            status_warn("Usage", USAGE);
            status_warn("Defaults", "using built-in defaults for all parameters");
            UploadParams::default()
        }
    };

    let mut config = GlobalConfig::load(cli.config.as_deref())?;
    if let Some(threads) = cli.threads {
        config.upload.max_threads = threads;
    }
    if let Some(capacity) = cli.queue_capacity {
        config.upload.queue_capacity = capacity;
    }
    if let Some(limit) = cli.max_file_size {
        config.upload.max_file_size = limit;
    }
    tracing::debug!("Upload parameters: {params:?}");

    print_banner(&params, &config);

    let mut run = UploadRun::with_http(params, config)?;
    let canceller = run.canceller();
    ctrlc::set_handler(move || {
        eprintln!("Interrupt received, shutting down...");
        canceller.cancel();
    })
    .map_err(|e| M2PushError::Generic {
        message: format!("Failed to install Ctrl-C handler: {e}"),
    })?;

    let summary = run.execute()?;
    report_summary(&summary);
    if !summary.clean_shutdown {
        status_warn("Shutdown", "some uploads were still running at exit");
    }

    if cli.strict && summary.has_failures() {
        return Err(M2PushError::UploadsFailed {
            count: summary.metrics.failed_uploads,
        }
        .into());
    }
    Ok(())
}
