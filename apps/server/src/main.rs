mod cli;

use abr_logger::Logger;
use abr_settings::Settings;
use anyhow::Context;
use clap::Parser;
use cli::Cli;
use std::io::Write;
use tracing::{debug, info};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = Logger::builder(env!("CARGO_PKG_NAME")).level(cli.log_level);
    if let Some(dir) = &cli.log_dir {
        logger = logger.path(dir);
    }
    let _log = logger.init()?;

    let settings = bootstrap(&cli).context("Critical: startup bootstrap failed")?;

    if cli.json {
        let mut out = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, &settings)
            .context("Failed to print resolved settings")?;
        writeln!(out)?;
    }

    Ok(())
}

fn bootstrap(cli: &Cli) -> anyhow::Result<Settings> {
    let mut builder = Settings::builder().base_dir(&cli.base_dir);
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(id) = &cli.platform {
        builder = builder.platform(id);
    }

    let settings = builder.load()?;

    for dir in settings.media.subdirectories() {
        debug!(path = %dir.display(), "Asset directory");
    }
    info!(
        media = %settings.media.root.display(),
        abr_schema = %settings.schemas.abr_schema.display(),
        backup = %settings.backup.path.display(),
        retention_secs = settings.backup.retention.as_secs(),
        download_missing = %settings.visassets.download_missing,
        "ABR server settings ready"
    );

    Ok(settings)
}
