use std::path::Path;
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use scout_core::{JobSettings, Platform};
use scout_engine::{
    search_link, ChannelNotifier, FetchSettings, FileStore, HttpPage, JobStore, PassOutcome,
    ReqwestFetcher, Scout, ScoutConfig,
};
use scout_logging::scout_info;

use super::cli::{Cli, Commands, StartArgs};
use super::effects::{export_items, MessagePump};
use super::{logging, persistence};

type CliScout = Scout<HttpPage, FileStore, ChannelNotifier>;

pub fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, logging::level_for(cli.verbose));

    match cli.command {
        Commands::InitConfig { path } => {
            let written = persistence::write_config(&path, &ScoutConfig::default())?;
            println!("Wrote {}", written.display());
            Ok(())
        }
        Commands::Export { platform } => export(&cli.data_dir, platform.map(Platform::from)),
        Commands::Start(args) => {
            let config = persistence::load_config(cli.config.as_deref())?;
            runtime()?.block_on(start(&cli.data_dir, config, args))
        }
        Commands::Resume { url } => {
            let config = persistence::load_config(cli.config.as_deref())?;
            runtime()?.block_on(resume(&cli.data_dir, config, &url))
        }
    }
}

/// Documents are parsed on the driving thread, so one thread is enough.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
}

async fn start(data_dir: &Path, config: ScoutConfig, args: StartArgs) -> Result<()> {
    let platform = Platform::from(args.platform);
    let settings = JobSettings::new(platform, args.pages)
        .with_delays(args.min_delay, args.max_delay)
        .validate()?;

    let url = match (args.target.url, args.target.keyword) {
        (Some(url), _) => url,
        (None, Some(keyword)) => {
            let profile = config.profile(platform).compile()?;
            search_link(&profile, keyword.trim(), usize::MAX)
                .context("failed to build the search url")?
        }
        (None, None) => bail!("either --keyword or --url is required"),
    };

    scout_info!("Starting {} job at {}", platform, url);
    let page = open_page(&url).await?;
    let (mut scout, pump) = scout_for(page, data_dir, config)?;
    scout.start(settings)?;
    drive(scout, pump).await
}

async fn resume(data_dir: &Path, config: ScoutConfig, url: &str) -> Result<()> {
    let page = open_page(url).await?;
    let (mut scout, pump) = scout_for(page, data_dir, config)?;
    if !scout.resume_if_mid_job().await? {
        bail!("no job in {} is waiting on a later page", data_dir.display());
    }
    drive(scout, pump).await
}

async fn open_page(url: &str) -> Result<HttpPage> {
    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default()));
    HttpPage::open(fetcher, url)
        .await
        .with_context(|| format!("failed to load {url}"))
}

fn scout_for(
    page: HttpPage,
    data_dir: &Path,
    config: ScoutConfig,
) -> Result<(CliScout, MessagePump)> {
    let (tx, rx) = mpsc::channel();
    let pump = MessagePump::spawn(rx, data_dir.to_path_buf());
    let scout = Scout::new(
        page,
        FileStore::in_dir(data_dir),
        ChannelNotifier::new(tx),
        config,
    )?;
    Ok((scout, pump))
}

async fn drive(mut scout: CliScout, pump: MessagePump) -> Result<()> {
    let outcome = scout.crawl().await;
    // Dropping the scout closes the channel so the pump can finish.
    drop(scout);
    let exported = pump.finish();

    match outcome? {
        PassOutcome::Finished { reason, items } => {
            println!("Finished ({reason:?}) with {} items", items.len());
            if let Some(summary) = exported {
                println!(
                    "Exported {} rows ({} duplicates dropped) to {}",
                    summary.rows,
                    summary.dropped_duplicates,
                    summary.path.display()
                );
            }
        }
        PassOutcome::HandedOff { page } => {
            println!("Navigation to page {page} was triggered; run `resume --url` on that page");
        }
        PassOutcome::Halted(reason) => bail!("job halted: {reason:?}"),
    }
    Ok(())
}

fn export(data_dir: &Path, platform: Option<Platform>) -> Result<()> {
    let store = JobStore::new(FileStore::in_dir(data_dir));
    let platform = match platform {
        Some(platform) => platform,
        None => store
            .load_job()?
            .map(|job| job.platform)
            .context("no stored job; pass --platform")?,
    };
    let items = store.load_items(platform)?;
    let summary = export_items(data_dir, &items, platform)?;
    println!(
        "Exported {} rows ({} duplicates dropped) to {}",
        summary.rows,
        summary.dropped_duplicates,
        summary.path.display()
    );
    Ok(())
}
