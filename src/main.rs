//! fskit command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use fskit::cli::{Args, Command, VersionsArgs, WatchArgs};
use fskit::directory::to_native_separators;
use fskit::version::{resolve_files, resolve_folders, Resolution};
use fskit::watcher::ChangeWatcher;

fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    tracing_subscriber::fmt()
        .with_max_level(args.output.log_level())
        .with_writer(std::io::stderr)
        .init();
    debug!("Parsed arguments: {args:?}");

    match &args.command {
        Command::Versions(versions) => run_versions(versions),
        Command::Watch(watch) => run_watch(watch),
        Command::Normalize { path } => {
            println!("{}", to_native_separators(path));
            Ok(())
        }
    }
}

fn run_versions(args: &VersionsArgs) -> Result<()> {
    let resolution = if args.files {
        resolve_files(&args.directory, &args.file_query())
    } else {
        resolve_folders(&args.directory, &args.folder_query())
    }
    .with_context(|| format!("Failed to resolve versions in {}", args.directory.display()))?;

    match resolution {
        Resolution::All(entries) => entries.iter().for_each(|entry| println!("{entry}")),
        Resolution::Found(entry) => println!("{entry}"),
        Resolution::NotFound => anyhow::bail!(
            "No {} version found in {}",
            args.select,
            args.directory.display()
        ),
    }
    Ok(())
}

fn run_watch(args: &WatchArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(async {
        let (watcher, mut events) = ChangeWatcher::with_channel(args.watch_config());
        watcher.start()?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => println!("{event}"),
                    None => break,
                },
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    info!("Interrupted");
                    break;
                }
            }
        }

        watcher.stop();
        Ok::<(), anyhow::Error>(())
    })
}
