use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use kz_record_overlay::core::GameStateChannel;
use kz_record_overlay::overlay::logging::init_logging;
use kz_record_overlay::overlay::{sink, Config, FeedHandle, HttpRecordsClient, RefreshLoop};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Use a custom config file instead of the one in the config directory.
    #[arg(short, long = "config")]
    config_path: Option<PathBuf>,

    /// Log this crate at DEBUG level. `RUST_LOG` takes precedence.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logging is not up yet, so config errors go to stderr
    let config = match Config::load(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("kz-record-overlay: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.logging.console, config.log_file_path(), args.debug);
    info!("KZ Record Overlay starting...");

    let records = match HttpRecordsClient::new(&config.records) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create records client");
            return ExitCode::FAILURE;
        }
    };

    let display_sink = match sink::from_config(&config) {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "Failed to create display sink");
            return ExitCode::FAILURE;
        }
    };

    let channel = GameStateChannel::new();
    let interval = config.refresh.interval();
    let _feed = FeedHandle::start(&config.feed, interval, channel.clone());

    // Runs until the process is terminated
    let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    RefreshLoop::new(channel, Arc::new(records), display_sink, interval).run(shutdown_rx);

    ExitCode::SUCCESS
}
