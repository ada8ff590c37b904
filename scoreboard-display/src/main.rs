use clap::Parser;
use log::*;
use scoreboard_common::{
    InstanceId,
    logging::{self, LogSettings},
};
use std::path::PathBuf;
use tokio::{signal, time::Duration};

mod config;
mod network;
mod view;

use config::Config;
use view::ScoreboardView;

const APP_NAME: &str = "scoreboard-display";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(long)]
    /// Host running the control surface, overrides the config file
    host: Option<String>,

    #[clap(long, short)]
    /// Relay port of the control surface, overrides the config file
    port: Option<u16>,

    #[clap(long, short)]
    /// Scoreboard to display, overrides the config file
    instance: Option<u32>,

    #[clap(long)]
    /// Directory within which log files will be placed, default is platform dependent
    log_location: Option<PathBuf>,

    #[clap(long, default_value = "5000000")]
    /// Max size in bytes that a log file is allowed to reach before being rolled over
    log_max_file_size: u64,

    #[clap(long, default_value = "3")]
    /// Number of archived logs to keep
    num_old_logs: u32,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let log_path = logging::init(
        APP_NAME,
        &["scoreboard_display", "scoreboard_common"],
        LogSettings {
            verbose: args.verbose,
            location: args.log_location.clone(),
            max_file_size: args.log_max_file_size,
            num_old_logs: args.num_old_logs,
        },
    )?;

    info!("Starting Scoreboard Display, logging to {}", log_path.display());

    let mut config: Config = match confy::load(APP_NAME, None) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file, overwriting with default. Error: {e}");
            let config = Config::default();
            if let Err(e) = confy::store(APP_NAME, None, &config) {
                error!("Failed to write default config: {e}");
            }
            config
        }
    };

    if let Some(host) = args.host {
        config.relay_host = host;
    }
    if let Some(port) = args.port {
        config.relay_port = port;
    }
    if let Some(instance) = args.instance {
        config.instance = instance;
    }
    debug!("Config: {config:?}");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut view = ScoreboardView::new(InstanceId(config.instance), config.digits_dir);
    runtime.block_on(network::run_loop(
        config.relay_host,
        config.relay_port,
        Duration::from_millis(config.reconnect_delay_ms),
        &mut view,
        async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Can't listen for Ctrl-C, stopping: {e}");
            }
        },
    ));

    Ok(())
}
