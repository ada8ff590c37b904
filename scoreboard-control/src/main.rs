use clap::Parser;
use log::*;
use scoreboard_common::logging::{self, LogSettings};
use std::path::PathBuf;
use tokio::{
    io::BufReader,
    signal,
    sync::mpsc,
    time::{Duration, Instant},
};

mod config;
mod console;
mod control;
mod host;
mod registry;
mod relay;
mod scheduler;

use config::Config;
use control::{Controller, Inputs};
use host::HeadlessHost;
use registry::Registry;
use relay::Relay;
use scheduler::TickScheduler;

const APP_NAME: &str = "scoreboard-control";
const COMMAND_QUEUE_LEN: usize = 64;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(long, short)]
    /// Port to listen on for display connections, overrides the config file
    port: Option<u16>,

    #[clap(long)]
    /// Milliseconds between clock updates, overrides the config file
    tick_ms: Option<u64>,

    #[clap(long, default_value = "1")]
    /// Number of scoreboards to create at startup
    instances: u32,

    #[clap(long)]
    /// Don't read operator commands from stdin
    no_console: bool,

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
        &["scoreboard_control", "scoreboard_common"],
        LogSettings {
            verbose: args.verbose,
            location: args.log_location.clone(),
            max_file_size: args.log_max_file_size,
            num_old_logs: args.num_old_logs,
        },
    )?;

    #[cfg(debug_assertions)]
    println!("Log path: {}", log_path.display());

    info!("Starting Scoreboard Control, logging to {}", log_path.display());

    match confy::get_configuration_file_path(APP_NAME, None) {
        Ok(path) => info!("Reading config file from {path:?}"),
        Err(e) => warn!("Could not locate the config file: {e}"),
    }

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

    if let Some(port) = args.port {
        config.relay.port = port;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.timing.tick_period_ms = tick_ms;
    }
    if config.timing.tick_period_ms == 0 {
        warn!("A tick period of 0 ms is not allowed, using 1 ms");
        config.timing.tick_period_ms = 1;
    }
    debug!("Config: {config:?}");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE_LEN);
        let (host_tx, host_events) = mpsc::unbounded_channel();
        let (attached_tx, attached) = mpsc::unbounded_channel();

        let relay = Relay::listen(config.relay.port, attached_tx);
        let host = HeadlessHost::new(host_tx.clone());
        let registry = Registry::new(config.template.clone(), Instant::now());
        let mut controller = Controller::new(registry, relay, host);

        for _ in 0..args.instances {
            controller.create(Instant::now());
        }

        if args.no_console {
            drop(command_tx);
        } else {
            tokio::spawn(console::console_loop(
                BufReader::new(tokio::io::stdin()),
                command_tx,
                host_tx,
            ));
        }

        let scheduler = TickScheduler::new(Duration::from_millis(config.timing.tick_period_ms));
        let inputs = Inputs {
            commands,
            host_events,
            attached,
        };
        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Can't listen for Ctrl-C, stopping: {e}");
            }
        };

        let controller = controller.run_loop(inputs, scheduler, shutdown).await;
        info!(
            "Stopped with {} scoreboards live",
            controller.registry().list().len()
        );
    });

    Ok(())
}
