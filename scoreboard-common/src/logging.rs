use log::LevelFilter;
#[cfg(debug_assertions)]
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::{
    append::rolling_file::{
        RollingFileAppender,
        policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::{error::Error, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub verbose: u8,
    /// Directory within which log files will be placed, default is platform dependent
    pub location: Option<PathBuf>,
    /// Max size in bytes that a log file is allowed to reach before being rolled over
    pub max_file_size: u64,
    pub num_old_logs: u32,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            verbose: 0,
            location: None,
            max_file_size: 5_000_000,
            num_old_logs: 3,
        }
    }
}

pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Sets up the rolling log file (plus the console in debug builds) and routes panics
/// into it. `targets` are the module prefixes that get the verbose level, everything
/// else only logs errors. Returns the path of the active log file.
pub fn init(
    app_name: &str,
    targets: &[&str],
    settings: LogSettings,
) -> Result<PathBuf, Box<dyn Error>> {
    let log_level = level_for(settings.verbose);

    let log_base_path = match settings.location {
        Some(path) => path,
        None => {
            let mut path = directories::BaseDirs::new()
                .ok_or("Could not find a directory to store logs")?
                .data_local_dir()
                .to_path_buf();
            path.push("scoreboard-logs");
            path
        }
    };
    let mut log_path = log_base_path.clone();
    let mut archived_log_path = log_base_path;
    log_path.push(format!("{app_name}-log.txt"));
    archived_log_path.push(format!("{app_name}-log-{{}}.txt.gz"));

    // Only log to the console in debug mode
    #[cfg(debug_assertions)]
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{d} {h({l:5})} {M}] {m}{n}")))
        .build();

    let roller = FixedWindowRoller::builder().build(
        archived_log_path
            .to_str()
            .ok_or("Log path is not valid unicode")?,
        settings.num_old_logs,
    )?;
    let file_policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(settings.max_file_size)),
        Box::new(roller),
    );
    let file_appender = RollingFileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new("[{d} {l:5} {M}] {m}{n}")))
        .build(&log_path, Box::new(file_policy))?;

    let root = Root::builder().appender("file_appender");
    #[cfg(debug_assertions)]
    let root = root.appender("console");
    let root = root.build(LevelFilter::Error);

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("file_appender", Box::new(file_appender)));

    #[cfg(debug_assertions)]
    let log_config = log_config.appender(Appender::builder().build("console", Box::new(console)));

    let log_config = targets
        .iter()
        .fold(log_config, |config, target| {
            config.logger(Logger::builder().build(*target, log_level))
        })
        .build(root)?;

    log4rs::init_config(log_config)?;
    log_panics::init();

    Ok(log_path)
}
