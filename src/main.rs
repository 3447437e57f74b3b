use std::{env, path::PathBuf, process::ExitCode, sync::atomic::Ordering};

use clap::Parser;
use log::{error, info};

use poslv_odom::{
    config::{Config, SourceConfig},
    device,
    logging::LogSink,
    nodes::RateExecutor,
    odom::OdometryDriver,
    telemetry::TelemetryService,
};

const EXIT_DEVICE_FAILURE: u8 = 2;
const EXIT_CONFIG_FAILURE: u8 = 9;

#[derive(Parser, Debug)]
#[command(about = "Vehicle odometry driver for a GPS/inertial navigation unit")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/params.toml")]
    config: PathBuf,

    /// Replay a recorded capture instead of the configured source
    #[arg(short = 'f', long)]
    capture: Option<PathBuf>,

    /// Override the subscriber queue depth
    #[arg(short, long)]
    queue_depth: Option<usize>,
}

fn main() -> ExitCode {
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }
    pretty_env_logger::init();

    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_CONFIG_FAILURE);
        }
    };

    if let Some(path) = args.capture {
        config.source = SourceConfig::Capture { path };
    }
    if let Some(depth) = args.queue_depth {
        config.driver.queue_depth = depth.max(1);
    }

    let source = match device::open_source(&config.source) {
        Ok(source) => source,
        Err(e) => {
            error!("Cannot open navigation source: {e}");
            return ExitCode::from(EXIT_DEVICE_FAILURE);
        }
    };

    let ts = TelemetryService::default();

    let mut executor = RateExecutor::new(config.driver.rate_hz);

    let sink = match LogSink::new(&ts, config.driver.queue_depth) {
        Ok(sink) => sink,
        Err(e) => {
            error!("Cannot attach log sink: {e}");
            return ExitCode::FAILURE;
        }
    };

    let driver = match OdometryDriver::new(&ts, source, &config.driver) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Cannot set up odometry driver: {e}");
            return ExitCode::FAILURE;
        }
    };

    executor.add_node("odometry", Box::new(driver));
    executor.add_node("log_sink", Box::new(sink));

    let cancel = executor.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || {
        cancel.store(true, Ordering::Relaxed);
    }) {
        error!("Cannot install signal handler: {e}");
        return ExitCode::FAILURE;
    }

    info!("Odometry driver running at {} Hz", config.driver.rate_hz);

    if let Err(e) = executor.run_blocking() {
        error!("{e:#}");
        return ExitCode::FAILURE;
    }

    info!("Odometry driver stopped");

    ExitCode::SUCCESS
}
