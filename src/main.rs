use clap::Parser;
use tracing::{error, info};

use vpnmetrics::cli::Args;
use vpnmetrics::collector::Collector;
use vpnmetrics::config::CollectorConfig;
use vpnmetrics::system::logging;

fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match CollectorConfig::load(args.config.as_deref()) {
        Ok(mut config) => {
            if let Err(e) = args.apply(&mut config) {
                eprintln!("[{}] {}", e.code(), e);
                std::process::exit(2);
            }
            config
        }
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            std::process::exit(2);
        }
    };

    let _guard = logging::init_logging(&config.logging);

    let stdout_mode = args.stdout;
    let collector = Collector::new(config);

    if stdout_mode {
        match collector.collect() {
            Ok(document) => print!("{document}"),
            Err(e) => {
                error!("[{}] {}", e.code(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    match collector.run() {
        Ok(path) => info!(path = %path.display(), "Metrics published"),
        Err(e) => {
            // Missing sources never land here; only a failed publish does.
            error!("[{}] {}", e.code(), e);
            std::process::exit(1);
        }
    }
}
