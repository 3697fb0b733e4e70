//! uqfaceclient entry point.

mod args;
mod driver;

use std::process::exit;

use tracing_subscriber::EnvFilter;

use args::ClientConfig;

const EXIT_USAGE: i32 = 16;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Ok(config) = ClientConfig::parse(&argv) else {
        eprintln!(
            "Usage: ./uqfaceclient portnum [--replacefile filename] \
             [--outputfilename filename] [--detectfile filename]"
        );
        exit(EXIT_USAGE);
    };

    if let Err(e) = driver::run(&config).await {
        e.report();
        exit(e.exit_code());
    }
}
