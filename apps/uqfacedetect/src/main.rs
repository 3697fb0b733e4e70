//! uqfacedetect entry point.
//!
//! Startup order matters and is part of the observable contract: the
//! reporter comes up first (so an early SIGHUP prints zeroed counters),
//! then the command line, scratch file, models and socket are checked in
//! that order, each with its own exit code. Once bound, the actual port is
//! announced on stderr and the acceptor runs forever.

mod engine;
mod paths;

use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use uqface_server::{
    spawn_reporter, FaceServer, PortSpec, ServerConfig, ServerOptions, Stats,
};
use uqface_vision::{FaceModels, Pipeline, ScratchCodec};

use engine::CvEngine;

const EXIT_USAGE: i32 = 19;
const EXIT_PORT: i32 = 10;
const EXIT_CASCADE: i32 = 14;
const EXIT_SCRATCH: i32 = 18;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let stats = Arc::new(Stats::new());
    let _reporter = spawn_reporter(Arc::clone(&stats));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Ok(config) = ServerConfig::parse(&args) else {
        eprintln!("Usage: ./uqfacedetect connectionlimit maxsize [portnumber]");
        exit(EXIT_USAGE);
    };

    let scratch = ScratchCodec::new(paths::SCRATCH_FILE);
    if scratch.preflight().is_err() {
        eprintln!("uqfacedetect: unable to open image file for writing");
        exit(EXIT_SCRATCH);
    }

    let models = match FaceModels::load(Path::new(paths::FACE_MODEL), Path::new(paths::EYE_MODEL))
    {
        Ok(models) => models,
        Err(e) => {
            tracing::debug!("model load failed: {e}");
            eprintln!("uqfacedetect: unable to load a cascade classifier");
            exit(EXIT_CASCADE);
        }
    };
    let cv_engine = Arc::new(CvEngine::new(Pipeline::new(models, scratch)));

    let (port, port_text) = resolve_port(&config.port);
    let options = ServerOptions {
        connection_limit: config.connection_limit,
        max_image_bytes: config.max_image_bytes,
        prefix_response: PathBuf::from(paths::PREFIX_RESPONSE_FILE),
    };
    let server = match port {
        Some(port) => FaceServer::bind(port, cv_engine, Arc::clone(&stats), options).await,
        None => Err(std::io::Error::other("unresolvable port")),
    };
    let server = match server {
        Ok(server) => server,
        Err(e) => {
            tracing::debug!("bind failed: {e}");
            eprintln!("uqfacedetect: unable to listen on given port \"{port_text}\"");
            exit(EXIT_PORT);
        }
    };

    match server.local_addr() {
        Ok(addr) => {
            // The announced port is a protocol output, not a log line.
            eprintln!("{}", addr.port());
            tracing::info!(port = addr.port(), "uqfacedetect listening");
        }
        Err(_) => {
            eprintln!("uqfacedetect: unable to listen on given port \"{port_text}\"");
            exit(EXIT_PORT);
        }
    }

    server.run().await;
}

/// Resolves the configured port to a bindable number and the text used in
/// the failure message. The ephemeral case always reports as "0".
fn resolve_port(spec: &PortSpec) -> (Option<u16>, String) {
    match spec {
        PortSpec::Ephemeral => (Some(0), "0".to_string()),
        PortSpec::Literal(text) => (text.parse().ok(), text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_port_resolves_to_zero() {
        assert_eq!(resolve_port(&PortSpec::Ephemeral), (Some(0), "0".into()));
    }

    #[test]
    fn literal_port_parses() {
        let (port, text) = resolve_port(&PortSpec::Literal("8080".into()));
        assert_eq!(port, Some(8080));
        assert_eq!(text, "8080");
    }

    #[test]
    fn unparsable_port_is_reported_verbatim() {
        let (port, text) = resolve_port(&PortSpec::Literal("http".into()));
        assert_eq!(port, None);
        assert_eq!(text, "http");
    }

    #[test]
    fn out_of_range_port_does_not_resolve() {
        let (port, _) = resolve_port(&PortSpec::Literal("65536".into()));
        assert_eq!(port, None);
    }
}
