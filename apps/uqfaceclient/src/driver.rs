//! The request/response driver.
//!
//! Preflights the named files, connects, assembles one request frame from
//! the input image(s), and dispatches the server's answer to the chosen
//! output. Every failure maps to one of the mandated exit codes.

use std::io::Write;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::debug;

use uqface_protocol::{wire, Op};

use crate::args::ClientConfig;

/// Failures surfaced to the operator, each with its own exit code.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("uqfaceclient: unable to open the input file \"{0}\" for reading")]
    InputFile(String),

    #[error("uqfaceclient: unable to open the output file \"{0}\" for writing")]
    OutputFile(String),

    #[error("uqfaceclient: cannot connect to the server on port \"{0}\"")]
    Connect(String),

    #[error("uqfaceclient: unexpected communication error")]
    Communication,

    /// The server answered with an error frame; the payload is echoed
    /// byte for byte.
    #[error("uqfaceclient: received the following error message: \"{}\"", String::from_utf8_lossy(.0))]
    Server(Vec<u8>),
}

impl ClientError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputFile(_) => 13,
            Self::OutputFile(_) => 5,
            Self::Connect(_) => 19,
            Self::Communication => 9,
            Self::Server(_) => 11,
        }
    }

    /// Writes the operator-facing message to stderr.
    ///
    /// Server error payloads are echoed as raw bytes rather than through
    /// `Display`, which would mangle non-UTF-8 content.
    pub fn report(&self) {
        let mut stderr = std::io::stderr().lock();
        match self {
            Self::Server(payload) => {
                let _ = stderr
                    .write_all(b"uqfaceclient: received the following error message: \"");
                let _ = stderr.write_all(payload);
                let _ = stderr.write_all(b"\"\n");
            }
            other => {
                let _ = writeln!(stderr, "{other}");
            }
        }
        let _ = stderr.flush();
    }
}

/// Runs one request against the server.
pub async fn run(config: &ClientConfig) -> Result<(), ClientError> {
    preflight(config)?;
    let mut stream = connect(&config.port).await?;

    let primary = match &config.detect_file {
        Some(path) => tokio::fs::read(path)
            .await
            .map_err(|_| ClientError::InputFile(path.clone()))?,
        None => read_stdin().await?,
    };
    let replacement = match &config.replace_file {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .map_err(|_| ClientError::InputFile(path.clone()))?,
        ),
        None => None,
    };

    debug!(
        primary = primary.len(),
        replacement = replacement.as_ref().map(Vec::len),
        "sending request"
    );
    wire::write_request(&mut stream, &primary, replacement.as_deref())
        .await
        .map_err(|_| ClientError::Communication)?;

    let response = wire::read_response(&mut stream)
        .await
        .map_err(|_| ClientError::Communication)?;
    debug!(op = response.op, len = response.payload.len(), "response received");
    match Op::from_u8(response.op) {
        Some(Op::Image) => deliver(config, &response.payload).await,
        Some(Op::Error) => Err(ClientError::Server(response.payload)),
        _ => Err(ClientError::Communication),
    }
}

/// Verifies the named files before any network traffic, in the order the
/// operator listed them in the usage text: inputs first, then the output.
fn preflight(config: &ClientConfig) -> Result<(), ClientError> {
    for path in [&config.detect_file, &config.replace_file].into_iter().flatten() {
        std::fs::File::open(path).map_err(|_| ClientError::InputFile(path.clone()))?;
    }
    if let Some(path) = &config.output_file {
        std::fs::File::create(path).map_err(|_| ClientError::OutputFile(path.clone()))?;
    }
    Ok(())
}

async fn connect(port: &str) -> Result<TcpStream, ClientError> {
    let number: u16 = port
        .parse()
        .map_err(|_| ClientError::Connect(port.to_string()))?;
    TcpStream::connect(("localhost", number))
        .await
        .map_err(|_| ClientError::Connect(port.to_string()))
}

async fn read_stdin() -> Result<Vec<u8>, ClientError> {
    let mut image = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut image)
        .await
        .map_err(|_| ClientError::Communication)?;
    Ok(image)
}

/// Writes the result image to the output file or stdout.
async fn deliver(config: &ClientConfig, payload: &[u8]) -> Result<(), ClientError> {
    match &config.output_file {
        Some(path) => tokio::fs::write(path, payload)
            .await
            .map_err(|_| ClientError::OutputFile(path.clone())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(payload)
                .and_then(|()| stdout.flush())
                .map_err(|_| ClientError::Communication)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_contract() {
        assert_eq!(ClientError::InputFile("x".into()).exit_code(), 13);
        assert_eq!(ClientError::OutputFile("x".into()).exit_code(), 5);
        assert_eq!(ClientError::Connect("0".into()).exit_code(), 19);
        assert_eq!(ClientError::Communication.exit_code(), 9);
        assert_eq!(ClientError::Server(Vec::new()).exit_code(), 11);
    }

    #[test]
    fn messages_quote_the_offending_name() {
        assert_eq!(
            ClientError::InputFile("in.jpg".into()).to_string(),
            "uqfaceclient: unable to open the input file \"in.jpg\" for reading"
        );
        assert_eq!(
            ClientError::OutputFile("out.jpg".into()).to_string(),
            "uqfaceclient: unable to open the output file \"out.jpg\" for writing"
        );
        assert_eq!(
            ClientError::Connect("4000".into()).to_string(),
            "uqfaceclient: cannot connect to the server on port \"4000\""
        );
    }

    #[test]
    fn preflight_accepts_missing_optionals() {
        let config = ClientConfig {
            port: "4000".into(),
            ..Default::default()
        };
        assert!(preflight(&config).is_ok());
    }

    #[test]
    fn preflight_rejects_unreadable_input() {
        let config = ClientConfig {
            port: "4000".into(),
            detect_file: Some("/nonexistent/in.jpg".into()),
            ..Default::default()
        };
        assert!(matches!(
            preflight(&config),
            Err(ClientError::InputFile(_))
        ));
    }

    #[test]
    fn preflight_rejects_unwritable_output() {
        let config = ClientConfig {
            port: "4000".into(),
            output_file: Some("/nonexistent-dir/out.jpg".into()),
            ..Default::default()
        };
        assert!(matches!(
            preflight(&config),
            Err(ClientError::OutputFile(_))
        ));
    }

    #[tokio::test]
    async fn connect_failure_names_the_port() {
        // Nothing listens on a freshly bound-then-dropped port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect(&port.to_string()).await.unwrap_err();
        match err {
            ClientError::Connect(text) => assert_eq!(text, port.to_string()),
            other => panic!("expected connect error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_numeric_port_is_a_connect_error() {
        assert!(matches!(
            connect("not-a-port").await,
            Err(ClientError::Connect(_))
        ));
    }
}
