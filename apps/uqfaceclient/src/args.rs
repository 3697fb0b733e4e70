//! Client command-line parsing.

/// Parsed client options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server port string, passed through to the connect attempt.
    pub port: String,
    /// Image to detect faces in; stdin when absent.
    pub detect_file: Option<String>,
    /// Replacement image; its presence selects the replace operation.
    pub replace_file: Option<String>,
    /// Where the result image goes; stdout when absent.
    pub output_file: Option<String>,
}

/// The command line did not match the mandated grammar.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid command line")]
pub struct UsageError;

impl ClientConfig {
    /// Parses `portnum [--replacefile F] [--outputfilename F] [--detectfile F]`
    /// (program name excluded). Each flag may appear at most once and needs
    /// a non-empty value.
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        let mut config = Self::default();

        match args.first() {
            Some(port) if !port.is_empty() => config.port = port.clone(),
            _ => return Err(UsageError),
        }

        let mut i = 1;
        while i < args.len() {
            let slot = match args[i].as_str() {
                "--replacefile" => &mut config.replace_file,
                "--outputfilename" => &mut config.output_file,
                "--detectfile" => &mut config.detect_file,
                _ => return Err(UsageError),
            };
            let value = match args.get(i + 1) {
                Some(value) if !value.is_empty() => value,
                _ => return Err(UsageError),
            };
            if slot.is_some() {
                return Err(UsageError);
            }
            *slot = Some(value.clone());
            i += 2;
        }

        Ok(config)
    }
}
