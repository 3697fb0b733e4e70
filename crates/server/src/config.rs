//! Server command-line configuration.

/// Largest accepted connection limit.
pub const MAX_CONNECTION_LIMIT: u32 = 10_000;

/// Where the server should listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    /// No port given, or a numeric zero: let the OS pick.
    Ephemeral,
    /// Bind the given decimal port string.
    Literal(String),
}

/// Immutable server configuration, validated from `argv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Concurrent-connection cap; 0 disables admission limiting.
    pub connection_limit: u32,
    /// Largest accepted image payload; a configured 0 is promoted to the
    /// maximum representable value ("no cap").
    pub max_image_bytes: u32,
    /// Listening port.
    pub port: PortSpec,
}

/// The command line did not match the mandated grammar.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid command line")]
pub struct UsageError;

impl ServerConfig {
    /// Parses `connectionlimit maxsize [portnumber]` (program name excluded).
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        if args.len() < 2 || args.len() > 3 {
            return Err(UsageError);
        }

        let connection_limit = parse_number(&args[0]).ok_or(UsageError)?;
        if connection_limit > u64::from(MAX_CONNECTION_LIMIT) {
            return Err(UsageError);
        }

        let max_size = parse_number(&args[1]).ok_or(UsageError)?;
        if max_size > u64::from(u32::MAX) {
            return Err(UsageError);
        }
        let max_image_bytes = if max_size == 0 {
            u32::MAX
        } else {
            max_size as u32
        };

        let port = match args.get(2) {
            None => PortSpec::Ephemeral,
            Some(arg) if arg.is_empty() => return Err(UsageError),
            Some(arg) => match parse_number(arg) {
                Some(0) => PortSpec::Ephemeral,
                _ => PortSpec::Literal(arg.clone()),
            },
        };

        Ok(Self {
            connection_limit: connection_limit as u32,
            max_image_bytes,
            port,
        })
    }
}

/// Accepts an optional leading `+` followed by one or more ASCII digits.
/// Values too large for u64 are rejected.
pub fn parse_number(text: &str) -> Option<u64> {
    let digits = text.strip_prefix('+').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn minimal_arguments() {
        let config = ServerConfig::parse(&args(&["10", "4096"])).unwrap();
        assert_eq!(config.connection_limit, 10);
        assert_eq!(config.max_image_bytes, 4096);
        assert_eq!(config.port, PortSpec::Ephemeral);
    }

    #[test]
    fn zero_maxsize_means_no_cap() {
        let config = ServerConfig::parse(&args(&["0", "0"])).unwrap();
        assert_eq!(config.connection_limit, 0);
        assert_eq!(config.max_image_bytes, u32::MAX);
    }

    #[test]
    fn explicit_port_is_kept_verbatim() {
        let config = ServerConfig::parse(&args(&["0", "0", "8080"])).unwrap();
        assert_eq!(config.port, PortSpec::Literal("8080".into()));
    }

    #[test]
    fn numeric_zero_port_is_ephemeral() {
        for port in ["0", "+0", "000"] {
            let config = ServerConfig::parse(&args(&["0", "0", port])).unwrap();
            assert_eq!(config.port, PortSpec::Ephemeral, "port {port:?}");
        }
    }

    #[test]
    fn non_numeric_port_is_kept_for_bind_to_reject() {
        let config = ServerConfig::parse(&args(&["0", "0", "http"])).unwrap();
        assert_eq!(config.port, PortSpec::Literal("http".into()));
    }

    #[test]
    fn empty_port_is_a_usage_error() {
        assert_eq!(ServerConfig::parse(&args(&["0", "0", ""])), Err(UsageError));
    }

    #[test]
    fn wrong_arity_is_a_usage_error() {
        assert_eq!(ServerConfig::parse(&args(&["0"])), Err(UsageError));
        assert_eq!(
            ServerConfig::parse(&args(&["0", "0", "0", "0"])),
            Err(UsageError)
        );
    }

    #[test]
    fn connection_limit_cap() {
        assert!(ServerConfig::parse(&args(&["10000", "0"])).is_ok());
        assert_eq!(
            ServerConfig::parse(&args(&["10001", "0"])),
            Err(UsageError)
        );
    }

    #[test]
    fn maxsize_must_fit_in_u32() {
        assert!(ServerConfig::parse(&args(&["0", "4294967295"])).is_ok());
        assert_eq!(
            ServerConfig::parse(&args(&["0", "4294967296"])),
            Err(UsageError)
        );
    }

    #[test]
    fn number_grammar() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("+42"), Some(42));
        assert_eq!(parse_number("007"), Some(7));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("+"), None);
        assert_eq!(parse_number("-1"), None);
        assert_eq!(parse_number("12a"), None);
        assert_eq!(parse_number("1 2"), None);
        assert_eq!(parse_number("99999999999999999999999"), None);
    }
}
