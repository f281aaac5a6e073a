use clap::{Parser, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";

#[derive(Parser, Debug)]
#[command(name = "tabula-mcpd", version, about = "Tabula MCP daemon.")]
struct CliArgs {
    /// MotherDuck access token. When present the server attaches to the
    /// hosted database; otherwise it runs an in-memory database.
    #[arg(long, env = "MOTHERDUCK_TOKEN", hide_env_values = true)]
    motherduck_token: Option<String>,

    #[arg(
        long = "http",
        env = "TABULA_HTTP",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    http_serve: bool,

    #[arg(long, env = "TABULA_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone, Debug)]
pub struct TabulaConfig {
    pub motherduck_token: Option<String>,
    pub http_serve: bool,
    pub mcp_http_addr: SocketAddr,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl TabulaConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for TabulaConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        // A blank token means "unset": the credential only switches modes
        // when it carries a value.
        let motherduck_token = args.motherduck_token.filter(|value| !value.trim().is_empty());

        if let Some(token) = motherduck_token.as_deref()
            && token.chars().any(char::is_whitespace)
        {
            // Never echo the credential back.
            return Err(ConfigError::InvalidSetting {
                name: "MOTHERDUCK_TOKEN",
                value: "token must not contain whitespace".to_string(),
            });
        }

        Ok(Self {
            motherduck_token,
            http_serve: args.http_serve,
            mcp_http_addr: args.mcp_http_addr,
        })
    }
}
