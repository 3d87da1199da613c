//! Gateway settings
//!
//! Resolution priority for every value: command line, then environment
//! (both handled by clap), then the `[gateway]` section of the TOML config,
//! then compiled defaults.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;
use tlm_common::config::TomlConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_IGDB_BASE_URL: &str = "https://api.igdb.com/v4";
pub const DEFAULT_GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1";
pub const DEFAULT_BANGUMI_BASE_URL: &str = "https://api.bgm.tv";

/// Command-line arguments for tlm-gw
#[derive(Parser, Debug, Default)]
#[command(name = "tlm-gw")]
#[command(about = "Search gateway for the tier list maker")]
#[command(version)]
pub struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "TLM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on [default: 3000]
    #[arg(short, long, env = "TLM_GW_PORT")]
    pub port: Option<u16>,

    /// Address to bind [default: 127.0.0.1]
    #[arg(long, env = "TLM_GW_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "IGDB_CLIENT_ID", hide_env_values = true)]
    pub igdb_client_id: Option<String>,

    #[arg(long, env = "IGDB_CLIENT_SECRET", hide_env_values = true)]
    pub igdb_client_secret: Option<String>,

    #[arg(long, env = "GOOGLE_BOOKS_API_KEY", hide_env_values = true)]
    pub google_books_api_key: Option<String>,

    /// Optional; Bangumi search also works anonymously
    #[arg(long, env = "BANGUMI_ACCESS_TOKEN", hide_env_values = true)]
    pub bangumi_access_token: Option<String>,
}

/// Upstream API credentials
///
/// `Debug` only reports which credentials are present.
#[derive(Clone, Default)]
pub struct Credentials {
    pub igdb_client_id: Option<String>,
    pub igdb_client_secret: Option<String>,
    pub google_books_api_key: Option<String>,
    pub bangumi_access_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("igdb_client_id", &self.igdb_client_id.is_some())
            .field("igdb_client_secret", &self.igdb_client_secret.is_some())
            .field("google_books_api_key", &self.google_books_api_key.is_some())
            .field("bangumi_access_token", &self.bangumi_access_token.is_some())
            .finish()
    }
}

/// Upstream base URLs; overridable for tests and mirrors
#[derive(Debug, Clone)]
pub struct Upstreams {
    pub twitch_token_url: String,
    pub igdb_base_url: String,
    pub google_books_base_url: String,
    pub bangumi_base_url: String,
}

impl Default for Upstreams {
    fn default() -> Self {
        Self {
            twitch_token_url: DEFAULT_TWITCH_TOKEN_URL.to_string(),
            igdb_base_url: DEFAULT_IGDB_BASE_URL.to_string(),
            google_books_base_url: DEFAULT_GOOGLE_BOOKS_BASE_URL.to_string(),
            bangumi_base_url: DEFAULT_BANGUMI_BASE_URL.to_string(),
        }
    }
}

/// Fully resolved gateway settings
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub upstreams: Upstreams,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            credentials: Credentials::default(),
            upstreams: Upstreams::default(),
        }
    }
}

impl GatewaySettings {
    pub fn resolve(args: Args, toml: &TomlConfig) -> Self {
        let file = &toml.gateway;
        let defaults = Upstreams::default();

        Self {
            host: non_empty(args.host)
                .or_else(|| file.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            credentials: Credentials {
                igdb_client_id: non_empty(args.igdb_client_id)
                    .or_else(|| non_empty(file.igdb_client_id.clone())),
                igdb_client_secret: non_empty(args.igdb_client_secret)
                    .or_else(|| non_empty(file.igdb_client_secret.clone())),
                google_books_api_key: non_empty(args.google_books_api_key)
                    .or_else(|| non_empty(file.google_books_api_key.clone())),
                bangumi_access_token: non_empty(args.bangumi_access_token)
                    .or_else(|| non_empty(file.bangumi_access_token.clone())),
            },
            upstreams: Upstreams {
                twitch_token_url: file
                    .twitch_token_url
                    .clone()
                    .unwrap_or(defaults.twitch_token_url),
                igdb_base_url: file.igdb_base_url.clone().unwrap_or(defaults.igdb_base_url),
                google_books_base_url: file
                    .google_books_base_url
                    .clone()
                    .unwrap_or(defaults.google_books_base_url),
                bangumi_base_url: file
                    .bangumi_base_url
                    .clone()
                    .unwrap_or(defaults.bangumi_base_url),
            },
        }
    }

    /// `host:port` as given; host names are resolved at bind time
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Blank values (e.g. `IGDB_CLIENT_ID=`) count as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlm_common::config::GatewayConfig;

    #[test]
    fn test_defaults_without_args_or_file() {
        let settings = GatewaySettings::resolve(Args::default(), &TomlConfig::default());
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 3000);
        assert!(settings.credentials.igdb_client_id.is_none());
        assert_eq!(settings.upstreams.bangumi_base_url, DEFAULT_BANGUMI_BASE_URL);
        assert_eq!(settings.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_args_win_over_file() {
        let toml = TomlConfig {
            gateway: GatewayConfig {
                port: Some(4000),
                host: Some("0.0.0.0".to_string()),
                igdb_client_id: Some("from-file".to_string()),
                google_books_api_key: Some("file-key".to_string()),
                igdb_base_url: Some("http://127.0.0.1:9999/v4".to_string()),
                ..GatewayConfig::default()
            },
            ..TomlConfig::default()
        };
        let args = Args {
            port: Some(5000),
            igdb_client_id: Some("from-cli".to_string()),
            google_books_api_key: Some("  ".to_string()),
            ..Args::default()
        };

        let settings = GatewaySettings::resolve(args, &toml);
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.credentials.igdb_client_id.as_deref(), Some("from-cli"));
        assert_eq!(
            settings.credentials.google_books_api_key.as_deref(),
            Some("file-key")
        );
        assert_eq!(settings.upstreams.igdb_base_url, "http://127.0.0.1:9999/v4");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = Credentials {
            igdb_client_secret: Some("s3cret".to_string()),
            ..Credentials::default()
        };
        let shown = format!("{:?}", credentials);
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("igdb_client_secret: true"));
    }
}
