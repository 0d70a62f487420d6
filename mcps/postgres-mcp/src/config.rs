//! Connection configuration for the PostgreSQL MCP server
//!
//! Built once at startup from command-line flags, falling back to `DB_*`
//! environment variables and then to the local-development defaults.

use std::fmt;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DBNAME: &str = "postgres";
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "postgres";
pub const DEFAULT_APPLICATION_NAME: &str = "postgres-mcp";

/// PostgreSQL connection settings
#[derive(Clone, PartialEq, Eq, Parser)]
#[command(name = "postgres-mcp", version, about = "Read-only PostgreSQL MCP server")]
pub struct DbConfig {
    /// Database server host
    #[arg(long, env = "DB_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Database server port
    #[arg(long, env = "DB_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Database name
    #[arg(long, env = "DB_NAME", default_value = DEFAULT_DBNAME)]
    pub dbname: String,

    /// Role to connect as
    #[arg(long, env = "DB_USER", default_value = DEFAULT_USER)]
    pub user: String,

    /// Password for `user`
    #[arg(long, env = "DB_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,

    /// Connect timeout in seconds (driver default when unset)
    #[arg(long, env = "DB_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// `application_name` reported to the server
    #[arg(long, env = "DB_APPLICATION_NAME", default_value = DEFAULT_APPLICATION_NAME)]
    pub application_name: String,
}

impl DbConfig {
    /// Driver configuration for one connection
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .application_name(&self.application_name);

        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout(Duration::from_secs(secs));
        }

        config
    }

    /// `user@host:port/dbname`, safe to log
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dbname: DEFAULT_DBNAME.to_string(),
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            connect_timeout_secs: None,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("application_name", &self.application_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let config = DbConfig::try_parse_from([
            "postgres-mcp",
            "--host",
            "db.internal",
            "--port",
            "6543",
            "--dbname",
            "analytics",
            "--user",
            "reader",
            "--password",
            "s3cret",
            "--connect-timeout-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.dbname, "analytics");
        assert_eq!(config.user, "reader");
        assert_eq!(config.password, "s3cret");
        assert_eq!(config.connect_timeout_secs, Some(5));
        assert_eq!(config.target(), "reader@db.internal:6543/analytics");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = DbConfig::try_parse_from(["postgres-mcp", "--port", "not-a-port"]);
        assert!(result.is_err());

        let result = DbConfig::try_parse_from(["postgres-mcp", "--port", "70000"]);
        assert!(result.is_err());
    }

    const ENV_VARS: &[&str] = &[
        "DB_HOST",
        "DB_PORT",
        "DB_NAME",
        "DB_USER",
        "DB_PASSWORD",
        "DB_CONNECT_TIMEOUT_SECS",
        "DB_APPLICATION_NAME",
    ];

    #[test]
    fn test_parsed_defaults_match_default() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }

        let parsed = DbConfig::try_parse_from(["postgres-mcp"]).unwrap();
        assert_eq!(parsed, DbConfig::default());
        assert_eq!(parsed.target(), "postgres@localhost:5432/postgres");
        assert_eq!(parsed.application_name, "postgres-mcp");
    }

    #[test]
    fn test_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "postgres");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.password, "postgres");
        assert!(config.connect_timeout_secs.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DbConfig {
            password: "hunter2".to_string(),
            ..DbConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_pg_config_carries_settings() {
        let config = DbConfig {
            host: "db.internal".to_string(),
            port: 6543,
            connect_timeout_secs: Some(3),
            ..DbConfig::default()
        };
        let pg = config.to_pg_config();

        assert_eq!(pg.get_ports(), &[6543]);
        assert_eq!(pg.get_dbname(), Some("postgres"));
        assert_eq!(pg.get_user(), Some("postgres"));
        assert_eq!(pg.get_connect_timeout(), Some(&Duration::from_secs(3)));
        assert_eq!(pg.get_application_name(), Some("postgres-mcp"));
    }
}
