use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    pub session: SessionConfig,
    /// Exact origins allowed by CORS. Empty means any origin.
    /// Format: `"https://a.example,https://b.example"`.
    pub cors_allowed_origins: Vec<String>,
    /// Seeded as an admin when the users table is empty.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Session lifetime in seconds.
    pub ttl_secs: i64,
    /// Expired-session purge interval in seconds.
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "bantaygas_session".to_owned(),
            cookie_secure: false,
            ttl_secs: 86_400,
            purge_interval_secs: 3_600,
        }
    }
}

#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            session: SessionConfig {
                cookie_name: optional("SESSION_COOKIE_NAME", "bantaygas_session"),
                cookie_secure: parse_bool(&optional("SESSION_COOKIE_SECURE", "false"))
                    .context("SESSION_COOKIE_SECURE must be true or false")?,
                ttl_secs: optional("SESSION_TTL_SECS", "86400")
                    .parse()
                    .context("SESSION_TTL_SECS must be a positive integer")?,
                purge_interval_secs: optional("SESSION_PURGE_INTERVAL_SECS", "3600")
                    .parse()
                    .context("SESSION_PURGE_INTERVAL_SECS must be a positive integer")?,
            },
            cors_allowed_origins: parse_origins(&optional("CORS_ALLOWED_ORIGINS", "")),
            bootstrap_admin: parse_bootstrap_admin(
                std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
                std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
            )?,
        })
    }
}

/// Parse `"origin1,origin2"` into a list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {other:?}")),
    }
}

/// Both variables must be set together, or neither.
fn parse_bootstrap_admin(
    email: Option<String>,
    password: Option<String>,
) -> Result<Option<BootstrapAdmin>> {
    match (email, password) {
        (Some(email), Some(password)) => Ok(Some(BootstrapAdmin { email, password })),
        (None, None) => Ok(None),
        _ => Err(anyhow::anyhow!(
            "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
        )),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_origins_empty() {
        assert!(parse_origins("").is_empty());
        assert!(parse_origins(" , ,").is_empty());
    }

    #[test]
    fn parse_origins_trims_entries() {
        let origins = parse_origins("http://localhost:3000, https://bantaygas.example ");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://bantaygas.example"]
        );
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("ON").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(!parse_bool("no").unwrap());
    }

    #[test]
    fn parse_bool_rejects_garbage() {
        let err = parse_bool("maybe").unwrap_err();
        assert!(err.to_string().contains("not a boolean"));
    }

    #[test]
    fn bootstrap_admin_requires_both_values() {
        assert!(parse_bootstrap_admin(None, None).unwrap().is_none());

        let admin = parse_bootstrap_admin(Some("a@b.co".into()), Some("secret123".into()))
            .unwrap()
            .unwrap();
        assert_eq!(admin.email, "a@b.co");

        let err = parse_bootstrap_admin(Some("a@b.co".into()), None).unwrap_err();
        assert!(err.to_string().contains("must be set together"));
    }

    #[test]
    fn bootstrap_admin_debug_hides_password() {
        let admin = BootstrapAdmin {
            email: "admin@bantaygas.local".into(),
            password: "hunter22".into(),
        };
        let printed = format!("{admin:?}");
        assert!(!printed.contains("hunter22"));
        assert!(printed.contains("<redacted>"));
    }
}
