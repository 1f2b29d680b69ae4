use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match env_opt("STORE").as_deref() {
            Some("memory") => StoreKind::Memory,
            Some("postgres") | None => StoreKind::Postgres,
            Some(other) => anyhow::bail!("unknown STORE value: {other}"),
        };
        let database_url = match store {
            StoreKind::Postgres => required("DATABASE_URL")?,
            StoreKind::Memory => env_opt("DATABASE_URL").unwrap_or_default(),
        };

        let ttl = match env_opt("JWT_EXPIRES_IN") {
            Some(raw) => parse_ttl(&raw).with_context(|| format!("JWT_EXPIRES_IN={raw}"))?,
            None => DEFAULT_TTL,
        };
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: env_opt("JWT_ISSUER").unwrap_or_else(|| "jobtrack".into()),
            audience: env_opt("JWT_AUDIENCE").unwrap_or_else(|| "jobtrack-users".into()),
            ttl,
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: env_parse("PASSWORD_MEMORY_KIB")?.unwrap_or(defaults.memory_kib),
            iterations: env_parse("PASSWORD_ITERATIONS")?.unwrap_or(defaults.iterations),
            parallelism: env_parse("PASSWORD_PARALLELISM")?.unwrap_or(defaults.parallelism),
        };

        let port = match env_parse::<u16>("APP_PORT")? {
            Some(p) => p,
            None => env_parse("PORT")?.unwrap_or(8080),
        };

        Ok(Self {
            store,
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS")?.unwrap_or(10),
            host: env_opt("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_origins: parse_origins(
                &env_opt("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5174".into()),
            ),
            jwt,
            password,
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    non_blank(std::env::var(key).ok())
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> anyhow::Result<String> {
    env_opt(key).with_context(|| format!("{key} must be set and non-empty"))
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_opt(key)
        .map(|v| v.trim().parse::<T>().with_context(|| format!("{key}={v}")))
        .transpose()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_ttl(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => raw.split_at(idx),
        None => (raw, "s"),
    };
    let n: u64 = digits.parse().context("expected a number")?;
    let per_unit: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => anyhow::bail!("unknown duration unit `{other}`"),
    };
    let secs = n
        .checked_mul(per_unit)
        .filter(|s| *s <= MAX_TTL.as_secs())
        .context("token lifetime must be at most 10 years")?;
    anyhow::ensure!(secs > 0, "token lifetime must be positive");
    Ok(Duration::from_secs(secs))
}
