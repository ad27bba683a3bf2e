use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityProviderKind {
    Jwt,
    TokenInfo,
}

impl std::str::FromStr for IdentityProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jwt" => Ok(Self::Jwt),
            "tokeninfo" => Ok(Self::TokenInfo),
            other => Err(format!("unknown identity provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub admin_emails: Vec<String>,
    pub identity_provider: IdentityProviderKind,
    pub identity_jwt_secret: Option<String>,
    pub identity_tokeninfo_url: Option<String>,
    pub identity_issuer: Option<String>,
    pub identity_audience: Option<String>,
    pub contact_rps: u32,
    pub admin_rps: u32,
    pub json_logs: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env_opt("DATABASE_URL"),
            admin_emails: parse_email_list(&get_env_opt("ADMIN_EMAILS").unwrap_or_default()),
            identity_provider: get_env_parse_or("IDENTITY_PROVIDER", IdentityProviderKind::Jwt)?,
            identity_jwt_secret: get_env_opt("IDENTITY_JWT_SECRET"),
            identity_tokeninfo_url: get_env_opt("IDENTITY_TOKENINFO_URL"),
            identity_issuer: get_env_opt("IDENTITY_ISSUER"),
            identity_audience: get_env_opt("IDENTITY_AUDIENCE"),
            contact_rps: get_env_parse_or("CONTACT_RPS", 5)?,
            admin_rps: get_env_parse_or("ADMIN_RPS", 50)?,
            json_logs: get_env_opt("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }
}

/// Splits a comma separated allow-list, dropping blanks. Entries are kept
/// verbatim otherwise since the policy compares them exactly.
pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
