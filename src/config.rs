//! Configuration management for the Scribe agent
//!
//! Everything is environment-driven. The only required variable is
//! `DATABASE_URL`; its absence is a startup-fatal configuration error.
//! All other variables have defaults suitable for local development.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::{Error, Persona, Result};

/// Default listener address for inbound session requests
pub const DEFAULT_BIND: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8787);

/// Default realtime model identifier
pub const DEFAULT_MODEL: &str = "gpt-realtime-mini";

/// Default realtime model endpoint
pub const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Scribe agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Note store location, from `DATABASE_URL` (SQLite path or `:memory:`)
    pub database_url: String,

    /// Listener address for inbound session requests (`SCRIBE_BIND`)
    pub bind_addr: SocketAddr,

    /// API key for the realtime model backend (`OPENAI_API_KEY`)
    ///
    /// Optional at startup: the server boots without it, but sessions
    /// cannot open a model stream until it is provided.
    pub api_key: Option<String>,

    /// Realtime model endpoint (`SCRIBE_REALTIME_URL`)
    pub realtime_url: String,

    /// Realtime model identifier (`SCRIBE_MODEL`)
    pub model: String,

    /// Request noise suppression on session audio input (`SCRIBE_NOISE_SUPPRESSION`)
    pub noise_suppression: bool,

    /// Active persona, assembled from defaults plus env overrides
    pub persona: Persona,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `DATABASE_URL` is missing or empty, or if
    /// an override variable fails to parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an explicit variable lookup
    ///
    /// The seam exists for tests: mutating the real process environment is
    /// unsafe under the 2024 edition and races across parallel tests.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `DATABASE_URL` is missing or empty, or if
    /// an override variable fails to parse.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = env("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("DATABASE_URL is not set (note store location)".to_string())
            })?;

        let bind_addr = match env("SCRIBE_BIND") {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("invalid SCRIBE_BIND '{raw}': {e}")))?,
            None => DEFAULT_BIND,
        };

        let api_key = env("OPENAI_API_KEY").filter(|v| !v.is_empty());

        let realtime_url =
            env("SCRIBE_REALTIME_URL").unwrap_or_else(|| DEFAULT_REALTIME_URL.to_string());

        let model = env("SCRIBE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let noise_suppression = env("SCRIBE_NOISE_SUPPRESSION")
            .map_or(true, |v| v == "1" || v.eq_ignore_ascii_case("true"));

        // Persona is defaults plus overrides; the greeting is deliberately
        // plain configuration data, not product copy baked into code.
        let mut persona = Persona::default();
        if let Some(voice) = env("SCRIBE_VOICE") {
            persona.voice = voice;
        }
        if let Some(instructions) = env("SCRIBE_INSTRUCTIONS") {
            persona.instructions = instructions;
        }
        if let Some(greeting) = env("SCRIBE_GREETING") {
            persona.greeting = greeting;
        }

        Ok(Self {
            database_url,
            bind_addr,
            api_key,
            realtime_url,
            model,
            noise_suppression,
            persona,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_database_url_is_fatal() {
        let result = Config::from_lookup(lookup(&[("DATABASE_URL", "  ")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "notes.db")]))
            .expect("minimal config");
        assert_eq!(config.database_url, "notes.db");
        assert_eq!(config.bind_addr, DEFAULT_BIND);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.realtime_url, DEFAULT_REALTIME_URL);
        assert!(config.noise_suppression);
        assert!(config.api_key.is_none());
        assert_eq!(config.persona.voice, crate::persona::DEFAULT_VOICE);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "/var/lib/scribe/notes.db"),
            ("SCRIBE_BIND", "0.0.0.0:9000"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SCRIBE_MODEL", "gpt-realtime"),
            ("SCRIBE_VOICE", "verse"),
            ("SCRIBE_GREETING", "Say hello."),
            ("SCRIBE_NOISE_SUPPRESSION", "false"),
        ]))
        .expect("full config");
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-realtime");
        assert_eq!(config.persona.voice, "verse");
        assert_eq!(config.persona.greeting, "Say hello.");
        assert!(!config.noise_suppression);
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "notes.db"),
            ("SCRIBE_BIND", "not-an-addr"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
