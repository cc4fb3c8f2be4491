use std::collections::HashMap;

use clap::Parser;
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "prgrader", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file; built-in defaults are used when omitted
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<String>,

    /// Number of grading workers, which caps concurrent pipeline runs
    #[arg(long = "workers", short = 'w', default_value_t = 2)]
    pub workers: u8,

    /// Path to the verdict database; records are kept in memory when omitted
    #[arg(long = "database", short = 'd')]
    pub database: Option<String>,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let Some(path) = &self.config_path else {
            return Ok(Config::default());
        };
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub grader: GraderConfig,
    pub users: UserMap,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct GraderConfig {
    /// Upper bound on one clone attempt, seconds
    pub fetch_timeout_secs: u64,
    /// Upper bound on the build command, seconds
    pub build_timeout_secs: u64,
    /// Upper bound on the run command, seconds
    pub run_timeout_secs: u64,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 60,
            build_timeout_secs: 300,
            run_timeout_secs: 60,
        }
    }
}

/// Read-only mapping from login handles to display names, applied when a
/// verdict is reported. Unmapped handles fall back to themselves.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
pub struct UserMap(HashMap<String, String>);

impl UserMap {
    pub fn display_name<'a>(&'a self, login: &'a str) -> &'a str {
        self.0.get(login).map(String::as_str).unwrap_or(login)
    }
}

impl From<HashMap<String, String>> for UserMap {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl Default for UserMap {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("m13253".to_string(), "Star Brilliant".to_string());
        map.insert("Jamesits".to_string(), "James Swineson".to_string());
        map.insert("luvletter".to_string(), "Luv Letter".to_string());
        Self(map)
    }
}
