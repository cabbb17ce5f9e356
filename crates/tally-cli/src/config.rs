use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use tally_core::models::EngineConfig;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database_path: String,
    /// JSON file holding the last catch-up timestamp
    pub state_path: String,
    /// Run a throttled catch-up before listing transactions
    pub auto_sync: bool,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "tally.db".to_string(),
            state_path: "tally-state.json".to_string(),
            auto_sync: true,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Reads `tally.toml`, then `TALLY_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `TALLY_ENGINE__TIMEZONE`.
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(Figment::new().merge(Toml::file("tally.toml")))
    }

    fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment
            .merge(Env::prefixed("TALLY_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::from_figment(Figment::new())?;
            assert_eq!(config.database_path, "tally.db");
            assert!(config.auto_sync);
            assert_eq!(config.engine, EngineConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_toml_and_env_layering() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tally.toml",
                r#"
                database_path = "books.db"

                [engine]
                timezone = "Europe/Berlin"
                max_iterations_per_template = 50
                "#,
            )?;
            jail.set_env("TALLY_DATABASE_PATH", "override.db");
            jail.set_env("TALLY_ENGINE__STRICT_REPEAT_UNITS", "true");

            let config = Config::new()?;
            assert_eq!(config.database_path, "override.db");
            assert_eq!(config.engine.timezone, "Europe/Berlin");
            assert_eq!(config.engine.max_iterations_per_template, 50);
            assert!(config.engine.strict_repeat_units);
            assert_eq!(config.engine.throttle_interval_secs, 6 * 60 * 60);
            Ok(())
        });
    }
}
