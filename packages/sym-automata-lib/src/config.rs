use sym_automata_macros::config;

use crate::logger::LogLevel;

pub trait IntoOr<T> {
    fn into_or(self, or: T) -> T;
}

impl<T> IntoOr<Option<T>> for Option<T> {
    fn into_or(self, or: Option<T>) -> Option<T> {
        match self {
            Some(t) => Some(t),
            None => or,
        }
    }
}

impl<T> IntoOr<T> for Option<T> {
    fn into_or(self, or: T) -> T {
        self.unwrap_or(or)
    }
}

pub trait GeneralConfig {
    fn logger(&self) -> &LoggerConfig;
}

config! {
    pub struct LoggerConfig {
        enabled: bool = false,
        log_file: bool = false,
        log_level: LogLevel = LogLevel::Warn,
    }
}

config! {
    pub struct EngineConfig {
        /// Length bound used when a query counts words without naming one.
        count_bound: u64 = 10,
        /// Prefer printable characters in witnesses.
        printable_witness: bool = true,
        logger: LoggerConfig (Option<PartialLoggerConfig> = LoggerConfig::default()),
    }
}

impl GeneralConfig for EngineConfig {
    fn logger(&self) -> &LoggerConfig {
        &self.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            count_bound = 4

            [logger]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(*config.get_count_bound(), 4);
        assert!(*config.get_printable_witness());
        assert!(*config.logger().get_enabled());
        assert_eq!(*config.logger().get_log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default().with_count_bound(7);
        let text = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(*parsed.get_count_bound(), 7);
    }
}
