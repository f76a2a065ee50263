use std::{fmt::Display, path::Path, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::logger::LogLevel;

/// Generates `with_*` (builder), `set_*` and `get_*` accessors for every
/// listed field.
macro_rules! config_accessors {
    ($name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        paste::paste! {
            impl $name {
                $(
                    pub fn [<with_ $field>](mut self, $field: $ty) -> Self {
                        self.$field = $field;
                        self
                    }
                    pub fn [<set_ $field>](&mut self, $field: $ty) {
                        self.$field = $field;
                    }
                    pub fn [<get_ $field>](&self) -> &$ty {
                        &self.$field
                    }
                )*
            }
        }
    };
}

/// Loading from TOML. Every field may be missing from the file, missing fields
/// keep their default.
pub trait ConfigFile: Default + DeserializeOwned {
    fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn from_file<P: AsRef<Path>>(file_path: P) -> anyhow::Result<Self> {
        let file_path = file_path.as_ref();
        let canonic_path = std::fs::canonicalize(file_path)
            .with_context(|| format!("config file {} not found", file_path.display()))?;
        let content = std::fs::read_to_string(&canonic_path)?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", canonic_path.display()))
    }

    fn from_optional_file<P: AsRef<Path>>(file_path: Option<P>) -> anyhow::Result<Self> {
        match file_path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

/// What the two conversion selectors actually do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionMode {
    /// Textbook conversion: state splitting for Mealy to Moore, output
    /// relabeling for Moore to Mealy.
    #[default]
    Convert,
    /// Keep the machine kind. Mealy tables are only re-sorted, Moore tables
    /// are pruned and re-sorted.
    Normalize,
}

impl FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "convert" => Ok(ConversionMode::Convert),
            "normalize" | "normalise" => Ok(ConversionMode::Normalize),
            _ => Err(format!("Invalid conversion mode: {}", s)),
        }
    }
}

impl Display for ConversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionMode::Convert => write!(f, "convert"),
            ConversionMode::Normalize => write!(f, "normalize"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    enabled: bool,
    log_file: bool,
    log_level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            enabled: false,
            log_file: false,
            log_level: LogLevel::Warn,
        }
    }
}

config_accessors!(LoggerConfig {
    enabled: bool,
    log_file: bool,
    log_level: LogLevel,
});

/// Parameters of the Mealy to Moore state splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Output of the Moore state the split machine starts in. It is only
    /// visible before the first input is read.
    start_output: String,
    /// Split states are named `<prefix>0`, `<prefix>1`, ...
    state_prefix: String,
    /// Upper bound for the number of Moore states.
    max_states: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            start_output: String::new(),
            state_prefix: "q".to_string(),
            max_states: None,
        }
    }
}

config_accessors!(SplitConfig {
    start_output: String,
    state_prefix: String,
    max_states: Option<usize>,
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    mode: ConversionMode,
    /// Drop unreachable states before a Moore machine is relabeled.
    prune_unreachable: bool,
    split: SplitConfig,
    logger: LoggerConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            mode: ConversionMode::Convert,
            prune_unreachable: true,
            split: SplitConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

config_accessors!(ConverterConfig {
    mode: ConversionMode,
    prune_unreachable: bool,
    split: SplitConfig,
    logger: LoggerConfig,
});

impl ConfigFile for ConverterConfig {}
impl ConfigFile for SplitConfig {}
impl ConfigFile for LoggerConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_keep_defaults() {
        let config = ConverterConfig::from_toml_str(
            r#"
            mode = "normalize"

            [split]
            max_states = 12
            "#,
        )
        .unwrap();

        assert_eq!(*config.get_mode(), ConversionMode::Normalize);
        assert!(*config.get_prune_unreachable());
        assert_eq!(config.get_split().get_max_states(), &Some(12));
        assert_eq!(config.get_split().get_state_prefix(), "q");
        assert_eq!(config.get_logger(), &LoggerConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(
            ConverterConfig::from_toml_str("").unwrap(),
            ConverterConfig::default()
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(ConverterConfig::from_toml_str("prune = false").is_err());
    }

    #[test]
    fn logger_section() {
        let config = ConverterConfig::from_toml_str(
            r#"
            [logger]
            enabled = true
            log_level = "Debug"
            "#,
        )
        .unwrap();

        assert!(*config.get_logger().get_enabled());
        assert_eq!(*config.get_logger().get_log_level(), LogLevel::Debug);
    }

    #[test]
    fn section_types_load_on_their_own() {
        let split = SplitConfig::from_toml_str("state_prefix = \"m\"").unwrap();
        assert_eq!(split.get_state_prefix(), "m");
        assert_eq!(split.get_max_states(), &None);
    }

    #[test]
    fn builders_chain() {
        let config = ConverterConfig::default()
            .with_mode(ConversionMode::Normalize)
            .with_split(SplitConfig::default().with_state_prefix("m".into()));

        assert_eq!(*config.get_mode(), ConversionMode::Normalize);
        assert_eq!(config.get_split().get_state_prefix(), "m");
    }

    #[test]
    fn mode_from_str() {
        assert_eq!(
            "Normalize".parse::<ConversionMode>(),
            Ok(ConversionMode::Normalize)
        );
        assert!("split".parse::<ConversionMode>().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ConverterConfig::from_optional_file(Some("does/not/exist.toml")).is_err());
        assert!(ConverterConfig::from_optional_file(None::<&str>).is_ok());
    }
}
