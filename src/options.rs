//! Deployment switches for the bridge.
//!
//! Settings come from a `ron` file under the user's config directory, with
//! environment variables taking precedence. Both sources are optional; the
//! defaults leave the bridge enabled and the facade window hidden.

use {
    ron::ser::PrettyConfig,
    serde::{Deserialize, Serialize},
    std::path::PathBuf,
};

/// Disables the remote bridge entirely; every dialog stays local.
pub const DISABLE_ENV: &str = "DDE_FILE_DIALOG_DISABLE";
/// Shows the facade's own window alongside the remote dialog, for
/// debugging the mirrored state.
pub const SHOW_WINDOW_ENV: &str = "DDE_FILE_DIALOG_SHOW_WINDOW";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Options {
    pub disable: bool,
    pub show_facade_window: bool,
}

impl Options {
    /// Config file overlaid with the environment.
    #[must_use]
    pub fn load() -> Self {
        Self::from_file().with_env(|name| std::env::var(name).ok())
    }

    fn from_file() -> Self {
        let Some(path) = config_file() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => match ron::from_str(&contents) {
                Ok(this) => this,
                Err(e) => {
                    tracing::warn!("failed to deserialize {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = var(DISABLE_ENV) {
            self.disable = parse_flag(&raw);
        }
        if let Some(raw) = var(SHOW_WINDOW_ENV) {
            self.show_facade_window = parse_flag(&raw);
        }
        self
    }

    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = config_file() else {
            return Err(std::io::Error::other("no config directory"));
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let out = ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(std::io::Error::other)?;
        std::fs::write(path, out.as_bytes())
    }
}

/// `1`, `true`, `yes` and `on` enable a flag, case-insensitively;
/// everything else, including empty, disables it.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn config_file() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("dde-filedialog").join("config.ron"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing_accepts_common_truthy_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("YES"));
        assert!(parse_flag(" on "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("maybe"));
    }

    #[test]
    fn environment_overrides_the_file_settings() {
        let base = Options {
            disable: false,
            show_facade_window: true,
        };
        let merged = base.with_env(|name| match name {
            DISABLE_ENV => Some("1".to_owned()),
            SHOW_WINDOW_ENV => Some("0".to_owned()),
            _ => None,
        });
        assert!(merged.disable);
        assert!(!merged.show_facade_window);
    }

    #[test]
    fn unset_environment_leaves_the_file_settings() {
        let base = Options {
            disable: true,
            show_facade_window: false,
        };
        assert_eq!(base.with_env(|_| None), base);
    }

    #[test]
    fn options_round_trip_through_ron() {
        let options = Options {
            disable: true,
            show_facade_window: true,
        };
        let text = ron::to_string(&options).unwrap();
        assert_eq!(ron::from_str::<Options>(&text).unwrap(), options);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let options: Options = ron::from_str("(disable: true)").unwrap();
        assert!(options.disable);
        assert!(!options.show_facade_window);
    }
}
