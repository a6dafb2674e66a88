use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub music: MusicSettings,
    #[serde(default)]
    pub animation: AnimationSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicSettings {
    /// MPRIS player identities to prefer, in order.
    #[serde(default)]
    pub players: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnimationSettings {
    /// Default anti-speed phase index for the branching animation.
    pub branching_interval: Option<usize>,
    /// Default anti-speed phase index for the triangle animation.
    pub triangle_interval: Option<usize>,
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fractalscope")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_settings_file() {
        let settings: Settings = toml::from_str(
            r#"
            [music]
            players = ["spotify", "mpv"]

            [animation]
            branching_interval = 2
            triangle_interval = 4
            "#,
        )
        .unwrap();
        assert_eq!(settings.music.players, vec!["spotify", "mpv"]);
        assert_eq!(settings.animation.branching_interval, Some(2));
        assert_eq!(settings.animation.triangle_interval, Some(4));
    }

    #[test]
    fn missing_sections_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.music.players.is_empty());
        assert_eq!(settings.animation.branching_interval, None);
    }
}
