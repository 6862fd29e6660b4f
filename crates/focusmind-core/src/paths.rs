//! Standard paths used by FocusMind

use std::path::PathBuf;

/// Standard FocusMind paths
pub struct Paths {
    /// Data directory (~/.local/share/focusmind)
    pub data: PathBuf,
    /// Config directory (~/.config/focusmind)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("focusmind");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("focusmind");

        Self { data, config }
    }

    /// Rooted at an explicit directory (data and config side by side)
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data: root.join("data"),
            config: root.join("config"),
        }
    }

    /// Path of the persisted key-value storage file
    pub fn storage_file(&self) -> PathBuf {
        self.data.join("storage.json")
    }

    /// Path of the user configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_root() {
        let paths = Paths::under("/tmp/fm");
        assert_eq!(paths.storage_file(), PathBuf::from("/tmp/fm/data/storage.json"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/fm/config/config.json"));
    }

    #[test]
    fn test_default_paths_end_in_focusmind() {
        let paths = Paths::new();
        assert!(paths.data.ends_with("focusmind"));
        assert!(paths.config.ends_with("focusmind"));
    }
}
