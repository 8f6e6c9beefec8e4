//! Game installation settings.
//!
//! A Unity IL2CPP build lays out its files as:
//!
//! ```text
//! <game>/<Exe>.exe
//! <game>/GameAssembly.dll          native code, the converter input
//! <game>/<Exe>_Data/il2cpp_data    metadata, present only for IL2CPP builds
//! <game>/<Exe>_Data/Plugins        native plugins, imported without conversion
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name of the native binary produced by an IL2CPP build.
pub const PRIMARY_ARTIFACT: &str = "GameAssembly.dll";

/// Settings describing the game installation being imported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Directory containing the game executable.
    #[serde(default)]
    pub path: PathBuf,
    /// File name of the game executable, e.g. `"MyGame.exe"`.
    #[serde(default)]
    pub executable: String,
}

impl GameConfig {
    /// Executable name without its extension. Doubles as the package name.
    pub fn executable_stem(&self) -> String {
        Path::new(&self.executable)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// The `<Exe>_Data` directory next to the executable.
    pub fn data_path(&self) -> PathBuf {
        self.path.join(format!("{}_Data", self.executable_stem()))
    }

    /// Path of the native binary the converter reads.
    pub fn primary_artifact(&self) -> PathBuf {
        self.path.join(PRIMARY_ARTIFACT)
    }

    /// Native plugins directory inside the data directory.
    pub fn plugins_path(&self) -> PathBuf {
        self.data_path().join("Plugins")
    }

    /// IL2CPP metadata directory; its presence marks an IL2CPP build.
    pub fn il2cpp_data_path(&self) -> PathBuf {
        self.data_path().join("il2cpp_data")
    }

    /// Whether both the game path and executable are set.
    pub fn is_configured(&self) -> bool {
        !self.path.as_os_str().is_empty() && !self.executable.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> GameConfig {
        GameConfig {
            path: PathBuf::from("/games/My Game"),
            executable: "My Game.exe".to_string(),
        }
    }

    #[test]
    fn test_derived_paths() {
        let g = game();
        assert_eq!(g.executable_stem(), "My Game");
        assert_eq!(g.data_path(), PathBuf::from("/games/My Game/My Game_Data"));
        assert_eq!(
            g.primary_artifact(),
            PathBuf::from("/games/My Game/GameAssembly.dll")
        );
        assert_eq!(
            g.plugins_path(),
            PathBuf::from("/games/My Game/My Game_Data/Plugins")
        );
        assert_eq!(
            g.il2cpp_data_path(),
            PathBuf::from("/games/My Game/My Game_Data/il2cpp_data")
        );
    }

    #[test]
    fn test_is_configured() {
        assert!(game().is_configured());
        assert!(!GameConfig::default().is_configured());
    }
}
