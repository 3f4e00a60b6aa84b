use crate::artifacts::core::identity::Identity;
use std::path::PathBuf;

/// Settings resolved once by the binary and passed down to the operations that need them
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Identity used for new commits, when one is configured
    pub identity: Option<Identity>,
    /// User-wide ignore file (`$XDG_CONFIG_HOME/git/ignore`)
    pub global_excludes: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let identity = match Identity::load_from_env() {
            Ok(identity) => Some(identity),
            Err(error) => {
                tracing::debug!(%error, "no commit identity in the environment");
                None
            }
        };

        Config {
            identity,
            global_excludes: Self::global_excludes_path(
                std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
                std::env::var_os("HOME").map(PathBuf::from),
            ),
        }
    }

    fn global_excludes_path(
        xdg_config_home: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Option<PathBuf> {
        xdg_config_home
            .filter(|path| path.is_absolute())
            .or_else(|| home.map(|home| home.join(".config")))
            .map(|config_home| config_home.join("git").join("ignore"))
    }

    pub fn require_identity(&self) -> anyhow::Result<&Identity> {
        self.identity.as_ref().ok_or_else(|| {
            anyhow::anyhow!("no commit identity: set GIT_AUTHOR_NAME and GIT_AUTHOR_EMAIL")
        })
    }
}
