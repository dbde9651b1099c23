use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, PoisonError, RwLock},
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, Item};
use tracing::{debug, info};

use crate::{
    annotations::annotate_table,
    error::{ConfigError, Result},
    profile::Profile,
    utils::xdg_config_home,
};

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/v1/graphql";

/// Quill configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// The name of the default profile to use.
    pub default_profile: String,

    /// A map of profile names to their configurations.
    pub profile: HashMap<String, Profile>,
}

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("QUILL_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("quill").join("config.toml"),
    })
});

pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .to_path_buf()
}

/// Points subsequent loads and [`generate_default_config`] at `path`.
pub fn set_config_path(path: impl Into<PathBuf>) {
    *CONFIG_PATH.write().unwrap_or_else(PoisonError::into_inner) = path.into();
}

impl Config {
    pub fn default_config() -> Self {
        let mut profile = Profile::new(DEFAULT_ENDPOINT);
        profile.timeout = Some("30s".to_string());
        profile.debug = Some(false);

        Self {
            default_profile: DEFAULT_PROFILE.to_string(),
            profile: HashMap::from([(DEFAULT_PROFILE.to_string(), profile)]),
        }
    }

    /// Loads the configuration file, or the default configuration if there is none.
    pub fn new() -> Result<Self> {
        Self::load(&config_path())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        if !self.profile.contains_key(&self.default_profile) {
            return Err(ConfigError::MissingDefaultProfile(
                self.default_profile.clone(),
            ));
        }

        for (name, profile) in &self.profile {
            profile.validate(name)?;
        }

        Ok(())
    }

    pub fn default_profile(&self) -> Result<&Profile> {
        self.profile
            .get(&self.default_profile)
            .ok_or_else(|| ConfigError::MissingDefaultProfile(self.default_profile.clone()))
    }

    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        self.profile
            .get(name)
            .ok_or(ConfigError::MissingProfile(name.to_string()))
    }

    /// The named profile, or the default one when `name` is `None`.
    pub fn select_profile(&self, name: Option<&str>) -> Result<&Profile> {
        match name {
            Some(name) => self.get_profile(name),
            None => self.default_profile(),
        }
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(profiles) = doc.get_mut("profile").and_then(Item::as_table_mut) {
            for (_name, item) in profiles.iter_mut() {
                if let Item::Table(profile) = item {
                    annotate_table::<Profile>(profile, false)?;
                }
            }
        }

        Ok(doc)
    }
}

/// Writes the annotated default configuration to the config path.
///
/// Refuses to overwrite an existing file.
pub fn generate_default_config() -> Result<PathBuf> {
    let path = config_path();

    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&path, doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(path)
}
