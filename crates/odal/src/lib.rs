//! Odal loads configuration structs from TOML files.
//!
//! Every config has a main file, shared by all agents, and an optional overlay file per agent.
//! The overlay only has to contain the keys it changes: tables are merged recursively and
//! overlay values take precedence.
mod error;

#[cfg(test)]
mod tests;

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use toml::Table;

pub use error::{ConfigKind, Error, ErrorKind, Result};

/// Trait for structs that are stored as a TOML file.
///
/// ```no_run
/// use odal::Config;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize)]
/// struct MeowConfig {
///     count: u32,
/// }
///
/// impl Config for MeowConfig {
///     const PATH: &'static str = "meow.toml";
/// }
///
/// // Loads `config/meow.toml`, with the keys from `config/overlay/tom/meow.toml` on top.
/// let config = MeowConfig::load_with_overlay("config", "config/overlay/tom").unwrap();
/// ```
pub trait Config: Serialize + DeserializeOwned {
    /// Path of the config file, relative to a config directory.
    const PATH: &'static str;

    /// Loads the config from `root`.
    fn load(root: impl AsRef<Path>) -> Result<Self> {
        let table = read_table::<Self>(root.as_ref(), ConfigKind::Main)?;
        from_table(table)
    }

    /// Loads the config from `main`, then applies the overlay found in `overlay`.
    fn load_with_overlay(main: impl AsRef<Path>, overlay: impl AsRef<Path>) -> Result<Self> {
        let main = read_table::<Self>(main.as_ref(), ConfigKind::Main)?;
        let overlay = read_table::<Self>(overlay.as_ref(), ConfigKind::Overlay)?;

        from_table(merge(main, overlay))
    }

    /// Writes the full config to `root`.
    fn store(&self, root: impl AsRef<Path>) -> Result<()> {
        let table = to_table(self)?;
        write_table::<Self>(root.as_ref(), &table)
    }

    /// Writes only the keys in which `self` differs from `main` to the overlay directory.
    fn save_as_overlay(&self, main: &Self, overlay: impl AsRef<Path>) -> Result<()> {
        let diff = extract_diff(&to_table(main)?, &to_table(self)?);
        write_table::<Self>(overlay.as_ref(), &diff)
    }
}

/// Merges `overlay` on top of `main`.
///
/// Keys that only exist in the overlay are added as well, so an overlay can fill in optional
/// fields the main file leaves out.
#[must_use]
pub fn merge(main: Table, mut overlay: Table) -> Table {
    let mut merged = Table::new();

    for (key, value) in main {
        let value = match (value, overlay.remove(&key)) {
            (toml::Value::Table(main), Some(toml::Value::Table(overlay))) => {
                toml::Value::Table(merge(main, overlay))
            }
            (_, Some(overlay)) => overlay,
            (main, None) => main,
        };

        merged.insert(key, value);
    }

    merged.extend(overlay);
    merged
}

/// Returns the keys of `changed` that are absent from, or differ from, `main`.
#[must_use]
pub fn extract_diff(main: &Table, changed: &Table) -> Table {
    let mut diff = Table::new();

    for (key, value) in changed {
        match (main.get(key), value) {
            (Some(toml::Value::Table(main)), toml::Value::Table(changed)) => {
                let nested = extract_diff(main, changed);
                if !nested.is_empty() {
                    diff.insert(key.clone(), toml::Value::Table(nested));
                }
            }
            (Some(main), changed) if main == changed => {}
            _ => {
                diff.insert(key.clone(), value.clone());
            }
        }
    }

    diff
}

fn path_of<T: Config>(root: &Path) -> PathBuf {
    root.join(T::PATH)
}

fn error<T: Config>(kind: ErrorKind) -> Error {
    Error {
        name: T::PATH,
        kind,
    }
}

fn read_table<T: Config>(root: &Path, config_kind: ConfigKind) -> Result<Table> {
    let path = path_of::<T>(root);

    let contents = fs::read_to_string(&path).map_err(|source| {
        error::<T>(ErrorKind::Load {
            path: path.display().to_string(),
            config_kind,
            source,
        })
    })?;

    contents.parse().map_err(|source| {
        error::<T>(ErrorKind::Parse {
            path: path.display().to_string(),
            config_kind,
            source,
        })
    })
}

fn write_table<T: Config>(root: &Path, table: &Table) -> Result<()> {
    let path = path_of::<T>(root);
    let contents = toml::to_string_pretty(table).map_err(|e| error::<T>(ErrorKind::Serialize(e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| {
            error::<T>(ErrorKind::Store {
                path: parent.display().to_string(),
                source,
            })
        })?;
    }

    fs::write(&path, contents).map_err(|source| {
        error::<T>(ErrorKind::Store {
            path: path.display().to_string(),
            source,
        })
    })
}

fn from_table<T: Config>(table: Table) -> Result<T> {
    table
        .try_into()
        .map_err(|e| error::<T>(ErrorKind::Deserialize(e)))
}

fn to_table<T: Config>(config: &T) -> Result<Table> {
    Table::try_from(config).map_err(|e| error::<T>(ErrorKind::Serialize(e)))
}
