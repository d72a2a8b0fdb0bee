use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::io::{Error, ErrorKind};
use std::path::Path;

/// Settings that change how Shapefiles are loaded. Backed by an optional
/// JSON file, e.g. `{ "allow_no_dbf": true, "read_projection": false }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configs {
    /// Tolerate a missing attribute (.dbf) file when loading.
    pub allow_no_dbf: bool,
    /// Read the companion .prj file when it exists.
    pub read_projection: bool,
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            allow_no_dbf: false,
            read_projection: true,
        }
    }
}

impl Configs {
    pub fn new() -> Configs {
        Configs::default()
    }

    /// Reads settings from a JSON file. A file that does not exist yields the
    /// defaults; a file that cannot be parsed is an error.
    pub fn from_json_file<P: AsRef<Path>>(config_file: P) -> Result<Configs, Error> {
        match fs::read_to_string(config_file.as_ref()) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "Failed to parse settings file {}: {}",
                        config_file.as_ref().display(),
                        e
                    ),
                )
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Configs::new()),
            Err(e) => Err(e),
        }
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, config_file: P) -> Result<(), Error> {
        let configs_json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        let mut file = File::create(config_file)?;
        file.write_all(configs_json.as_bytes())?;
        Ok(())
    }
}
