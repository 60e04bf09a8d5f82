use crate::application::services::AliasSource;
use crate::domain::alias::AliasTable;
use crate::domain::errors::AliasError;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Alias table persisted as a pretty-printed JSON object
#[derive(Debug, Clone)]
pub struct FileAliasStore {
    path: PathBuf,
}

impl FileAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the table; a missing file is an empty table
    pub fn load(&self) -> Result<AliasTable, AliasError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(AliasTable::new()),
            Err(err) => return Err(err.into()),
        };
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(AliasTable::new());
        }
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Writes the table to a sibling temp file and renames it into place
    pub fn save(&self, table: &AliasTable) -> Result<(), AliasError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut contents = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut contents, PrettyFormatter::with_indent(b"   "));
        table.serialize(&mut serializer)?;
        contents.push(b'\n');

        let tmp_path = self.temp_path();
        let written = fs::File::create(&tmp_path).and_then(|mut file| {
            file.write_all(&contents)?;
            file.sync_all()
        });
        if let Err(err) = written.and_then(|()| fs::rename(&tmp_path, &self.path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        tracing::debug!(path = %self.path.display(), aliases = table.len(), "alias file saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "aliases.json".into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

impl AliasSource for FileAliasStore {
    fn load(&self) -> Result<AliasTable, AliasError> {
        FileAliasStore::load(self)
    }
}
