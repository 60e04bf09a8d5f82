use crate::domain::errors::AliasError;
use crate::domain::value_objects::ParsedUrl;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static ALIAS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w{0,19}$").expect("alias name pattern is valid"));

/// Name to absolute URL mapping used for `{name}` substitution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<String, String>);

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_name(name: &str) -> bool {
        ALIAS_NAME.is_match(name) && name.is_ascii()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Adds or replaces an alias. The target must be an absolute http(s) URL.
    pub fn set(&mut self, name: &str, url: &str) -> Result<(), AliasError> {
        if !Self::is_valid_name(name) {
            return Err(AliasError::InvalidAliasName(name.to_string()));
        }
        let url = url.trim();
        ParsedUrl::parse(url).map_err(|source| AliasError::InvalidTarget {
            name: name.to_string(),
            source,
        })?;
        self.0.insert(name.to_string(), url.to_string());
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<String, AliasError> {
        if !Self::is_valid_name(name) {
            return Err(AliasError::InvalidAliasName(name.to_string()));
        }
        self.0
            .remove(name)
            .ok_or_else(|| AliasError::UnknownAlias(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        AliasTable(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
