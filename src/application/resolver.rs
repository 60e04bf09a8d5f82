use crate::domain::alias::AliasTable;
use crate::domain::errors::ResolveError;
use crate::domain::value_objects::ParsedUrl;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| compile(r"\{([A-Za-z_]\w{0,19})\}"));
static PORT_ONLY: Lazy<Regex> = Lazy::new(|| compile(r"^:(\d{1,5})([/?#].*)?$"));
static LOCALHOST: Lazy<Regex> = Lazy::new(|| compile(r"^(localhost|127\.0\.0\.1)([:/?#].*)?$"));
static EXPLICIT_SCHEME: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z][A-Za-z0-9+.\-]*://"));
static BARE_HOST: Lazy<Regex> =
    Lazy::new(|| compile(r"^[a-z][a-z0-9\-]*(\.[a-z0-9\-]+)*(:\d{1,5})?([/?#].*)?$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("URL shorthand pattern is valid")
}

/// Turns user-typed URL expressions into canonical absolute URLs
///
/// Supported shorthands, checked in order:
/// * `:3000/users` → `http://localhost:3000/users`
/// * `localhost:8080`, `127.0.0.1/x` → `http://…`
/// * `http://…`, `https://…` → unchanged
/// * `api.example.com/v1` → `https://api.example.com/v1`
///
/// `{name}` placeholders are replaced from the alias table first.
pub struct UrlResolver;

impl UrlResolver {
    pub fn resolve(raw: &str, aliases: Option<&AliasTable>) -> Result<ParsedUrl, ResolveError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResolveError::EmptyInput);
        }

        let expanded = Self::substitute_aliases(raw, aliases)?;
        let absolute = Self::expand_shorthand(expanded.trim())?;
        ParsedUrl::parse(&absolute)
    }

    /// True if the expression references at least one alias
    pub fn has_placeholders(raw: &str) -> bool {
        PLACEHOLDER.is_match(raw)
    }

    fn substitute_aliases(raw: &str, aliases: Option<&AliasTable>) -> Result<String, ResolveError> {
        if !Self::has_placeholders(raw) {
            return Ok(raw.to_string());
        }
        let aliases = aliases.ok_or(ResolveError::NoAliasesProvided)?;

        let mut expanded = String::with_capacity(raw.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(raw) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let target = aliases
                .get(name.as_str())
                .ok_or_else(|| ResolveError::UnknownAlias(name.as_str().to_string()))?;

            expanded.push_str(&raw[last..whole.start()]);
            // `{api}/users` with api = `http://host/` must not produce `//users`
            if raw[whole.end()..].starts_with('/') {
                expanded.push_str(target.trim_end_matches('/'));
            } else {
                expanded.push_str(target);
            }
            last = whole.end();
        }
        expanded.push_str(&raw[last..]);
        Ok(expanded)
    }

    fn expand_shorthand(url: &str) -> Result<String, ResolveError> {
        if let Some(caps) = PORT_ONLY.captures(url) {
            let rest = caps.get(2).map_or("", |m| m.as_str());
            return Ok(format!("http://localhost:{}{}", &caps[1], rest));
        }
        if LOCALHOST.is_match(url) {
            return Ok(format!("http://{url}"));
        }
        if EXPLICIT_SCHEME.is_match(url) {
            return Ok(url.to_string());
        }
        if BARE_HOST.is_match(url) {
            return Ok(format!("https://{url}"));
        }
        Err(ResolveError::InvalidUrlFormat(url.to_string()))
    }
}
