//! Include/exclude filters over collected environment variables.
//!
//! Patterns are `;`-separated wildcards matched against variable names,
//! ignoring case: `*password*;*secret*`.

use artiflow_core::buildinfo::Env;
use artiflow_util::errors::ArtiflowError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A compiled set of `;`-separated wildcard patterns.
#[derive(Debug, Clone)]
pub struct EnvPatterns {
    set: GlobSet,
}

impl EnvPatterns {
    pub fn parse(patterns: &str) -> Result<Self, ArtiflowError> {
        compile(patterns).map_err(|message| ArtiflowError::EnvFilter { message })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.set.is_match(key)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

fn compile(patterns: &str) -> Result<EnvPatterns, String> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| e.to_string())?;
    Ok(EnvPatterns { set })
}

/// Keep only variables matching `patterns`. An empty pattern list keeps everything.
pub fn include_filter(patterns: impl Into<String>) -> impl Fn(&Env) -> Result<Env, ArtiflowError> {
    let compiled = compile(&patterns.into());
    move |env: &Env| {
        let patterns = as_filter(&compiled)?;
        if patterns.is_empty() {
            return Ok(env.clone());
        }
        Ok(env
            .iter()
            .filter(|(key, _)| patterns.matches(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Drop variables matching `patterns`.
pub fn exclude_filter(patterns: impl Into<String>) -> impl Fn(&Env) -> Result<Env, ArtiflowError> {
    let compiled = compile(&patterns.into());
    move |env: &Env| {
        let patterns = as_filter(&compiled)?;
        Ok(env
            .iter()
            .filter(|(key, _)| !patterns.matches(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Filters compile their patterns once. A compile error is kept and
/// reported each time the filter runs.
fn as_filter(compiled: &Result<EnvPatterns, String>) -> Result<&EnvPatterns, ArtiflowError> {
    compiled.as_ref().map_err(|message| ArtiflowError::EnvFilter {
        message: message.clone(),
    })
}
