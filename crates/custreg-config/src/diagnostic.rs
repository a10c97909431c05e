// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config error diagnostics.
//!
//! Figment errors are turned into [`ConfigError`]s that miette can render
//! with the offending line highlighted and a "did you mean" hint for
//! misspelled keys.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem found while loading or validating.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in [{section}]")]
    #[diagnostic(
        code(custreg::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted section path, `root` for top-level keys.
        section: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the section.
        valid_keys: String,
        #[label("not a {section} setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(custreg::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(custreg::config::missing_key),
        help("add `{key} = <value>` to custreg.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(custreg::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(custreg::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// The TOML text a figment error came from, when it was read from a file
/// we still have in `sources`.
fn origin<'a>(error: &figment::Error, sources: &'a [(String, String)]) -> Option<(&'a str, &'a str)> {
    let path = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        _ => return None,
    };
    sources
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(name, content)| (name.as_str(), content.as_str()))
}

/// Locate `key` under `section` in the error's source file.
fn locate(
    error: &figment::Error,
    section: &[String],
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((name, content)) = origin(error, sources) else {
        return (None, None);
    };
    match find_key_offset(content, section, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(name, content.to_string())),
        ),
        None => (None, None),
    }
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    let path: Vec<String> = error.path.iter().map(ToString::to_string).collect();
    match &error.kind {
        Kind::UnknownField(key, expected) => {
            let (span, src) = locate(error, &path, key, sources);
            ConfigError::UnknownKey {
                key: key.clone(),
                section: if path.is_empty() {
                    "root".to_string()
                } else {
                    path.join(".")
                },
                suggestion: suggest_key(key, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(key) => ConfigError::MissingKey {
            key: key.to_string(),
        },
        Kind::InvalidType(actual, expected) => {
            let (span, src) = match path.split_last() {
                Some((key, section)) => locate(error, section, key, sources),
                None => (None, None),
            };
            ConfigError::InvalidType {
                key: path.join("."),
                detail: format!("found {actual}"),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Convert every error carried by `err` into a diagnostic.
///
/// `sources` pairs a file path with its content so spans can be attached.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|e| convert(&e, sources)).collect()
}

/// Byte offset of `key` inside the `[section]` table of `content`.
///
/// Only lines between the section header and the next header are searched.
/// An empty `section` searches the top level before the first header.
pub fn find_key_offset(content: &str, section: &[String], key: &str) -> Option<usize> {
    let wanted = (!section.is_empty()).then(|| format!("[{}]", section.join(".")));
    let mut inside = wanted.is_none();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            inside = wanted.as_deref() == Some(trimmed);
        } else if inside {
            let indent = line.len() - line.trim_start().len();
            let rest = &line[indent..];
            if let Some(after) = rest.strip_prefix(key)
                && after.trim_start().starts_with('=')
            {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("custreg: {} configuration errors", errors.len());
    }
}
