use std::{
    fmt::Display,
    fs,
    path::Path,
    sync::{LazyLock, PoisonError, RwLock},
};

use nu_ansi_term::Color;
use quill_http::Headers;

use crate::error::{CliError, CliResult, ErrorContext};

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn set_color(enabled: bool) {
    *COLOR.write().unwrap_or_else(PoisonError::into_inner) = enabled;
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap_or_else(PoisonError::into_inner);
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Parses `Name: value`. Surrounding whitespace is trimmed from both parts.
pub fn parse_header(header: &str) -> CliResult<(String, String)> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| CliError::InvalidHeader(header.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidHeader(header.to_string()));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

pub fn parse_headers(headers: &[String]) -> CliResult<Headers> {
    let mut parsed = Headers::new();
    for header in headers {
        let (name, value) = parse_header(header)?;
        quill_http::set_header(&mut parsed, name, value);
    }
    Ok(parsed)
}

pub fn read_file(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
