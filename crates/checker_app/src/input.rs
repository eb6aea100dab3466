use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use checker_core::{parse_check_request, parse_url_list, UrlTask};

/// How to interpret the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// JSON if the text starts with `{` or `[`, plain text otherwise.
    Detect,
    Json,
    Text,
}

/// Read the whole input from `path`, or stdin when `path` is `None`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read urls from stdin")?;
            Ok(text)
        }
    }
}

/// Turn raw input into indexed tasks. Malformed JSON input is rejected as a whole.
pub fn parse_tasks(raw: &str, format: InputFormat) -> Result<Vec<UrlTask>> {
    let json = match format {
        InputFormat::Json => true,
        InputFormat::Text => false,
        InputFormat::Detect => {
            let head = raw.trim_start();
            head.starts_with('{') || head.starts_with('[')
        }
    };
    if json {
        return parse_check_request(raw).context("rejected check request");
    }
    Ok(parse_url_list(raw))
}
