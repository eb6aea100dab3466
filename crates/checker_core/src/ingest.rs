use serde_json::Value;

use crate::task::tasks_from_urls;
use crate::UrlTask;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(String),
    #[error("invalid request, expected 'urls' array")]
    MissingUrls,
    #[error("invalid request, 'urls' must be an array")]
    NotAList,
    #[error("invalid request, entry {position} of 'urls' is not a string")]
    NotAString { position: usize },
}

/// Parse a check request: `{"urls": [...]}` or a bare JSON array of strings.
///
/// Entries are trimmed but otherwise kept as submitted, so every entry gets a result.
pub fn parse_check_request(body: &str) -> Result<Vec<UrlTask>, IngestError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| IngestError::Malformed(err.to_string()))?;
    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("urls") {
            None | Some(Value::Null) => return Err(IngestError::MissingUrls),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(IngestError::NotAList),
        },
        _ => return Err(IngestError::NotAList),
    };

    let urls = list
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::String(url) => Ok(url.trim().to_string()),
            _ => Err(IngestError::NotAString { position }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tasks_from_urls(urls))
}

/// Parse pasted text: one URL per line, also split on other whitespace, blanks dropped.
pub fn parse_url_list(raw: &str) -> Vec<UrlTask> {
    tasks_from_urls(raw.split_whitespace().map(ToOwned::to_owned))
}
