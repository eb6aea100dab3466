//! Status classification policy.
//!
//! The whole policy lives in [`RULES`]: an ordered table evaluated top to
//! bottom where the first matching rule decides the status. Anything no rule
//! matches is [`Status::Unknown`]. `Status::Failed` is never produced here;
//! it belongs to fetches that did not complete.

use crate::Status;

/// Facts derived from one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SignalSet {
    pub http_status: Option<u16>,
    pub dead_phrase_matched: bool,
    pub private_phrase_matched: bool,
    pub media_present: bool,
}

/// One `(predicate, status)` row of the classification table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&SignalSet) -> bool,
    pub status: Status,
}

/// Dead-phrase is checked before media: removed posts can keep cached meta tags.
pub static RULES: [Rule; 4] = [
    Rule {
        name: "http-404",
        matches: |s| s.http_status == Some(404),
        status: Status::Dead,
    },
    Rule {
        name: "dead-phrase",
        matches: |s| s.dead_phrase_matched,
        status: Status::Dead,
    },
    Rule {
        name: "private-phrase",
        matches: |s| s.private_phrase_matched,
        status: Status::Private,
    },
    Rule {
        name: "media-present",
        matches: |s| s.media_present,
        status: Status::Active,
    },
];

pub fn classify(signals: &SignalSet) -> Status {
    classify_with(&RULES, signals)
}

pub fn classify_with(rules: &[Rule], signals: &SignalSet) -> Status {
    rules
        .iter()
        .find(|rule| (rule.matches)(signals))
        .map(|rule| rule.status.clone())
        .unwrap_or(Status::Unknown)
}

/// Name of the rule that decides `signals`, if any.
pub fn matching_rule(signals: &SignalSet) -> Option<&'static str> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(signals))
        .map(|rule| rule.name)
}
