//! Parsing of the remote dashboard list.
//!
//! Two payload shapes are accepted. JSON is either a bare array or an object
//! carrying a `dashboards` array, where each entry is a URL string or an object
//! with `url` and optional `id`, `title`, and `dwell_seconds`. Anything that
//! does not start with `[` or `{` is read as a text list with one
//! `url | title | dwell_seconds` entry per line.
//!
//! Invalid entries are skipped one by one; the list as a whole is only
//! rejected when nothing valid remains.

use std::collections::HashSet;
use std::time::Duration;

use rotator_model::{DashboardDescriptor, DashboardId};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::error::ConfigError;

/// Result of parsing a payload that contained at least one valid dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPayload {
    pub descriptors: Vec<DashboardDescriptor>,
    pub skipped: Vec<SkippedEntry>,
}

/// An entry dropped during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based entry position (the line number for text payloads).
    pub position: usize,
    pub reason: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    List(Vec<serde_json::Value>),
    Wrapped { dashboards: Vec<serde_json::Value> },
}

#[derive(Deserialize)]
struct RawObjectEntry {
    #[serde(default)]
    id: Option<String>,
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "dwell")]
    dwell_seconds: Option<f64>,
}

#[derive(Debug, Default)]
struct RawEntry {
    id: Option<String>,
    url: String,
    title: Option<String>,
    dwell_seconds: Option<f64>,
}

pub fn parse_payload(body: &str) -> Result<ParsedPayload, ConfigError> {
    let trimmed = body.trim_start();
    let mut skipped = Vec::new();

    let raw = if trimmed.starts_with('[') || trimmed.starts_with('{') {
        json_entries(trimmed, &mut skipped)?
    } else {
        text_entries(body, &mut skipped)
    };

    let total = raw.len() + skipped.len();
    if total == 0 {
        return Err(ConfigError::Empty);
    }

    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(raw.len());
    for (position, entry) in raw {
        match validate_entry(entry) {
            Ok(descriptor) => {
                if seen.insert(descriptor.id.clone()) {
                    descriptors.push(descriptor);
                } else {
                    skipped.push(SkippedEntry {
                        position,
                        reason: format!("duplicate id '{}'", descriptor.id),
                    });
                }
            }
            Err(reason) => skipped.push(SkippedEntry { position, reason }),
        }
    }

    skipped.sort_by_key(|entry| entry.position);
    for entry in &skipped {
        warn!(
            position = entry.position,
            reason = %entry.reason,
            "skipping dashboard entry"
        );
    }

    if descriptors.is_empty() {
        return Err(ConfigError::Malformed(format!(
            "none of the {total} entries is a valid dashboard"
        )));
    }

    Ok(ParsedPayload {
        descriptors,
        skipped,
    })
}

fn json_entries(
    body: &str,
    skipped: &mut Vec<SkippedEntry>,
) -> Result<Vec<(usize, RawEntry)>, ConfigError> {
    let document: RawDocument = serde_json::from_str(body).map_err(|err| {
        ConfigError::Malformed(format!(
            "expected a JSON array or an object with a `dashboards` array: {err}"
        ))
    })?;
    let values = match document {
        RawDocument::List(values) => values,
        RawDocument::Wrapped { dashboards } => dashboards,
    };

    let mut entries = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let position = idx + 1;
        match value {
            serde_json::Value::String(url) => entries.push((
                position,
                RawEntry {
                    url,
                    ..RawEntry::default()
                },
            )),
            serde_json::Value::Object(_) => {
                match serde_json::from_value::<RawObjectEntry>(value) {
                    Ok(raw) => entries.push((
                        position,
                        RawEntry {
                            id: raw.id,
                            url: raw.url,
                            title: raw.title,
                            dwell_seconds: raw.dwell_seconds,
                        },
                    )),
                    Err(err) => skipped.push(SkippedEntry {
                        position,
                        reason: err.to_string(),
                    }),
                }
            }
            other => skipped.push(SkippedEntry {
                position,
                reason: format!("unexpected entry {other}"),
            }),
        }
    }
    Ok(entries)
}

fn text_entries(
    body: &str,
    skipped: &mut Vec<SkippedEntry>,
) -> Vec<(usize, RawEntry)> {
    let mut entries = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        let position = idx + 1;
        let mut fields = line.split('|').map(str::trim);
        let url = fields.next().unwrap_or_default().to_owned();
        let title = fields
            .next()
            .filter(|title| !title.is_empty())
            .map(str::to_owned);
        let dwell_seconds = match fields.next().filter(|raw| !raw.is_empty()) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(seconds) => Some(seconds),
                Err(_) => {
                    skipped.push(SkippedEntry {
                        position,
                        reason: format!("dwell '{raw}' is not a number"),
                    });
                    continue;
                }
            },
            None => None,
        };

        entries.push((
            position,
            RawEntry {
                id: None,
                url,
                title,
                dwell_seconds,
            },
        ));
    }
    entries
}

/// Drops a `#` comment. A `#` only starts a comment at the beginning of the
/// line or after whitespace, so URL fragments survive.
fn strip_comment(line: &str) -> &str {
    let mut previous = None;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && previous.is_none_or(char::is_whitespace) {
            return &line[..idx];
        }
        previous = Some(ch);
    }
    line
}

fn validate_entry(entry: RawEntry) -> Result<DashboardDescriptor, String> {
    let url = Url::parse(entry.url.trim())
        .map_err(|err| format!("invalid url '{}': {err}", entry.url))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "unsupported scheme '{}' in '{}'",
            url.scheme(),
            url
        ));
    }

    let mut descriptor = DashboardDescriptor::from_url(url);

    if let Some(id) = entry.id.map(|id| id.trim().to_owned())
        && !id.is_empty()
    {
        descriptor = descriptor.with_id(DashboardId::new(id));
    }

    if let Some(title) = entry.title.map(|title| title.trim().to_owned())
        && !title.is_empty()
    {
        descriptor = descriptor.with_title(title);
    }

    if let Some(seconds) = entry.dwell_seconds {
        let dwell = Duration::try_from_secs_f64(seconds)
            .ok()
            .filter(|dwell| !dwell.is_zero())
            .ok_or_else(|| {
                format!("dwell_seconds must be a positive number, got {seconds}")
            })?;
        descriptor = descriptor.with_dwell(dwell);
    }

    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_json_document() {
        let body = r#"{
            "dashboards": [
                {"id": "ci", "url": "https://ci.example.com/", "title": "CI", "dwell_seconds": 45},
                "https://grafana.example.com/d/ops",
                {"url": "https://status.example.com/", "dwell": 12.5}
            ]
        }"#;

        let parsed = parse_payload(body).expect("parse");
        let ids: Vec<_> =
            parsed.descriptors.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(
            ids,
            [
                "ci",
                "https://grafana.example.com/d/ops",
                "https://status.example.com/"
            ]
        );
        assert_eq!(parsed.descriptors[0].title, "CI");
        assert_eq!(parsed.descriptors[0].dwell, Some(Duration::from_secs(45)));
        assert_eq!(parsed.descriptors[1].title, "grafana.example.com");
        assert_eq!(
            parsed.descriptors[2].dwell,
            Some(Duration::from_millis(12_500))
        );
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn skips_malformed_entries_individually() {
        let body = r#"[
            "https://a.example.com/",
            {"title": "missing url"},
            "not a url",
            {"url": "ftp://files.example.com/"},
            {"url": "https://b.example.com/", "dwell_seconds": -3},
            42,
            {"url": "https://c.example.com/"}
        ]"#;

        let parsed = parse_payload(body).expect("parse");

        assert_eq!(parsed.descriptors.len(), 2);
        let positions: Vec<_> =
            parsed.skipped.iter().map(|entry| entry.position).collect();
        assert_eq!(positions, [2, 3, 4, 5, 6]);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let body = r#"[
            {"id": "ops", "url": "https://a.example.com/", "title": "First"},
            {"id": "ops", "url": "https://b.example.com/", "title": "Second"}
        ]"#;

        let parsed = parse_payload(body).expect("parse");

        assert_eq!(parsed.descriptors.len(), 1);
        assert_eq!(parsed.descriptors[0].title, "First");
        assert_eq!(parsed.skipped[0].position, 2);
    }

    #[test]
    fn empty_payloads_are_reported_as_empty() {
        assert_eq!(parse_payload("[]"), Err(ConfigError::Empty));
        assert_eq!(
            parse_payload(r#"{"dashboards": []}"#),
            Err(ConfigError::Empty)
        );
        assert_eq!(
            parse_payload("# nothing here\n\n"),
            Err(ConfigError::Empty)
        );
    }

    #[test]
    fn all_invalid_entries_is_malformed() {
        let err = parse_payload(r#"["nope", {"url": "also nope"}]"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn broken_json_is_malformed() {
        let err = parse_payload(r#"{"dashboards": ["#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));

        let err = parse_payload(r#"{"pages": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn parses_text_list_with_comments() {
        let body = "\
# office wall
https://ci.example.com/ | CI | 20
https://grafana.example.com/   # trailing comment

https://status.example.com/ | | 7
https://bad.example.com/ | Bad | soon
https://grafana.example.com/#/d/net | Network
";

        let parsed = parse_payload(body).expect("parse");

        assert_eq!(parsed.descriptors.len(), 4);
        assert_eq!(parsed.descriptors[0].title, "CI");
        assert_eq!(parsed.descriptors[0].dwell, Some(Duration::from_secs(20)));
        assert_eq!(parsed.descriptors[1].title, "grafana.example.com");
        assert_eq!(parsed.descriptors[2].title, "status.example.com");
        assert_eq!(parsed.descriptors[2].dwell, Some(Duration::from_secs(7)));
        assert_eq!(
            parsed.descriptors[3].url.as_str(),
            "https://grafana.example.com/#/d/net"
        );
        assert_eq!(
            parsed.skipped,
            vec![SkippedEntry {
                position: 6,
                reason: "dwell 'soon' is not a number".into(),
            }]
        );
    }
}
