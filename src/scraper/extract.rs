//! Extraction of movie data from a title page.
//!
//! Two independent passes over one parsed document: the JSON-LD metadata
//! block yields name / release date / rating / votes, and the awards
//! metadata labels yield the Oscar count. Either pass may run first.

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{MovieRecord, TitleFields, NO_RELEASE_DATE};

static JSON_LD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

static AWARD_LABEL_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a.ipc-metadata-list-item__label.ipc-metadata-list-item__label--link").unwrap()
});

static WON_OSCARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Won(.+?)Oscars").unwrap());
static FIRST_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON-LD metadata block in page")]
    JsonLdMissing,

    #[error("malformed JSON-LD payload")]
    MalformedJson(#[from] serde_json::Error),

    #[error("required field `{0}` missing from JSON-LD")]
    MissingField(&'static str),
}

// ── JSON-LD contract ──────────────────────────────────────────────────────────

/// The slice of the schema.org Movie payload we care about. Everything is
/// optional at the serde layer; required fields are enforced explicitly so
/// an absence surfaces with the field name instead of a generic decode error.
#[derive(Debug, Deserialize)]
struct LinkedTitle {
    name: Option<String>,
    #[serde(rename = "datePublished")]
    date_published: Option<String>,
    #[serde(rename = "aggregateRating")]
    aggregate_rating: Option<AggregateRating>,
}

#[derive(Debug, Deserialize)]
struct AggregateRating {
    #[serde(rename = "ratingValue")]
    rating_value: Option<f64>,
    #[serde(rename = "ratingCount")]
    rating_count: Option<i64>,
}

// ── Passes ────────────────────────────────────────────────────────────────────

/// Locate the JSON-LD script block and parse its text content.
pub fn extract_embedded_json(doc: &Html) -> Result<Value, ExtractError> {
    let script = doc
        .select(&JSON_LD_SEL)
        .next()
        .ok_or(ExtractError::JsonLdMissing)?;
    let text: String = script.text().collect();
    Ok(serde_json::from_str(&text)?)
}

/// Pull the four JSON-derived fields out of a parsed JSON-LD object.
///
/// `name` arrives entity-escaped ("Knives &amp; Fog") and is decoded to a
/// display string. A missing publish date is the single tolerated absence:
/// it resolves to "N/A" with a warning naming the affected title.
pub fn extract_title_fields(json: &Value) -> Result<TitleFields, ExtractError> {
    let data = LinkedTitle::deserialize(json)?;

    let name = data.name.ok_or(ExtractError::MissingField("name"))?;
    let name = html_escape::decode_html_entities(&name).into_owned();

    let aggregate = data
        .aggregate_rating
        .ok_or(ExtractError::MissingField("aggregateRating"))?;
    let rating = aggregate
        .rating_value
        .ok_or(ExtractError::MissingField("aggregateRating.ratingValue"))?;
    let votes = aggregate
        .rating_count
        .ok_or(ExtractError::MissingField("aggregateRating.ratingCount"))?;

    let release_date = match data.date_published {
        Some(date) => date,
        None => {
            warn!("No publish date for {:?}, defaulting to {}", name, NO_RELEASE_DATE);
            NO_RELEASE_DATE.to_string()
        }
    };

    Ok(TitleFields {
        name,
        release_date,
        rating,
        votes,
    })
}

/// Count Oscars won by scanning the awards metadata labels for text like
/// "Won 11 Oscars". When several labels match, the last one scanned wins
/// (a sequential overwrite, not a max). No match means zero.
pub fn extract_award_count(doc: &Html) -> i64 {
    let mut oscars = 0;

    for label in doc.select(&AWARD_LABEL_SEL) {
        let text: String = label.text().collect();
        if WON_OSCARS_RE.is_match(&text) {
            if let Some(n) = FIRST_INT_RE.find(&text).and_then(|m| m.as_str().parse().ok()) {
                debug!("Found Oscars: {} in {:?}", n, text.trim());
                oscars = n;
            }
        }
    }

    oscars
}

/// Full per-page extraction: parse once, run both passes, merge.
pub fn extract_record(html: &str) -> Result<MovieRecord, ExtractError> {
    let doc = Html::parse_document(html);
    let fields = extract_title_fields(&extract_embedded_json(&doc)?)?;
    let oscars = extract_award_count(&doc);
    Ok(fields.with_oscars(oscars))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ld_json: &str, awards: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head>
            <script type="application/ld+json">{ld_json}</script>
            </head><body>
            <section data-testid="Awards">{awards}</section>
            </body></html>"#
        )
    }

    fn award_label(text: &str) -> String {
        format!(
            r#"<a class="ipc-metadata-list-item__label ipc-metadata-list-item__label--link" href="/awards/">{text}</a>"#
        )
    }

    const FULL_JSON: &str = r#"{
        "@type": "Movie",
        "name": "Dust &amp; Echoes",
        "datePublished": "1994-10-14",
        "aggregateRating": {
            "@type": "AggregateRating",
            "ratingCount": 2800000,
            "bestRating": 10,
            "worstRating": 1,
            "ratingValue": 9.3
        }
    }"#;

    #[test]
    fn test_extract_record_full_page() {
        let html = page(FULL_JSON, &award_label("Won 7 Oscars"));
        let record = extract_record(&html).unwrap();

        assert_eq!(record.name, "Dust & Echoes");
        assert_eq!(record.release_date, "1994-10-14");
        assert_eq!(record.rating, 9.3);
        assert_eq!(record.votes, 2_800_000);
        assert_eq!(record.oscars, 7);
    }

    #[test]
    fn test_missing_publish_date_defaults() {
        let json: Value = serde_json::from_str(
            r#"{"name": "The Silent Engine",
                "aggregateRating": {"ratingValue": 8.2, "ratingCount": 91609}}"#,
        )
        .unwrap();

        let fields = extract_title_fields(&json).unwrap();
        assert_eq!(fields.name, "The Silent Engine");
        assert_eq!(fields.release_date, NO_RELEASE_DATE);
        assert_eq!(fields.rating, 8.2);
        assert_eq!(fields.votes, 91609);
    }

    #[test]
    fn test_missing_required_fields() {
        let no_name: Value = serde_json::from_str(
            r#"{"aggregateRating": {"ratingValue": 8.0, "ratingCount": 1}}"#,
        )
        .unwrap();
        assert!(matches!(
            extract_title_fields(&no_name),
            Err(ExtractError::MissingField("name"))
        ));

        let no_aggregate: Value = serde_json::from_str(r#"{"name": "Lone Reel"}"#).unwrap();
        assert!(matches!(
            extract_title_fields(&no_aggregate),
            Err(ExtractError::MissingField("aggregateRating"))
        ));

        let no_votes: Value = serde_json::from_str(
            r#"{"name": "Lone Reel", "aggregateRating": {"ratingValue": 8.0}}"#,
        )
        .unwrap();
        assert!(matches!(
            extract_title_fields(&no_votes),
            Err(ExtractError::MissingField("aggregateRating.ratingCount"))
        ));
    }

    #[test]
    fn test_missing_json_ld_block() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert!(matches!(
            extract_embedded_json(&doc),
            Err(ExtractError::JsonLdMissing)
        ));
    }

    #[test]
    fn test_malformed_json_ld_block() {
        let html = page("{not valid json", "");
        let doc = Html::parse_document(&html);
        assert!(matches!(
            extract_embedded_json(&doc),
            Err(ExtractError::MalformedJson(_))
        ));
    }

    #[test]
    fn test_award_count_absent_is_zero() {
        let html = page(FULL_JSON, &award_label("Top rated movie #1"));
        let doc = Html::parse_document(&html);
        assert_eq!(extract_award_count(&doc), 0);
    }

    #[test]
    fn test_award_count_nominations_do_not_match() {
        let html = page(FULL_JSON, &award_label("Nominated for 5 Oscars"));
        let doc = Html::parse_document(&html);
        assert_eq!(extract_award_count(&doc), 0);
    }

    #[test]
    fn test_award_count_last_match_wins() {
        let awards = format!(
            "{}{}{}",
            award_label("Won 3 Oscars"),
            award_label("152 wins &amp; 101 nominations total"),
            award_label("Won 11 Oscars"),
        );
        let html = page(FULL_JSON, &awards);
        let doc = Html::parse_document(&html);
        assert_eq!(extract_award_count(&doc), 11);
    }
}
