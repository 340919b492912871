use serde::{Deserialize, Serialize};

/// Sentinel used when a title page carries no known publish date.
pub const NO_RELEASE_DATE: &str = "N/A";

// ── Movie record ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub name: String,
    pub release_date: String, // "YYYY-MM-DD" or "N/A"
    pub rating: f64,
    pub votes: i64,
    pub oscars: i64,
}

// ── JSON-derived fields ───────────────────────────────────────────────────────

/// The four fields mined from the embedded JSON-LD block, before the award
/// count (a separate pass over the same page) is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleFields {
    pub name: String,
    pub release_date: String,
    pub rating: f64,
    pub votes: i64,
}

impl TitleFields {
    /// Finalize into a record. Records are immutable from here on.
    pub fn with_oscars(self, oscars: i64) -> MovieRecord {
        MovieRecord {
            name: self.name,
            release_date: self.release_date,
            rating: self.rating,
            votes: self.votes,
            oscars,
        }
    }
}

// ── Ranked row ────────────────────────────────────────────────────────────────

/// Field order doubles as the CSV column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedMovie {
    pub rank: i64,
    pub name: String,
    pub release_date: String,
    pub rating: f64,
    pub votes: i64,
    pub oscars: i64,
    pub adjusted_rating: f64,
}

impl RankedMovie {
    /// Strip the derived columns back down to the raw record.
    pub fn into_record(self) -> MovieRecord {
        MovieRecord {
            name: self.name,
            release_date: self.release_date,
            rating: self.rating,
            votes: self.votes,
            oscars: self.oscars,
        }
    }
}
