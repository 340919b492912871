//! Rating adjustment and re-ranking.
//!
//! The raw rating is corrected by a vote-count penalty and an Oscar bonus,
//! then the whole table is re-ranked by the adjusted value. The penalty
//! baseline (`max_votes`) comes from the top 20 titles by *raw* rating only,
//! while every input row receives an adjusted rating and a rank.

use thiserror::Error;
use tracing::debug;

use crate::models::{MovieRecord, RankedMovie};

/// How many top-rated titles feed the vote baseline.
const BASELINE_POOL: usize = 20;

/// Vote deficit granularity: each full block below the baseline costs 0.1.
const VOTES_PER_PENALTY_STEP: i64 = 100_000;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("negative Oscar count: {0}")]
    NegativeOscars(i64),
}

// ── Adjustments ───────────────────────────────────────────────────────────────

/// Step-function bonus for Academy Awards won.
pub fn oscars_adjustment(oscars: i64) -> Result<f64, RankError> {
    match oscars {
        i64::MIN..=-1 => Err(RankError::NegativeOscars(oscars)),
        0 => Ok(0.0),
        1..=2 => Ok(0.3),
        3..=5 => Ok(0.5),
        6..=10 => Ok(1.0),
        _ => Ok(1.5),
    }
}

/// Penalty for trailing the baseline vote count: −0.1 per full 100 000-vote
/// deficit, floor division. Deficits under one step cost nothing.
pub fn vote_penalty(votes: i64, max_votes: i64) -> f64 {
    (max_votes - votes).div_euclid(VOTES_PER_PENALTY_STEP) as f64 * -0.1
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// ── Table adjustment ──────────────────────────────────────────────────────────

/// Adjust and re-rank a whole table.
///
/// Every input row comes back out: the top-20 subset only sets the vote
/// baseline, it does not truncate the result. Ties on adjusted rating keep
/// their input order (stable sort), ranks are contiguous from 1.
pub fn adjust_table(table: &[MovieRecord]) -> Result<Vec<RankedMovie>, RankError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_rating: Vec<&MovieRecord> = table.iter().collect();
    by_rating.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    let max_votes = by_rating
        .iter()
        .take(BASELINE_POOL)
        .map(|r| r.votes)
        .max()
        .unwrap_or(0);

    debug!("Vote baseline from top {} titles: {}", BASELINE_POOL, max_votes);

    let mut rows = Vec::with_capacity(table.len());
    for record in table {
        let adjusted = round1(
            record.rating + vote_penalty(record.votes, max_votes) + oscars_adjustment(record.oscars)?,
        );
        rows.push(RankedMovie {
            rank: 0,
            name: record.name.clone(),
            release_date: record.release_date.clone(),
            rating: record.rating,
            votes: record.votes,
            oscars: record.oscars,
            adjusted_rating: adjusted,
        });
    }

    rows.sort_by(|a, b| b.adjusted_rating.total_cmp(&a.adjusted_rating));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as i64 + 1;
    }

    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
