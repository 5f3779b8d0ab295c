use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_range};
use crate::core::types::round_to;

pub const STANDARD_SLOPE: f64 = 113.0;
pub const MAX_HANDICAP_INDEX: f64 = 54.0;
pub const SCORING_RECORD_LEN: usize = 20;

// (min rounds, max rounds, best N counted, adjustment)
const WHS_TABLE: [(usize, usize, usize, f64); 11] = [
    (3, 3, 1, -2.0),
    (4, 4, 1, -1.0),
    (5, 5, 1, 0.0),
    (6, 6, 2, -1.0),
    (7, 8, 2, 0.0),
    (9, 11, 3, 0.0),
    (12, 14, 4, 0.0),
    (15, 16, 5, 0.0),
    (17, 18, 6, 0.0),
    (19, 19, 7, 0.0),
    (20, 20, 8, 0.0),
];

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub score: f64,
    pub course_rating: f64,
    pub slope_rating: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub rounds: Vec<Round>,
    pub score: Option<f64>,
    pub course_rating: Option<f64>,
    pub slope_rating: Option<f64>,
    pub handicap_index: Option<f64>,
    pub par: Option<f64>,
    pub target_course_rating: Option<f64>,
    pub target_slope_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandicapIndex {
    pub value: f64,
    pub rounds_considered: usize,
    pub differentials_counted: usize,
    pub adjustment: f64,
    pub used_indices: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub differentials: Vec<f64>,
    pub handicap: Option<HandicapIndex>,
    pub handicap_index: Option<f64>,
    pub course_handicap: Option<i32>,
}

pub fn score_differential(adjusted_gross_score: f64, course_rating: f64, slope_rating: f64) -> f64 {
    (adjusted_gross_score - course_rating) * STANDARD_SLOPE / slope_rating
}

/// Differentials are ordered oldest first; only the most recent 20 count.
pub fn handicap_index(differentials: &[f64]) -> Option<HandicapIndex> {
    let start = differentials.len().saturating_sub(SCORING_RECORD_LEN);
    let recent = &differentials[start..];
    let &(_, _, best_n, adjustment) = WHS_TABLE
        .iter()
        .find(|(lo, hi, _, _)| (*lo..=*hi).contains(&recent.len()))?;

    let mut ranked = recent
        .iter()
        .copied()
        .enumerate()
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let best = &ranked[..best_n];
    let average = best.iter().map(|(_, d)| d).sum::<f64>() / best_n as f64;
    let value = round_to(average + adjustment, 1).min(MAX_HANDICAP_INDEX);

    let mut used_indices = best.iter().map(|(idx, _)| start + idx).collect::<Vec<_>>();
    used_indices.sort_unstable();

    Some(HandicapIndex {
        value,
        rounds_considered: recent.len(),
        differentials_counted: best_n,
        adjustment,
        used_indices,
    })
}

pub fn course_handicap(index: f64, slope_rating: f64, course_rating: f64, par: f64) -> i32 {
    (index * slope_rating / STANDARD_SLOPE + (course_rating - par)).round() as i32
}

fn collect_rounds(input: &Input) -> Result<Vec<Round>, CalcError> {
    let mut rounds = input.rounds.clone();
    match (input.score, input.course_rating, input.slope_rating) {
        (Some(score), Some(course_rating), Some(slope_rating)) => rounds.push(Round {
            score,
            course_rating,
            slope_rating,
        }),
        (None, _, _) => {}
        _ => {
            return Err(CalcError::invalid(
                "score",
                "a single round needs score, courseRating and slopeRating",
            ));
        }
    }
    Ok(rounds)
}

fn validate_round(round: &Round) -> Result<(), CalcError> {
    ensure_range("score", round.score, 1.0, 200.0)?;
    ensure_range("courseRating", round.course_rating, 20.0, 90.0)?;
    ensure_range("slopeRating", round.slope_rating, 55.0, 155.0)
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    let rounds = collect_rounds(input)?;
    if rounds.is_empty() && input.handicap_index.is_none() {
        return Err(CalcError::invalid(
            "rounds",
            "at least one round or a handicapIndex is required",
        ));
    }
    for round in &rounds {
        validate_round(round)?;
    }
    if let Some(index) = input.handicap_index {
        ensure_range("handicapIndex", index, -10.0, MAX_HANDICAP_INDEX)?;
    }

    let differentials = rounds
        .iter()
        .map(|r| score_differential(r.score, r.course_rating, r.slope_rating))
        .collect::<Vec<_>>();
    let handicap = handicap_index(&differentials);
    let resolved_index = input
        .handicap_index
        .or_else(|| handicap.as_ref().map(|h| h.value));

    let course_handicap = match (resolved_index, input.par) {
        (Some(index), Some(par)) => {
            ensure_range("par", par, 27.0, 80.0)?;
            let last = rounds.last();
            let slope = input
                .target_slope_rating
                .or(last.map(|r| r.slope_rating))
                .unwrap_or(STANDARD_SLOPE);
            let rating = input
                .target_course_rating
                .or(last.map(|r| r.course_rating))
                .unwrap_or(par);
            ensure_range("targetSlopeRating", slope, 55.0, 155.0)?;
            ensure_range("targetCourseRating", rating, 20.0, 90.0)?;
            Some(course_handicap(index, slope, rating, par))
        }
        _ => None,
    };

    Ok(Output {
        differentials,
        handicap,
        handicap_index: resolved_index,
        course_handicap,
    })
}
