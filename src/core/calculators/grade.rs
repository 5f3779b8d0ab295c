use serde::{Deserialize, Serialize};

use crate::core::error::{CalcError, ensure_positive, ensure_range};

const WEIGHT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub total_questions: Option<u32>,
    pub wrong: Option<u32>,
    pub correct: Option<u32>,
    pub points_per_question: Option<f64>,
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryContribution {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub percent: f64,
    pub letter: String,
    pub points_earned: f64,
    pub points_possible: f64,
    pub correct: Option<u32>,
    pub wrong: Option<u32>,
    pub categories: Vec<CategoryContribution>,
}

pub fn letter_grade(percent: f64) -> String {
    let (letter, floor) = if percent >= 90.0 {
        ('A', 90.0)
    } else if percent >= 80.0 {
        ('B', 80.0)
    } else if percent >= 70.0 {
        ('C', 70.0)
    } else if percent >= 60.0 {
        ('D', 60.0)
    } else {
        return "F".to_string();
    };
    let within = percent - floor;
    if within >= 7.0 {
        format!("{letter}+")
    } else if within < 3.0 {
        format!("{letter}-")
    } else {
        letter.to_string()
    }
}

fn weighted(categories: &[CategoryInput]) -> Result<Output, CalcError> {
    let mut total_weight = 0.0;
    for category in categories {
        if category.name.trim().is_empty() {
            return Err(CalcError::invalid("categories", "every category needs a name"));
        }
        ensure_range("score", category.score, 0.0, 100.0)?;
        ensure_range("weight", category.weight, 0.0, 100.0)?;
        total_weight += category.weight;
    }
    if (total_weight - 100.0).abs() > WEIGHT_TOLERANCE {
        return Err(CalcError::invalid(
            "categories",
            format!("weights must sum to 100 (got {total_weight:.2})"),
        ));
    }

    let contributions = categories
        .iter()
        .map(|c| CategoryContribution {
            name: c.name.clone(),
            score: c.score,
            weight: c.weight,
            contribution: c.score * c.weight / 100.0,
        })
        .collect::<Vec<_>>();
    let percent = contributions.iter().map(|c| c.contribution).sum::<f64>();

    Ok(Output {
        percent,
        letter: letter_grade(percent),
        points_earned: percent,
        points_possible: 100.0,
        correct: None,
        wrong: None,
        categories: contributions,
    })
}

fn by_questions(input: &Input) -> Result<Output, CalcError> {
    let Some(total) = input.total_questions else {
        return Err(CalcError::invalid(
            "totalQuestions",
            "is required unless categories are given",
        ));
    };
    if total == 0 || total > 10_000 {
        return Err(CalcError::invalid("totalQuestions", "must be between 1 and 10000"));
    }

    let wrong = match (input.wrong, input.correct) {
        (Some(wrong), _) if wrong > total => {
            return Err(CalcError::invalid("wrong", "cannot exceed totalQuestions"));
        }
        (Some(wrong), Some(correct)) if wrong.checked_add(correct) != Some(total) => {
            return Err(CalcError::invalid(
                "correct",
                "correct and wrong must add up to totalQuestions",
            ));
        }
        (Some(wrong), _) => wrong,
        (None, Some(correct)) if correct > total => {
            return Err(CalcError::invalid("correct", "cannot exceed totalQuestions"));
        }
        (None, Some(correct)) => total - correct,
        (None, None) => return Err(CalcError::invalid("wrong", "wrong or correct is required")),
    };
    let correct = total - wrong;

    let per_question = input.points_per_question.unwrap_or(1.0);
    ensure_positive("pointsPerQuestion", per_question)?;

    let percent = correct as f64 / total as f64 * 100.0;
    Ok(Output {
        percent,
        letter: letter_grade(percent),
        points_earned: correct as f64 * per_question,
        points_possible: total as f64 * per_question,
        correct: Some(correct),
        wrong: Some(wrong),
        categories: Vec::new(),
    })
}

pub fn calculate(input: &Input) -> Result<Output, CalcError> {
    if input.categories.is_empty() {
        by_questions(input)
    } else {
        weighted(&input.categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn questions(total: u32, wrong: u32) -> Input {
        Input {
            total_questions: Some(total),
            wrong: Some(wrong),
            correct: None,
            points_per_question: None,
            categories: Vec::new(),
        }
    }

    fn category(name: &str, score: f64, weight: f64) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            score,
            weight,
        }
    }

    #[test]
    fn question_count_scoring() {
        let out = calculate(&questions(40, 6)).expect("valid");
        assert_close(out.percent, 85.0, 1e-9);
        assert_eq!(out.letter, "B");
        assert_eq!(out.correct, Some(34));
        assert_close(out.points_possible, 40.0, 1e-9);
    }

    #[test]
    fn correct_count_with_points() {
        let mut input = questions(20, 0);
        input.wrong = None;
        input.correct = Some(19);
        input.points_per_question = Some(5.0);
        let out = calculate(&input).expect("valid");
        assert_eq!(out.letter, "A");
        assert_close(out.points_earned, 95.0, 1e-9);
        assert_close(out.points_possible, 100.0, 1e-9);
    }

    #[test]
    fn letter_modifiers() {
        assert_eq!(letter_grade(100.0), "A+");
        assert_eq!(letter_grade(97.0), "A+");
        assert_eq!(letter_grade(92.99), "A-");
        assert_eq!(letter_grade(89.99), "B+");
        assert_eq!(letter_grade(83.0), "B");
        assert_eq!(letter_grade(82.99), "B-");
        assert_eq!(letter_grade(60.0), "D-");
        assert_eq!(letter_grade(59.99), "F");
    }

    #[test]
    fn weighted_categories() {
        let input = Input {
            total_questions: None,
            wrong: None,
            correct: None,
            points_per_question: None,
            categories: vec![
                category("homework", 95.0, 20.0),
                category("midterm", 78.0, 30.0),
                category("final", 88.0, 50.0),
            ],
        };
        let out = calculate(&input).expect("valid");
        assert_close(out.percent, 19.0 + 23.4 + 44.0, 1e-9);
        assert_eq!(out.letter, "B");
        assert_close(out.categories[1].contribution, 23.4, 1e-9);
    }

    #[test]
    fn rejects_weights_not_summing_to_hundred() {
        let input = Input {
            total_questions: None,
            wrong: None,
            correct: None,
            points_per_question: None,
            categories: vec![category("quiz", 90.0, 40.0), category("exam", 80.0, 50.0)],
        };
        assert_eq!(
            calculate(&input).expect_err("must reject").field(),
            Some("categories")
        );
    }

    #[test]
    fn rejects_more_wrong_than_questions() {
        assert_eq!(
            calculate(&questions(10, 11)).expect_err("must reject").field(),
            Some("wrong")
        );
    }
}
