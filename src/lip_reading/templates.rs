//! Word templates and sequence scoring.
//!
//! Each template describes the expected mean mouth openness, mean
//! frame-to-frame movement and the openness profile over the three thirds
//! of a word. A buffered sequence is scored against every template with a
//! weighted similarity; the best template above the scoring floor wins.

use crate::constants::{
    MOVEMENT_SCORE_PADDING, MOVEMENT_WEIGHT, OPENNESS_SCORE_PADDING, OPENNESS_WEIGHT, PATTERN_WEIGHT,
    SHORT_SEQUENCE_PATTERN_SCORE,
};
use serde::{Deserialize, Serialize};

/// Reference lip-movement profile of a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTemplate {
    /// Word emitted on a match
    pub name: String,
    /// Expected mean openness ratio
    pub target_open_ratio: f64,
    /// Expected mean frame-to-frame openness change
    pub target_movement: f64,
    /// Typical spoken duration in seconds (informational)
    pub target_duration: f64,
    /// Expected mean openness of the first, middle and last third
    pub pattern_thirds: [f64; 3],
}

impl WordTemplate {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_open_ratio: f64,
        target_movement: f64,
        target_duration: f64,
        pattern_thirds: [f64; 3],
    ) -> Self {
        Self {
            name: name.into(),
            target_open_ratio,
            target_movement,
            target_duration,
            pattern_thirds,
        }
    }

    /// Score sequence summaries against this template
    ///
    /// `thirds` is `None` when the sequence was too short to split.
    #[must_use]
    pub fn score(&self, openness_mean: f64, movement_mean: f64, thirds: Option<[f64; 3]>) -> TemplateScore {
        let openness = 1.0
            - (openness_mean - self.target_open_ratio).abs() / (self.target_open_ratio + OPENNESS_SCORE_PADDING);
        let movement =
            1.0 - (movement_mean - self.target_movement).abs() / (self.target_movement + MOVEMENT_SCORE_PADDING);
        let pattern = thirds.map_or(SHORT_SEQUENCE_PATTERN_SCORE, |thirds| {
            let deviation = thirds
                .iter()
                .zip(self.pattern_thirds.iter())
                .map(|(actual, expected)| (actual - expected).abs())
                .sum::<f64>()
                / 3.0;
            1.0 - deviation
        });

        TemplateScore {
            openness,
            movement,
            pattern,
            total: OPENNESS_WEIGHT * openness + MOVEMENT_WEIGHT * movement + PATTERN_WEIGHT * pattern,
        }
    }
}

/// Component scores of one template comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateScore {
    pub openness: f64,
    pub movement: f64,
    pub pattern: f64,
    /// Weighted combination of the three components
    pub total: f64,
}

/// Best template for a sequence and its total score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch<'a> {
    pub template: &'a WordTemplate,
    pub score: f64,
}

/// The built-in eight-word table, in declared order
#[must_use]
pub fn default_templates() -> Vec<WordTemplate> {
    vec![
        WordTemplate::new("hello", 0.35, 0.12, 0.8, [0.2, 0.4, 0.3]),
        WordTemplate::new("yes", 0.25, 0.08, 0.5, [0.2, 0.3, 0.2]),
        WordTemplate::new("no", 0.20, 0.15, 0.6, [0.2, 0.2, 0.2]),
        WordTemplate::new("thank you", 0.30, 0.10, 1.0, [0.3, 0.4, 0.2]),
        WordTemplate::new("please", 0.28, 0.09, 0.7, [0.2, 0.3, 0.3]),
        WordTemplate::new("help", 0.32, 0.11, 0.6, [0.3, 0.4, 0.2]),
        WordTemplate::new("water", 0.30, 0.10, 0.8, [0.3, 0.3, 0.3]),
        WordTemplate::new("food", 0.35, 0.08, 0.6, [0.4, 0.3, 0.2]),
    ]
}

/// Arithmetic mean, `0.0` for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Means of the three contiguous thirds `[0, n/3)`, `[n/3, 2n/3)`, `[2n/3, n)`
///
/// Returns `None` for fewer than three samples.
#[must_use]
pub fn sequence_thirds(values: &[f64]) -> Option<[f64; 3]> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (first, second) = (n / 3, 2 * n / 3);
    Some([
        mean(&values[..first]),
        mean(&values[first..second]),
        mean(&values[second..]),
    ])
}

/// Find the best-scoring template for a buffered sequence
///
/// A template becomes the running best only when its total strictly exceeds
/// both the previous best and `floor`, so earlier templates win ties.
#[must_use]
pub fn score_sequence<'a>(
    openness: &[f64],
    movement: &[f64],
    templates: &'a [WordTemplate],
    floor: f64,
) -> Option<TemplateMatch<'a>> {
    let openness_mean = mean(openness);
    let movement_mean = mean(movement);
    let thirds = sequence_thirds(openness);

    let mut best: Option<TemplateMatch<'a>> = None;
    for template in templates {
        let score = template.score(openness_mean, movement_mean, thirds).total;
        let best_score = best.map_or(0.0, |m| m.score);
        if score > best_score && score > floor {
            best = Some(TemplateMatch { template, score });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: f64 = 0.6;

    fn diffs(values: &[f64]) -> Vec<f64> {
        values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
    }

    #[test]
    fn test_default_table_order() {
        let names: Vec<String> = default_templates().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            ["hello", "yes", "no", "thank you", "please", "help", "water", "food"]
        );
    }

    #[test]
    fn test_thirds_split_with_integer_division() {
        let values = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 7.0];
        // n = 10: [0, 3), [3, 6), [6, 10)
        assert_eq!(sequence_thirds(&values), Some([1.0, 2.0, 4.0]));
        assert_eq!(sequence_thirds(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_exact_template_profile_scores_one() {
        let template = WordTemplate::new("test", 0.3, 0.1, 0.5, [0.2, 0.4, 0.3]);
        let score = template.score(0.3, 0.1, Some([0.2, 0.4, 0.3]));
        assert!((score.total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_sequence_uses_fallback_pattern() {
        let template = WordTemplate::new("test", 0.3, 0.1, 0.5, [0.2, 0.4, 0.3]);
        let score = template.score(0.3, 0.1, None);
        assert_eq!(score.pattern, 0.5);
        assert!((score.total - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_hello_profile_wins() {
        let templates = default_templates();
        let openness = [0.2, 0.2, 0.2, 0.4, 0.4, 0.4, 0.3, 0.3, 0.3, 0.3];
        let movement = [0.12; 9];

        let best = score_sequence(&openness, &movement, &templates, FLOOR).unwrap();
        assert_eq!(best.template.name, "hello");
        // Mean openness is 0.3 here, so only the openness term falls short
        assert!((best.score - (0.4 * (1.0 - 0.05 / 0.45) + 0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_constant_sequence_prefers_water() {
        let templates = default_templates();
        let openness = [0.3; 10];
        let best = score_sequence(&openness, &diffs(&openness), &templates, FLOOR).unwrap();
        assert_eq!(best.template.name, "water");
        assert!((best.score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_floor_rejects_every_template() {
        let templates = default_templates();
        let openness = [1.0; 10];
        assert!(score_sequence(&openness, &diffs(&openness), &templates, FLOOR).is_none());
    }

    #[test]
    fn test_candidate_between_floor_and_emission_threshold() {
        let templates = default_templates();
        let openness = [0.11; 10];
        let best = score_sequence(&openness, &diffs(&openness), &templates, FLOOR).unwrap();
        assert_eq!(best.template.name, "no");
        assert!(best.score > 0.6 && best.score <= 0.65);
    }

    #[test]
    fn test_ties_keep_declared_order() {
        let templates = vec![
            WordTemplate::new("first", 0.3, 0.1, 0.5, [0.3, 0.3, 0.3]),
            WordTemplate::new("second", 0.3, 0.1, 0.5, [0.3, 0.3, 0.3]),
        ];
        let best = score_sequence(&[0.3; 10], &[0.1; 9], &templates, FLOOR).unwrap();
        assert_eq!(best.template.name, "first");
    }

    #[test]
    fn test_empty_inputs_use_zero_means() {
        assert_eq!(mean(&[]), 0.0);
        let templates = default_templates();
        assert!(score_sequence(&[], &[], &templates, FLOOR).is_none());
    }
}
