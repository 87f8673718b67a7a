/// Share of positive reviews as a whole percentage.
///
/// `round(positive / (positive + negative) * 100)`, and 0 when there are no
/// reviews at all.
pub fn review_score(positive: u64, negative: u64) -> u8 {
    let total = positive.saturating_add(negative);
    if total == 0 {
        return 0;
    }
    ((positive as f64 / total as f64) * 100.0).round() as u8
}

/// Store-style summary band for a 0-100 review score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewLabel {
    OverwhelminglyPositive,
    VeryPositive,
    Positive,
    Mixed,
    Negative,
    VeryNegative,
}

impl ReviewLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            95.. => ReviewLabel::OverwhelminglyPositive,
            85..=94 => ReviewLabel::VeryPositive,
            70..=84 => ReviewLabel::Positive,
            40..=69 => ReviewLabel::Mixed,
            20..=39 => ReviewLabel::Negative,
            _ => ReviewLabel::VeryNegative,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewLabel::OverwhelminglyPositive => "Overwhelmingly Positive",
            ReviewLabel::VeryPositive => "Very Positive",
            ReviewLabel::Positive => "Positive",
            ReviewLabel::Mixed => "Mixed",
            ReviewLabel::Negative => "Negative",
            ReviewLabel::VeryNegative => "Very Negative",
        }
    }
}

pub fn review_label(score: u8) -> &'static str {
    ReviewLabel::from_score(score).as_str()
}
