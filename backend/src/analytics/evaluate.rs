use crate::models::{Answer, INVALID_INDEX};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Unattempted,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Correct, Outcome::Incorrect, Outcome::Unattempted];

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
            Outcome::Unattempted => "unattempted",
        }
    }

    pub fn is_attempted(self) -> bool {
        self != Outcome::Unattempted
    }
}

pub fn evaluate(submitted: Option<&Answer>, answer_indexes: &[usize]) -> Outcome {
    let selected = match submitted {
        Some(answer) if !answer.selected_options.is_empty() => &answer.selected_options,
        _ => return Outcome::Unattempted,
    };
    if selected.len() != answer_indexes.len()
        || selected.contains(&INVALID_INDEX)
        || answer_indexes.contains(&INVALID_INDEX)
    {
        return Outcome::Incorrect;
    }
    let mut expected = answer_indexes.to_vec();
    let mut actual = selected.clone();
    expected.sort_unstable();
    actual.sort_unstable();
    if expected == actual {
        Outcome::Correct
    } else {
        Outcome::Incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(selected: &[usize]) -> Answer {
        Answer { question: "q".into(), selected_options: selected.to_vec() }
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(evaluate(Some(&answer(&[2, 0])), &[0, 2]), Outcome::Correct);
    }

    #[test]
    fn no_partial_credit() {
        assert_eq!(evaluate(Some(&answer(&[0])), &[0, 2]), Outcome::Incorrect);
        assert_eq!(evaluate(Some(&answer(&[0, 1, 2])), &[0, 2]), Outcome::Incorrect);
    }

    #[test]
    fn absent_or_empty_is_unattempted() {
        assert_eq!(evaluate(None, &[1]), Outcome::Unattempted);
        assert_eq!(evaluate(Some(&answer(&[])), &[1]), Outcome::Unattempted);
    }

    #[test]
    fn single_answer() {
        assert_eq!(evaluate(Some(&answer(&[1])), &[1]), Outcome::Correct);
        assert_eq!(evaluate(Some(&answer(&[3])), &[1]), Outcome::Incorrect);
    }

    #[test]
    fn malformed_elements_never_score_correct() {
        assert_eq!(evaluate(Some(&answer(&[1, INVALID_INDEX])), &[1]), Outcome::Incorrect);
        assert_eq!(evaluate(Some(&answer(&[INVALID_INDEX])), &[1]), Outcome::Incorrect);
        assert_eq!(
            evaluate(Some(&answer(&[1, INVALID_INDEX])), &[1, INVALID_INDEX]),
            Outcome::Incorrect
        );
    }

    #[test]
    fn duplicate_selection_does_not_match_distinct_key() {
        assert_eq!(evaluate(Some(&answer(&[0, 0])), &[0, 2]), Outcome::Incorrect);
    }
}
