use super::evaluate::Outcome;
use super::tree::{GroupNode, OptionTagRecord, QuestionRef, StatNode};
use crate::models::Response;
use indexmap::IndexMap;
use std::collections::HashSet;

pub fn dedup_tree(node: &mut GroupNode) {
    match node {
        GroupNode::Leaf(stat) => dedup_stat(stat),
        GroupNode::Branch(children) => children.values_mut().for_each(dedup_tree),
    }
}

pub fn dedup_stat(stat: &mut StatNode) {
    for outcome in Outcome::ALL {
        dedup_question_refs(stat.question_refs_mut(outcome));
    }
    dedup_option_tags(&mut stat.option_tags);
}

fn dedup_question_refs(refs: &mut Vec<QuestionRef>) {
    let mut seen = HashSet::new();
    refs.retain(|q| seen.insert(q.id.clone()));
}

fn dedup_option_tags(records: &mut Vec<OptionTagRecord>) {
    let mut seen = HashSet::new();
    records.retain(|r| {
        let roll = r.student.as_ref().map(|s| s.roll_number.clone()).unwrap_or_default();
        seen.insert((r.option.clone(), r.tag.clone(), r.is_correct, roll))
    });
}

pub fn dedupe_responses(responses: Vec<Response>) -> Vec<Response> {
    let before = responses.len();
    let mut by_id: IndexMap<i64, Response> = IndexMap::new();
    for response in responses {
        by_id.insert(response.id, response);
    }
    if by_id.len() != before {
        tracing::debug!(dropped = before - by_id.len(), "duplicate responses merged");
    }
    by_id.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::group_key::GroupDimension;
    use crate::analytics::tree::fixtures::*;
    use crate::analytics::tree::{build_tree, AnalyticsMode};

    fn qref(id: &str) -> QuestionRef {
        QuestionRef {
            id: id.into(),
            number: 1,
            section: "S".into(),
            correct_students: None,
            incorrect_students: None,
            unattempted_students: None,
        }
    }

    #[test]
    fn double_insert_collapses_by_question_id() {
        let mut stat = StatNode::default();
        stat.record(Outcome::Correct, qref("q1"));
        stat.correct_question_ids.push(qref("q1"));
        dedup_stat(&mut stat);
        assert_eq!(stat.correct_question_ids.len(), 1);
        assert_eq!(stat.correct_question_ids[0].id, "q1");
    }

    #[test]
    fn option_tags_keyed_by_student_roll() {
        let record = |roll: Option<&str>| OptionTagRecord {
            option: "option a".into(),
            tag: "sign slip".into(),
            is_correct: false,
            student: roll.map(|r| student("X", r)),
        };
        let mut stat = StatNode {
            option_tags: vec![record(Some("R1")), record(Some("R1")), record(Some("R2")), record(None), record(None)],
            ..Default::default()
        };
        dedup_stat(&mut stat);
        assert_eq!(stat.option_tags.len(), 3);
    }

    #[test]
    fn dedup_is_idempotent_over_the_whole_tree() {
        let (paper, mut responses) = class();
        responses.push(responses[0].clone());
        let mut root = build_tree(&responses, &paper.sections, &[GroupDimension::Section], AnalyticsMode::Class);
        dedup_tree(&mut root);
        let sizes = |root: &GroupNode| -> Vec<(usize, usize, usize, usize)> {
            root.leaves()
                .iter()
                .map(|s| {
                    (
                        s.correct_question_ids.len(),
                        s.incorrect_question_ids.len(),
                        s.unattempted_question_ids.len(),
                        s.option_tags.len(),
                    )
                })
                .collect()
        };
        let first = sizes(&root);
        dedup_tree(&mut root);
        assert_eq!(first, sizes(&root));
    }

    #[test]
    fn single_response_counters_match_reference_lists() {
        let (paper, responses) = class();
        let dims = [GroupDimension::TagCombination];
        let mut root = build_tree(&responses[1..], &paper.sections, &dims, AnalyticsMode::Student);
        dedup_tree(&mut root);
        for stat in root.leaves() {
            let refs = stat.correct_question_ids.len()
                + stat.incorrect_question_ids.len()
                + stat.unattempted_question_ids.len();
            assert_eq!(stat.total() as usize, refs);
        }
    }

    #[test]
    fn duplicate_responses_are_merged_last_wins() {
        let (_, responses) = class();
        let mut replayed = responses.clone();
        let mut newer = responses[0].clone();
        newer.student.name = "Asha K".into();
        replayed.push(newer);
        let merged = dedupe_responses(replayed);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, 1);
        assert_eq!(merged[0].student.name, "Asha K");
    }
}
