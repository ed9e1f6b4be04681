use exam_analytics::analytics::{
    self, area_metrics, dedup, parse_dimensions, sort, tree, AnalyticsMode, AnalyticsRequest, GroupNode, Outcome,
    MAX_GROUP_DIMENSIONS,
};
use exam_analytics::models::{Paper, Response};
use serde_json::json;

fn paper() -> Paper {
    serde_json::from_value(json!({
        "id": 1,
        "title": "Properties",
        "sections": [
            {"name": "A", "questions": [
                {"question": {"id": "a1", "answerIndexes": [0], "tags": [
                    {"type": {"name": "Topic"}, "name": "Fractions"},
                    {"type": {"name": "Difficulty"}, "name": "Easy"},
                    {"type": {"name": "Skill"}, "name": "Recall"}
                ]}},
                {"question": {"id": "a2", "answerIndexes": [0, 2], "tags": [
                    {"type": {"name": "Topic"}, "name": "Fractions"},
                    {"type": {"name": "Difficulty"}, "name": "Hard"},
                    {"type": {"name": "option b"}, "name": "Added denominators"}
                ]}},
                {"question": {"id": "a3", "answerIndexes": [1], "tags": [
                    {"type": {"name": "Topic"}, "name": "Decimals"}
                ]}},
                {"question": {"id": "broken", "answerIndexes": [1]}}
            ]},
            {"name": "B", "questions": [
                {"question": {"id": "b1", "answerIndexes": [3], "tags": [
                    {"type": {"name": "Topic"}, "name": "Ratios"},
                    {"type": {"name": "Difficulty"}, "name": "Hard"}
                ]}},
                {}
            ]}
        ]
    }))
    .unwrap()
}

fn responses() -> Vec<Response> {
    serde_json::from_value(json!([
        {"id": 1, "paperId": 1, "student": {"name": "Asha", "rollNumber": "R1"}, "sectionAnswers": [
            {"sectionName": "A", "answers": [
                {"question": "a1", "selectedOptions": [0]},
                {"question": "a2", "selectedOptions": [2, 0]},
                {"question": "a3", "selectedOptions": [0]}
            ]},
            {"sectionName": "B", "answers": [{"question": "b1", "selectedOptions": [3]}]}
        ]},
        {"id": 2, "paperId": 1, "student": {"name": "Bilal", "rollNumber": "R2"}, "sectionAnswers": [
            {"sectionName": "A", "answers": [
                {"question": "a1", "selectedOptions": []},
                {"question": "a2", "selectedOptions": [1]},
                {"question": "a3", "selectedOptions": "garbage"}
            ]}
        ]},
        {"id": 3, "paperId": 1, "student": {"name": "Chen", "rollNumber": "R3"}, "sectionAnswers": [
            {"sectionName": "A", "answers": [{"question": "a2", "selectedOptions": [0]}]},
            {"sectionName": "B", "answers": [{"question": "b1", "selectedOptions": [1, 3]}]}
        ]}
    ]))
    .unwrap()
}

/// Flat count of one outcome over every response and in-scope, well-formed question.
fn flat_count(paper: &Paper, responses: &[Response], outcome: Outcome) -> u64 {
    let mut n = 0;
    for response in responses {
        let answers = analytics::normalize::answer_map(response);
        for section in &paper.sections {
            for q in section.questions.iter().filter_map(|pq| pq.question.as_ref()) {
                if q.tags.is_none() || q.id.is_empty() {
                    continue;
                }
                let submitted = analytics::normalize::lookup(&answers, &section.name, &q.id);
                if analytics::evaluate::evaluate(submitted, &q.answer_indexes) == outcome {
                    n += 1;
                }
            }
        }
    }
    n
}

#[test]
fn exactly_one_outcome_per_response_and_question() {
    let paper = paper();
    let responses = responses();
    let total: u64 = Outcome::ALL.into_iter().map(|o| flat_count(&paper, &responses, o)).sum();
    // 3 responses x 4 well-formed questions
    assert_eq!(total, 12);
}

#[test]
fn root_sums_match_flat_counts_for_every_depth() {
    let paper = paper();
    let responses = responses();
    let all = "section,topic,difficulty,tagtype,skill";
    for depth in 0..=MAX_GROUP_DIMENSIONS {
        let csv = all.split(',').take(depth).collect::<Vec<_>>().join(",");
        let dims = parse_dimensions(&csv, MAX_GROUP_DIMENSIONS);
        assert_eq!(dims.len(), depth);
        let root = analytics::analyze(&paper, responses.clone(), &AnalyticsRequest::class(dims));
        for outcome in Outcome::ALL {
            assert_eq!(
                sort::summed_metric(&root, outcome),
                flat_count(&paper, &responses, outcome),
                "depth {depth}, {outcome:?}"
            );
        }
    }
}

#[test]
fn zero_dimensions_yield_a_single_root_node() {
    let root = analytics::analyze(&paper(), responses(), &AnalyticsRequest::class(vec![]));
    let GroupNode::Leaf(stat) = &root else { panic!("expected leaf root") };
    assert_eq!((stat.correct, stat.incorrect, stat.unattempted), (3, 4, 5));
}

#[test]
fn dedup_twice_changes_nothing() {
    let paper = paper();
    let mut doubled = responses();
    doubled.extend(responses());
    let dims = parse_dimensions("topic,difficulty", MAX_GROUP_DIMENSIONS);
    let mut root = tree::build_tree(&doubled, &paper.sections, &dims, AnalyticsMode::Class);
    dedup::dedup_tree(&mut root);
    let once = root.clone();
    dedup::dedup_tree(&mut root);
    assert_eq!(once, root);
}

#[test]
fn single_student_counters_equal_reference_counts() {
    let paper = paper();
    for response in responses() {
        let dims = parse_dimensions("difficulty,section", MAX_GROUP_DIMENSIONS);
        let root = analytics::analyze(&paper, vec![response], &AnalyticsRequest::student(dims));
        for stat in root.leaves() {
            let refs: usize = Outcome::ALL.into_iter().map(|o| stat.question_refs(o).len()).sum();
            assert_eq!(stat.total() as usize, refs);
        }
    }
}

#[test]
fn two_student_scenario() {
    let paper: Paper = serde_json::from_value(json!({
        "id": 9,
        "title": "One question",
        "sections": [{"name": "Only", "questions": [
            {"question": {"id": "q", "answerIndexes": [1], "tags": []}}
        ]}]
    }))
    .unwrap();
    let responses: Vec<Response> = serde_json::from_value(json!([
        {"id": 1, "student": {"name": "A", "rollNumber": "1"},
         "sectionAnswers": [{"sectionName": "Only", "answers": [{"question": "q", "selectedOptions": [1]}]}]},
        {"id": 2, "student": {"name": "B", "rollNumber": "2"},
         "sectionAnswers": [{"sectionName": "Only", "answers": [{"question": "q", "selectedOptions": []}]}]}
    ]))
    .unwrap();

    let flat = analytics::analyze(&paper, responses.clone(), &AnalyticsRequest::class(vec![]));
    let stat = flat.as_leaf().unwrap();
    assert_eq!((stat.correct, stat.incorrect, stat.unattempted), (1, 0, 1));

    let dims = parse_dimensions("section", MAX_GROUP_DIMENSIONS);
    let grouped = analytics::analyze(&paper, responses, &AnalyticsRequest::class(dims));
    let GroupNode::Branch(children) = &grouped else { panic!("expected branch root") };
    assert_eq!(children.len(), 1);
    let only = children["Only"].as_leaf().unwrap();
    assert_eq!((only.correct, only.incorrect, only.unattempted), (1, 0, 1));
}

#[test]
fn area_rows_cover_every_student_event() {
    let paper = paper();
    let dims = parse_dimensions("topic", MAX_GROUP_DIMENSIONS);
    let root = analytics::analyze(&paper, responses(), &AnalyticsRequest::class(dims.clone()));
    let rows = area_metrics(&root, &dims, None, None);
    assert_eq!(rows.len(), 3);
    for row in &rows {
        let total: u32 = row.areas.iter().map(|a| a.total).sum();
        assert_eq!(total, 4, "{}", row.student.name);
    }
    let chen = rows.iter().find(|r| r.student.roll_number == "R3").unwrap();
    let ratios = chen.areas.iter().find(|a| a.area == "Topic: Ratios").unwrap();
    assert_eq!((ratios.incorrect, ratios.percent), (1, 0.0));
}

#[test]
fn malformed_selection_elements_score_incorrect() {
    let paper: Paper = serde_json::from_value(json!({
        "id": 5,
        "title": "Single answer",
        "sections": [{"name": "Only", "questions": [
            {"question": {"id": "q", "answerIndexes": [1], "tags": []}}
        ]}]
    }))
    .unwrap();
    let responses: Vec<Response> = serde_json::from_value(json!([
        {"id": 1, "student": {"name": "A", "rollNumber": "1"},
         "sectionAnswers": [{"sectionName": "Only", "answers": [{"question": "q", "selectedOptions": [1, -1]}]}]},
        {"id": 2, "student": {"name": "B", "rollNumber": "2"},
         "sectionAnswers": [{"sectionName": "Only", "answers": [{"question": "q", "selectedOptions": [1, "2"]}]}]}
    ]))
    .unwrap();

    let root = analytics::analyze(&paper, responses, &AnalyticsRequest::class(vec![]));
    let stat = root.as_leaf().unwrap();
    assert_eq!((stat.correct, stat.incorrect, stat.unattempted), (0, 2, 0));
}
