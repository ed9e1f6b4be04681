use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: String,
    pub roll_number: String,
}

impl Student {
    /// Identity used everywhere students are merged: roll number first, then name.
    pub fn key(&self) -> (&str, &str) {
        (self.roll_number.as_str(), self.name.as_str())
    }

    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.roll_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagType {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub name: String,
}

impl Tag {
    pub fn new(tag_type: &str, name: &str) -> Self {
        Self {
            tag_type: TagType { name: tag_type.to_string() },
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestionOption {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_indexes")]
    pub answer_indexes: Vec<usize>,
    /// `None` means the tag graph was never populated; such questions are left out of analytics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaperQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSection {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<PaperQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<PaperSection>,
}

impl Paper {
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .filter_map(|pq| pq.question.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(alias = "questionId")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_indexes")]
    pub selected_options: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnswers {
    pub section_name: String,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub paper_id: i64,
    pub student: Student,
    #[serde(default)]
    pub section_answers: Vec<SectionAnswers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Stands in for an array element that is not a non-negative integer, so a malformed selection
/// keeps its length and can never match a canonical answer.
pub const INVALID_INDEX: usize = usize::MAX;

fn lenient_indexes<'de, D>(deserializer: D) -> Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let indexes = match raw {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|v| usize::try_from(v).ok())
                    .unwrap_or(INVALID_INDEX)
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(indexes)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: String,
}

fn issue(field: String, text: &str) -> ValidationIssue {
    ValidationIssue { field, issue: text.into() }
}

pub fn validate_paper(paper: &Paper) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if paper.title.trim().is_empty() {
        issues.push(issue("title".into(), "must not be empty"));
    }
    if paper.sections.is_empty() {
        issues.push(issue("sections".into(), "must contain at least one section"));
    }

    let mut section_names = HashSet::new();
    let mut question_ids = HashSet::new();
    for (i, section) in paper.sections.iter().enumerate() {
        if section.name.trim().is_empty() {
            issues.push(issue(format!("sections[{i}].name"), "must not be empty"));
        }
        if !section_names.insert(section.name.as_str()) {
            issues.push(issue(format!("sections[{i}].name"), "must be unique"));
        }

        for (j, pq) in section.questions.iter().enumerate() {
            let field = format!("sections[{i}].questions[{j}].question");
            let Some(q) = pq.question.as_ref() else {
                issues.push(issue(field, "must be present"));
                continue;
            };
            if q.id.trim().is_empty() {
                issues.push(issue(format!("{field}.id"), "must not be empty"));
            } else if !question_ids.insert(q.id.as_str()) {
                issues.push(issue(format!("{field}.id"), "must be unique"));
            }
            if q.answer_indexes.is_empty() {
                issues.push(issue(format!("{field}.answerIndexes"), "must not be empty"));
            }
            let mut seen = HashSet::new();
            for (k, idx) in q.answer_indexes.iter().enumerate() {
                if *idx == INVALID_INDEX {
                    issues.push(issue(
                        format!("{field}.answerIndexes[{k}]"),
                        "must be a non-negative integer",
                    ));
                    continue;
                }
                if !seen.insert(*idx) {
                    issues.push(issue(format!("{field}.answerIndexes[{k}]"), "must be unique"));
                }
                if !q.options.is_empty() && *idx >= q.options.len() {
                    issues.push(issue(
                        format!("{field}.answerIndexes[{k}]"),
                        "must reference an existing option",
                    ));
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

pub fn validate_response(response: &Response) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if response.student.name.trim().is_empty() {
        issues.push(issue("student.name".into(), "must not be empty"));
    }
    if response.student.roll_number.trim().is_empty() {
        issues.push(issue("student.rollNumber".into(), "must not be empty"));
    }
    for (i, section) in response.section_answers.iter().enumerate() {
        for (j, answer) in section.answers.iter().enumerate() {
            if answer.question.trim().is_empty() {
                issues.push(issue(
                    format!("sectionAnswers[{i}].answers[{j}].question"),
                    "must not be empty",
                ));
            }
            for (k, idx) in answer.selected_options.iter().enumerate() {
                if *idx == INVALID_INDEX {
                    issues.push(issue(
                        format!("sectionAnswers[{i}].answers[{j}].selectedOptions[{k}]"),
                        "must be a non-negative integer",
                    ));
                }
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paper() -> Paper {
        serde_json::from_value(serde_json::json!({
            "title": "Unit test",
            "sections": [{
                "name": "Maths",
                "questions": [
                    {"question": {
                        "id": "q1",
                        "answerIndexes": [0, 2],
                        "options": [{"text": "2"}, {"text": "3"}, {"text": "4"}],
                        "tags": [{"type": {"name": "Topic"}, "name": "Even numbers"}]
                    }},
                    {"question": {"id": "q2", "answerIndexes": [1]}}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn validate_paper_ok() {
        assert!(validate_paper(&sample_paper()).is_ok());
    }

    #[test]
    fn validate_paper_negative() {
        let mut paper = sample_paper();
        paper.sections[0].questions[1].question.as_mut().unwrap().id = "q1".into();
        paper.sections[0].questions[0].question.as_mut().unwrap().answer_indexes = vec![0, 5];
        let issues = validate_paper(&paper).err().unwrap();
        assert!(issues.iter().any(|i| i.issue.contains("unique")));
        assert!(issues.iter().any(|i| i.issue.contains("existing option")));
    }

    #[test]
    fn selected_options_are_read_leniently() {
        let answer: Answer =
            serde_json::from_value(serde_json::json!({"question": "q1", "selectedOptions": "b"}))
                .unwrap();
        assert!(answer.selected_options.is_empty());

        let answer: Answer = serde_json::from_value(
            serde_json::json!({"questionId": "q1", "selectedOptions": [2, -1, "x", 0]}),
        )
        .unwrap();
        assert_eq!(answer.question, "q1");
        assert_eq!(answer.selected_options, vec![2, INVALID_INDEX, INVALID_INDEX, 0]);
    }

    #[test]
    fn malformed_selection_elements_are_rejected() {
        let response: Response = serde_json::from_value(serde_json::json!({
            "student": {"name": "Asha", "rollNumber": "R1"},
            "sectionAnswers": [{"sectionName": "Maths", "answers": [
                {"question": "q1", "selectedOptions": [1, -1]},
                {"question": "q2", "selectedOptions": [1, "2"]}
            ]}]
        }))
        .unwrap();
        let issues = validate_response(&response).err().unwrap();
        let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "sectionAnswers[0].answers[0].selectedOptions[1]",
                "sectionAnswers[0].answers[1].selectedOptions[1]",
            ]
        );
    }

    #[test]
    fn malformed_answer_indexes_are_rejected() {
        let paper: Paper = serde_json::from_value(serde_json::json!({
            "title": "Unit test",
            "sections": [{"name": "Maths", "questions": [
                {"question": {"id": "q1", "answerIndexes": [1, "x"]}}
            ]}]
        }))
        .unwrap();
        let issues = validate_paper(&paper).err().unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "sections[0].questions[0].question.answerIndexes[1]");
    }

    #[test]
    fn missing_tags_stay_distinct_from_empty_tags() {
        let paper = sample_paper();
        let qs: Vec<_> = paper.questions().collect();
        assert!(qs[0].tags.as_ref().is_some_and(|t| t.len() == 1));
        assert!(qs[1].tags.is_none());
    }
}
