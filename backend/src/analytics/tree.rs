use super::evaluate::{evaluate, Outcome};
use super::group_key::{option_tag_type, resolve_key, GroupDimension};
use super::normalize::{answer_map, lookup};
use crate::models::{PaperSection, Question, Response, Student};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMode {
    Class,
    Student,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRef {
    pub id: String,
    pub number: usize,
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_students: Option<Vec<Student>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect_students: Option<Vec<Student>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unattempted_students: Option<Vec<Student>>,
}

impl QuestionRef {
    pub fn has_student_lists(&self) -> bool {
        self.correct_students.is_some()
            || self.incorrect_students.is_some()
            || self.unattempted_students.is_some()
    }

    pub fn students(&self, outcome: Outcome) -> &[Student] {
        let list = match outcome {
            Outcome::Correct => &self.correct_students,
            Outcome::Incorrect => &self.incorrect_students,
            Outcome::Unattempted => &self.unattempted_students,
        };
        list.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptionTagRecord {
    pub option: String,
    pub tag: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagChip {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatNode {
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub correct_question_ids: Vec<QuestionRef>,
    pub incorrect_question_ids: Vec<QuestionRef>,
    pub unattempted_question_ids: Vec<QuestionRef>,
    pub option_tags: Vec<OptionTagRecord>,
    /// Tags of the last question routed here. A display sample for tag chips, not an aggregate.
    pub tags: Vec<TagChip>,
}

impl StatNode {
    pub fn count(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Correct => self.correct,
            Outcome::Incorrect => self.incorrect,
            Outcome::Unattempted => self.unattempted,
        }
    }

    pub fn total(&self) -> u32 {
        self.correct + self.incorrect + self.unattempted
    }

    pub fn question_refs(&self, outcome: Outcome) -> &[QuestionRef] {
        match outcome {
            Outcome::Correct => &self.correct_question_ids,
            Outcome::Incorrect => &self.incorrect_question_ids,
            Outcome::Unattempted => &self.unattempted_question_ids,
        }
    }

    pub fn question_refs_mut(&mut self, outcome: Outcome) -> &mut Vec<QuestionRef> {
        match outcome {
            Outcome::Correct => &mut self.correct_question_ids,
            Outcome::Incorrect => &mut self.incorrect_question_ids,
            Outcome::Unattempted => &mut self.unattempted_question_ids,
        }
    }

    pub fn record(&mut self, outcome: Outcome, question: QuestionRef) {
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Incorrect => self.incorrect += 1,
            Outcome::Unattempted => self.unattempted += 1,
        }
        self.question_refs_mut(outcome).push(question);
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GroupNode {
    Leaf(StatNode),
    Branch(IndexMap<String, GroupNode>),
}

impl GroupNode {
    pub fn with_depth(depth: usize) -> Self {
        if depth == 0 {
            GroupNode::Leaf(StatNode::default())
        } else {
            GroupNode::Branch(IndexMap::new())
        }
    }

    pub fn as_leaf(&self) -> Option<&StatNode> {
        match self {
            GroupNode::Leaf(stat) => Some(stat),
            GroupNode::Branch(_) => None,
        }
    }

    pub fn child(&self, key: &str) -> Option<&GroupNode> {
        match self {
            GroupNode::Branch(children) => children.get(key),
            GroupNode::Leaf(_) => None,
        }
    }

    pub fn slot(&mut self, keys: &[String]) -> &mut StatNode {
        match self {
            GroupNode::Leaf(stat) => stat,
            GroupNode::Branch(children) => {
                let (head, rest) = match keys.split_first() {
                    Some((head, rest)) => (head.clone(), rest),
                    // Trees are built with uniform depth; a short path parks under an empty key.
                    None => (String::new(), keys),
                };
                children
                    .entry(head)
                    .or_insert_with(|| GroupNode::with_depth(rest.len()))
                    .slot(rest)
            }
        }
    }

    pub fn leaves(&self) -> Vec<&StatNode> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }
}

fn collect_leaves<'n>(node: &'n GroupNode, out: &mut Vec<&'n StatNode>) {
    match node {
        GroupNode::Leaf(stat) => out.push(stat),
        GroupNode::Branch(children) => {
            for child in children.values() {
                collect_leaves(child, out);
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
struct StudentLists {
    correct: Vec<Student>,
    incorrect: Vec<Student>,
    unattempted: Vec<Student>,
}

impl StudentLists {
    fn push(&mut self, outcome: Outcome, student: &Student) {
        let list = match outcome {
            Outcome::Correct => &mut self.correct,
            Outcome::Incorrect => &mut self.incorrect,
            Outcome::Unattempted => &mut self.unattempted,
        };
        if !list.iter().any(|s| s.key() == student.key()) {
            list.push(student.clone());
        }
    }
}

fn eligible(question: &Question) -> bool {
    !question.id.is_empty() && question.tags.is_some()
}

fn class_rollups(responses: &[Response], sections: &[PaperSection]) -> HashMap<String, StudentLists> {
    let mut rollups: HashMap<String, StudentLists> = HashMap::new();
    for response in responses {
        let answers = answer_map(response);
        for section in sections {
            for question in section.questions.iter().filter_map(|pq| pq.question.as_ref()) {
                if !eligible(question) {
                    continue;
                }
                let submitted = lookup(&answers, &section.name, &question.id);
                let outcome = evaluate(submitted, &question.answer_indexes);
                rollups
                    .entry(question.id.clone())
                    .or_default()
                    .push(outcome, &response.student);
            }
        }
    }
    rollups
}

pub fn build_tree(
    responses: &[Response],
    sections: &[PaperSection],
    dimensions: &[GroupDimension],
    mode: AnalyticsMode,
) -> GroupNode {
    let rollups = match mode {
        AnalyticsMode::Class => Some(class_rollups(responses, sections)),
        AnalyticsMode::Student => None,
    };
    let mut root = GroupNode::with_depth(dimensions.len());
    let mut skipped = 0usize;

    for response in responses {
        let answers = answer_map(response);
        for section in sections {
            for (position, pq) in section.questions.iter().enumerate() {
                let Some(question) = pq.question.as_ref().filter(|q| eligible(q)) else {
                    skipped += 1;
                    continue;
                };
                let submitted = lookup(&answers, &section.name, &question.id);
                let outcome = evaluate(submitted, &question.answer_indexes);

                let mut question_ref = QuestionRef {
                    id: question.id.clone(),
                    number: position + 1,
                    section: section.name.clone(),
                    correct_students: None,
                    incorrect_students: None,
                    unattempted_students: None,
                };
                if let Some(lists) = rollups.as_ref().and_then(|r| r.get(&question.id)) {
                    question_ref.correct_students = Some(lists.correct.clone());
                    question_ref.incorrect_students = Some(lists.incorrect.clone());
                    question_ref.unattempted_students = Some(lists.unattempted.clone());
                }

                let keys: Vec<String> = dimensions
                    .iter()
                    .map(|d| resolve_key(question, d, &section.name))
                    .collect();
                let stat = root.slot(&keys);
                stat.record(outcome, question_ref);

                let tags = question.tags.as_deref().unwrap_or_default();
                if let (true, Some(selected)) = (outcome.is_attempted(), submitted) {
                    for &index in &selected.selected_options {
                        let Some(option) = option_tag_type(index) else {
                            continue;
                        };
                        let is_correct = question.answer_indexes.contains(&index);
                        for tag in tags.iter().filter(|t| t.tag_type.name.to_lowercase() == option) {
                            stat.option_tags.push(OptionTagRecord {
                                option: option.clone(),
                                tag: tag.name.clone(),
                                is_correct,
                                student: match mode {
                                    AnalyticsMode::Class => Some(response.student.clone()),
                                    AnalyticsMode::Student => None,
                                },
                            });
                        }
                    }
                }

                stat.tags = tags
                    .iter()
                    .map(|t| TagChip { tag_type: t.tag_type.name.clone(), value: t.name.clone() })
                    .collect();
            }
        }
    }

    tracing::debug!(
        responses = responses.len(),
        dimensions = dimensions.len(),
        skipped,
        "analytics tree built"
    );
    root
}
