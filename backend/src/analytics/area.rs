use super::evaluate::Outcome;
use super::group_key::GroupDimension;
use super::sort::{walk_leaves, SortSpec};
use super::tree::{GroupNode, QuestionRef, StatNode};
use crate::models::Student;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
}

impl Tally {
    pub fn add(&mut self, outcome: Outcome, n: u32) {
        match outcome {
            Outcome::Correct => self.correct += n,
            Outcome::Incorrect => self.incorrect += n,
            Outcome::Unattempted => self.unattempted += n,
        }
    }

    pub fn merge(&mut self, other: Tally) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.unattempted += other.unattempted;
    }

    pub fn get(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Correct => self.correct,
            Outcome::Incorrect => self.incorrect,
            Outcome::Unattempted => self.unattempted,
        }
    }

    pub fn attempted(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn total(&self) -> u32 {
        self.correct + self.incorrect + self.unattempted
    }
}

pub fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(part) * 100.0 / f64::from(total) * 100.0).round() / 100.0
}

pub type StudentKey = (String, String);

fn student_key(student: &Student) -> StudentKey {
    (student.roll_number.clone(), student.name.clone())
}

pub fn distinct_refs(stat: &StatNode) -> Vec<&QuestionRef> {
    let mut seen = HashSet::new();
    Outcome::ALL
        .into_iter()
        .flat_map(|o| stat.question_refs(o))
        .filter(|q| seen.insert(q.id.as_str()))
        .collect()
}

/// Per-student outcome tallies for one stat node.
///
/// Two paths, chosen by data shape:
/// * rich: question references carry class-level student lists; each listed student is
///   credited once per distinct question,
/// * compact: no reference carries lists (single-student trees); the known `fallback` student
///   is credited with the node's own counters.
pub fn leaf_student_tallies(stat: &StatNode, fallback: Option<&Student>) -> IndexMap<StudentKey, (Student, Tally)> {
    let mut tallies: IndexMap<StudentKey, (Student, Tally)> = IndexMap::new();
    let refs = distinct_refs(stat);

    if refs.iter().any(|q| q.has_student_lists()) {
        for question in refs {
            for outcome in Outcome::ALL {
                for student in question.students(outcome) {
                    tallies
                        .entry(student_key(student))
                        .or_insert_with(|| (student.clone(), Tally::default()))
                        .1
                        .add(outcome, 1);
                }
            }
        }
    } else if let Some(student) = fallback.filter(|_| stat.total() > 0) {
        let tally = Tally {
            correct: stat.correct,
            incorrect: stat.incorrect,
            unattempted: stat.unattempted,
        };
        tallies.insert(student_key(student), (student.clone(), tally));
    }
    tallies
}

pub fn area_label(dimensions: &[GroupDimension], path: &[&str]) -> String {
    if path.is_empty() {
        return "Overall".to_string();
    }
    dimensions
        .iter()
        .zip(path)
        .map(|(d, key)| format!("{}: {}", d.label(), key))
        .collect::<Vec<_>>()
        .join(" / ")
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AreaMetric {
    pub area: String,
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub total: u32,
    pub percent: f64,
}

impl AreaMetric {
    fn from_tally(area: String, tally: Tally) -> Self {
        Self {
            area,
            correct: tally.correct,
            incorrect: tally.incorrect,
            unattempted: tally.unattempted,
            total: tally.total(),
            percent: percent(tally.correct, tally.total()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentAreaMetrics {
    pub student: Student,
    pub areas: Vec<AreaMetric>,
}

pub fn area_metrics(
    tree: &GroupNode,
    dimensions: &[GroupDimension],
    sort: Option<SortSpec>,
    fallback: Option<&Student>,
) -> Vec<StudentAreaMetrics> {
    let mut students: IndexMap<StudentKey, (Student, IndexMap<String, Tally>)> = IndexMap::new();
    walk_leaves(tree, sort, &mut |path, stat| {
        let area = area_label(dimensions, path);
        for (key, (student, tally)) in leaf_student_tallies(stat, fallback) {
            students
                .entry(key)
                .or_insert_with(|| (student, IndexMap::new()))
                .1
                .entry(area.clone())
                .or_default()
                .merge(tally);
        }
    });

    students
        .into_values()
        .map(|(student, areas)| StudentAreaMetrics {
            student,
            areas: areas.into_iter().map(|(area, t)| AreaMetric::from_tally(area, t)).collect(),
        })
        .collect()
}

pub fn weak_areas(metrics: &[StudentAreaMetrics], threshold: f64) -> Vec<StudentAreaMetrics> {
    metrics
        .iter()
        .filter_map(|m| {
            let mut areas: Vec<AreaMetric> = m
                .areas
                .iter()
                .filter(|a| a.total > 0 && a.percent < threshold)
                .cloned()
                .collect();
            if areas.is_empty() {
                return None;
            }
            areas.sort_by(|a, b| a.percent.total_cmp(&b.percent));
            Some(StudentAreaMetrics { student: m.student.clone(), areas })
        })
        .collect()
}
