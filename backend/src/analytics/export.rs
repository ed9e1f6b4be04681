use super::area::{area_label, leaf_student_tallies, percent, StudentKey, Tally};
use super::evaluate::Outcome;
use super::group_key::GroupDimension;
use super::sort::{walk_leaves, SortSpec};
use super::tree::GroupNode;
use crate::models::Student;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupRow {
    pub path: Vec<String>,
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub total: u32,
    pub correct_percent: f64,
    pub incorrect_percent: f64,
    pub unattempted_percent: f64,
    pub correct_students: String,
    pub incorrect_students: String,
    pub unattempted_students: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatusRow {
    pub path: Vec<String>,
    pub area: String,
    pub status: Outcome,
    pub student: Student,
    pub occurrences: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentTotalRow {
    pub student: Student,
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub attempted: u32,
    pub total: u32,
    pub correct_percent: f64,
    pub incorrect_percent: f64,
    pub unattempted_percent: f64,
}

impl StudentTotalRow {
    fn new(student: Student, t: Tally) -> Self {
        Self {
            student,
            correct: t.correct,
            incorrect: t.incorrect,
            unattempted: t.unattempted,
            attempted: t.attempted(),
            total: t.total(),
            correct_percent: percent(t.correct, t.total()),
            incorrect_percent: percent(t.incorrect, t.total()),
            unattempted_percent: percent(t.unattempted, t.total()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportTables {
    pub columns: Vec<String>,
    pub group_rows: Vec<GroupRow>,
    pub student_status_rows: Vec<StudentStatusRow>,
    pub student_totals: Vec<StudentTotalRow>,
}

fn student_list(tallies: &IndexMap<StudentKey, (Student, Tally)>, outcome: Outcome) -> String {
    tallies
        .values()
        .filter(|(_, t)| t.get(outcome) > 0)
        .map(|(s, _)| s.display())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn export_tables(
    tree: &GroupNode,
    dimensions: &[GroupDimension],
    sort: Option<SortSpec>,
    fallback: Option<&Student>,
) -> ExportTables {
    let mut group_rows = Vec::new();
    let mut student_status_rows = Vec::new();
    let mut totals: IndexMap<StudentKey, (Student, Tally)> = IndexMap::new();

    walk_leaves(tree, sort, &mut |path, stat| {
        let tallies = leaf_student_tallies(stat, fallback);
        let path: Vec<String> = path.iter().map(|k| k.to_string()).collect();
        let keys: Vec<&str> = path.iter().map(String::as_str).collect();
        let area = area_label(dimensions, &keys);
        let total = stat.total();

        group_rows.push(GroupRow {
            path: path.clone(),
            correct: stat.correct,
            incorrect: stat.incorrect,
            unattempted: stat.unattempted,
            total,
            correct_percent: percent(stat.correct, total),
            incorrect_percent: percent(stat.incorrect, total),
            unattempted_percent: percent(stat.unattempted, total),
            correct_students: student_list(&tallies, Outcome::Correct),
            incorrect_students: student_list(&tallies, Outcome::Incorrect),
            unattempted_students: student_list(&tallies, Outcome::Unattempted),
        });

        for outcome in Outcome::ALL {
            for (student, tally) in tallies.values() {
                let occurrences = tally.get(outcome);
                if occurrences == 0 {
                    continue;
                }
                student_status_rows.push(StudentStatusRow {
                    path: path.clone(),
                    area: area.clone(),
                    status: outcome,
                    student: student.clone(),
                    occurrences,
                });
            }
        }

        for (key, (student, tally)) in tallies {
            totals
                .entry(key)
                .or_insert_with(|| (student, Tally::default()))
                .1
                .merge(tally);
        }
    });

    ExportTables {
        columns: dimensions.iter().map(GroupDimension::label).collect(),
        group_rows,
        student_status_rows,
        student_totals: totals
            .into_values()
            .map(|(student, tally)| StudentTotalRow::new(student, tally))
            .collect(),
    }
}
