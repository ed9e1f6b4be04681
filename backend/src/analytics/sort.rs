use super::evaluate::Outcome;
use super::tree::{GroupNode, StatNode};
use indexmap::IndexMap;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

pub fn parse_metric(raw: &str) -> Option<Outcome> {
    match raw.trim().to_lowercase().as_str() {
        "correct" => Some(Outcome::Correct),
        "incorrect" => Some(Outcome::Incorrect),
        "unattempted" => Some(Outcome::Unattempted),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub metric: Outcome,
    pub direction: SortDirection,
}

pub fn summed_metric(node: &GroupNode, metric: Outcome) -> u64 {
    match node {
        GroupNode::Leaf(stat) => u64::from(stat.count(metric)),
        GroupNode::Branch(children) => children.values().map(|c| summed_metric(c, metric)).sum(),
    }
}

fn compare(a: &GroupNode, b: &GroupNode, spec: SortSpec) -> Ordering {
    let ord = summed_metric(a, spec.metric).cmp(&summed_metric(b, spec.metric));
    match spec.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

pub fn ordered_children<'a>(
    children: &'a IndexMap<String, GroupNode>,
    sort: Option<SortSpec>,
) -> Vec<(&'a String, &'a GroupNode)> {
    let mut ordered: Vec<_> = children.iter().collect();
    if let Some(spec) = sort {
        ordered.sort_by(|(_, a), (_, b)| compare(a, b, spec));
    }
    ordered
}

pub fn sort_tree(node: &mut GroupNode, sort: SortSpec) {
    if let GroupNode::Branch(children) = node {
        children.sort_by(|_, a, _, b| compare(a, b, sort));
        children.values_mut().for_each(|c| sort_tree(c, sort));
    }
}

pub fn walk_leaves<'a, F>(node: &'a GroupNode, sort: Option<SortSpec>, visit: &mut F)
where
    F: FnMut(&[&'a str], &'a StatNode),
{
    let mut path = Vec::new();
    walk(node, sort, &mut path, visit);
}

fn walk<'a, F>(node: &'a GroupNode, sort: Option<SortSpec>, path: &mut Vec<&'a str>, visit: &mut F)
where
    F: FnMut(&[&'a str], &'a StatNode),
{
    match node {
        GroupNode::Leaf(stat) => visit(path.as_slice(), stat),
        GroupNode::Branch(children) => {
            for (key, child) in ordered_children(children, sort) {
                path.push(key.as_str());
                walk(child, sort, path, visit);
                path.pop();
            }
        }
    }
}
