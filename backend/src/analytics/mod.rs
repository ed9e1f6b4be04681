pub mod area;
pub mod dedup;
pub mod evaluate;
pub mod export;
pub mod group_key;
pub mod normalize;
pub mod sort;
pub mod tree;

pub use area::{area_metrics, weak_areas, AreaMetric, StudentAreaMetrics, Tally};
pub use evaluate::Outcome;
pub use export::{export_tables, ExportTables};
pub use group_key::{group_fields, parse_dimensions, GroupDimension, GroupField, MAX_GROUP_DIMENSIONS};
pub use sort::{SortDirection, SortSpec};
pub use tree::{AnalyticsMode, GroupNode, StatNode};

use crate::models::{Paper, Response};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct AnalyticsRequest {
    pub dimensions: Vec<GroupDimension>,
    pub mode: AnalyticsMode,
    pub sort: Option<SortSpec>,
}

impl AnalyticsRequest {
    pub fn class(dimensions: Vec<GroupDimension>) -> Self {
        Self { dimensions, mode: AnalyticsMode::Class, sort: None }
    }

    pub fn student(dimensions: Vec<GroupDimension>) -> Self {
        Self { dimensions, mode: AnalyticsMode::Student, sort: None }
    }

    pub fn sorted(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }
}

pub fn analyze(paper: &Paper, responses: Vec<Response>, request: &AnalyticsRequest) -> GroupNode {
    let responses = dedup::dedupe_responses(responses);
    let mut root = tree::build_tree(&responses, &paper.sections, &request.dimensions, request.mode);
    dedup::dedup_tree(&mut root);
    if let Some(spec) = request.sort {
        sort::sort_tree(&mut root, spec);
    }
    root
}

pub fn totals(root: &GroupNode) -> Tally {
    let mut tally = Tally::default();
    for outcome in Outcome::ALL {
        let sum = sort::summed_metric(root, outcome);
        tally.add(outcome, u32::try_from(sum).unwrap_or(u32::MAX));
    }
    tally
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub dimensions: Vec<String>,
    pub labels: Vec<String>,
    pub totals: Tally,
    pub tree: GroupNode,
}

impl AnalyticsReport {
    pub fn new(request: &AnalyticsRequest, tree: GroupNode) -> Self {
        Self {
            dimensions: request.dimensions.iter().map(|d| d.as_str().to_string()).collect(),
            labels: request.dimensions.iter().map(GroupDimension::label).collect(),
            totals: totals(&tree),
            tree,
        }
    }
}
