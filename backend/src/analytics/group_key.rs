use crate::models::{Question, Tag};
use serde::Serialize;
use std::collections::HashSet;

/// Default cap on grouping levels per request.
pub const MAX_GROUP_DIMENSIONS: usize = 5;

const SECTION: &str = "section";
const TAG_COMBINATION: &str = "tagtype";
const OPTION_TAG_PREFIX: &str = "option ";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupDimension {
    Section,
    TagCombination,
    TagType(String),
}

impl GroupDimension {
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_lowercase();
        match name.as_str() {
            "" => None,
            SECTION => Some(GroupDimension::Section),
            TAG_COMBINATION => Some(GroupDimension::TagCombination),
            _ => Some(GroupDimension::TagType(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupDimension::Section => SECTION,
            GroupDimension::TagCombination => TAG_COMBINATION,
            GroupDimension::TagType(name) => name,
        }
    }

    pub fn label(&self) -> String {
        match self {
            GroupDimension::Section => "Section".to_string(),
            GroupDimension::TagCombination => "Tags".to_string(),
            GroupDimension::TagType(name) => capitalize(name),
        }
    }
}

pub fn parse_dimensions(csv: &str, limit: usize) -> Vec<GroupDimension> {
    csv.split(',')
        .filter_map(GroupDimension::parse)
        .take(limit)
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn find_tag<'q>(tags: &'q [Tag], type_name: &str) -> Option<&'q Tag> {
    let wanted = type_name.trim().to_lowercase();
    tags.iter().find(|t| t.tag_type.name.to_lowercase() == wanted)
}

pub fn resolve_key(question: &Question, dimension: &GroupDimension, section_name: &str) -> String {
    let tags = question.tags.as_deref().unwrap_or_default();
    match dimension {
        GroupDimension::Section => section_name.to_string(),
        GroupDimension::TagCombination => tags
            .iter()
            .map(|t| format!("{}: {}", t.tag_type.name, t.name))
            .collect::<Vec<_>>()
            .join(", "),
        GroupDimension::TagType(name) => match find_tag(tags, name) {
            Some(tag) => tag.name.clone(),
            None => format!("Unknown {}", capitalize(name)),
        },
    }
}

pub fn option_tag_type(index: usize) -> Option<String> {
    let offset = u8::try_from(index).ok().filter(|i| *i < 26)?;
    Some(format!("{OPTION_TAG_PREFIX}{}", (b'a' + offset) as char))
}

pub fn is_option_tag_type(type_name: &str) -> bool {
    let lower = type_name.to_lowercase();
    lower
        .strip_prefix(OPTION_TAG_PREFIX)
        .is_some_and(|rest| rest.len() == 1 && rest.chars().all(|c| c.is_ascii_lowercase()))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupField {
    pub value: String,
    pub label: String,
}

pub fn group_fields<'q>(questions: impl IntoIterator<Item = &'q Question>) -> Vec<GroupField> {
    let mut fields = vec![GroupField { value: SECTION.to_string(), label: "Section".to_string() }];
    let mut seen: HashSet<String> = HashSet::from([SECTION.to_string()]);
    for question in questions {
        for tag in question.tags.as_deref().unwrap_or_default() {
            let value = tag.tag_type.name.trim().to_lowercase();
            if value.is_empty() || is_option_tag_type(&value) || value == TAG_COMBINATION {
                continue;
            }
            if seen.insert(value.clone()) {
                fields.push(GroupField { value, label: tag.tag_type.name.trim().to_string() });
            }
        }
    }
    fields
}
