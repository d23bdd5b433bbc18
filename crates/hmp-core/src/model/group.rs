//! Result tree nodes.

use serde::{Deserialize, Serialize};

use super::result::ExecutionResult;

/// Group number used when no case id yields a leading segment.
pub const FALLBACK_GROUP_NUMBER: &str = "0";

/// A node aggregating case outcomes or nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestGroup {
    pub number: String,
    pub name: String,
    pub description: String,
    pub group_items: Vec<GroupItem>,
}

/// Either a nested group or a case outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupItem {
    Group(TestGroup),
    Case(ExecutionResult),
}

impl TestGroup {
    /// Build a group of case outcomes, numbered after the first case.
    pub fn of_cases(
        name: impl Into<String>,
        description: impl Into<String>,
        results: Vec<ExecutionResult>,
    ) -> Self {
        let number = group_number(results.first().map(|r| r.number.as_str()));
        Self {
            number,
            name: name.into(),
            description: description.into(),
            group_items: results.into_iter().map(GroupItem::Case).collect(),
        }
    }

    /// Every case outcome in this subtree, depth-first.
    pub fn cases(&self) -> Vec<&ExecutionResult> {
        let mut out = Vec::new();
        for item in &self.group_items {
            match item {
                GroupItem::Case(result) => out.push(result),
                GroupItem::Group(group) => out.extend(group.cases()),
            }
        }
        out
    }

    /// Mutable variant of [`TestGroup::cases`].
    pub fn cases_mut(&mut self) -> Vec<&mut ExecutionResult> {
        let mut out = Vec::new();
        for item in &mut self.group_items {
            match item {
                GroupItem::Case(result) => out.push(result),
                GroupItem::Group(group) => out.extend(group.cases_mut()),
            }
        }
        out
    }

    pub fn case_ids(&self) -> Vec<&str> {
        self.cases()
            .into_iter()
            .map(|r| r.number.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.group_items.is_empty()
    }
}

/// Leading dotted segment of `first_case_id`, or `"0"`.
///
/// `"004.2"` gives `"004"`. Never fails: a missing id or an empty leading
/// segment falls back to [`FALLBACK_GROUP_NUMBER`].
pub fn group_number(first_case_id: Option<&str>) -> String {
    first_case_id
        .and_then(|id| id.split('.').next())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_GROUP_NUMBER)
        .to_string()
}
