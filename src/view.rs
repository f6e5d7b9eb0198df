use std::collections::BTreeSet;
use std::str::FromStr;

use itertools::Itertools;
use serde::Deserialize;

use crate::models::{Field, IssueRecord, IssueType, Priority, Status};

pub const COLUMNS: [(Field, &str); 8] = [
    (Field::Id, "ID"),
    (Field::Subject, "Subject"),
    (Field::Priority, "Priority"),
    (Field::Type, "Type"),
    (Field::Status, "Status"),
    (Field::AssigneeId, "Assignee"),
    (Field::Due, "Due Date"),
    (Field::OrganizationId, "Organization"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Table,
    Summary,
}

/// Dashboard state carried in the page URL. Every control on the page links
/// to the state produced by [`ViewState::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub issue_type: Option<IssueType>,
    pub organization_search: Option<String>,
    pub priority_direction: SortDirection,
    pub mode: ViewMode,
    pub hidden_columns: BTreeSet<Field>,
    pub expanded_rows: BTreeSet<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewAction {
    FilterPriority(Option<Priority>),
    FilterStatus(Option<Status>),
    FilterType(Option<IssueType>),
    SearchOrganization(String),
    TogglePriorityDirection,
    ToggleColumn(Field),
    ToggleRow(i64),
    ToggleMode,
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

impl ViewState {
    pub fn update(mut self, action: ViewAction) -> Self {
        match action {
            ViewAction::FilterPriority(priority) => self.priority = priority,
            ViewAction::FilterStatus(status) => self.status = status,
            ViewAction::FilterType(issue_type) => self.issue_type = issue_type,
            ViewAction::SearchOrganization(search) => {
                self.organization_search = Some(search).filter(|s| !s.is_empty())
            }
            ViewAction::TogglePriorityDirection => {
                self.priority_direction = self.priority_direction.flipped()
            }
            ViewAction::ToggleColumn(field) => toggle(&mut self.hidden_columns, field),
            ViewAction::ToggleRow(id) => toggle(&mut self.expanded_rows, id),
            ViewAction::ToggleMode => {
                self.mode = match self.mode {
                    ViewMode::Table => ViewMode::Summary,
                    ViewMode::Summary => ViewMode::Table,
                }
            }
        }
        self
    }

    pub fn apply<'a>(&self, records: &'a [IssueRecord]) -> Vec<&'a IssueRecord> {
        let mut sorted: Vec<&IssueRecord> = records.iter().collect();
        sorted.sort_by(|a, b| match self.priority_direction {
            SortDirection::Asc => a.priority_rank().cmp(&b.priority_rank()),
            SortDirection::Desc => b.priority_rank().cmp(&a.priority_rank()),
        });
        sorted.retain(|record| self.matches(record));
        sorted
    }

    fn matches(&self, record: &IssueRecord) -> bool {
        let equals = |field: Field, expected: Option<&'static str>| {
            expected.map_or(true, |expected| record.field(field).eq_ignore_ascii_case(expected))
        };
        let organization = self.organization_search.as_ref().map_or(true, |search| {
            record
                .field(Field::OrganizationId)
                .to_lowercase()
                .contains(&search.to_lowercase())
        });

        equals(Field::Priority, self.priority.map(Priority::as_str))
            && equals(Field::Status, self.status.map(Status::as_str))
            && equals(Field::Type, self.issue_type.map(IssueType::as_str))
            && organization
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        COLUMNS
            .into_iter()
            .filter(|(field, _)| !self.hidden_columns.contains(field))
    }

    /// Key/value pairs that reproduce this state. Defaults are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(issue_type) = self.issue_type {
            pairs.push(("type", issue_type.to_string()));
        }
        if let Some(search) = &self.organization_search {
            pairs.push(("organization", search.clone()));
        }
        if self.priority_direction == SortDirection::Asc {
            pairs.push(("direction", "asc".to_string()));
        }
        if self.mode == ViewMode::Summary {
            pairs.push(("view", "summary".to_string()));
        }
        if !self.hidden_columns.is_empty() {
            pairs.push(("hidden", self.hidden_columns.iter().map(|field| field.name()).join(",")));
        }
        if !self.expanded_rows.is_empty() {
            pairs.push(("expanded", self.expanded_rows.iter().join(",")));
        }
        pairs
    }

    pub fn to_query(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .join("&")
    }

    pub fn href(&self) -> String {
        match self.to_query() {
            query if query.is_empty() => "/".to_string(),
            query => format!("/?{}", query),
        }
    }
}

/// Raw dashboard query string. Unknown or empty values fall back to the
/// default state instead of rejecting the page.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    priority: Option<String>,
    status: Option<String>,
    #[serde(rename = "type")]
    issue_type: Option<String>,
    organization: Option<String>,
    direction: Option<String>,
    view: Option<String>,
    hidden: Option<String>,
    expanded: Option<String>,
}

fn comma_separated<T: FromStr>(value: Option<&str>) -> impl Iterator<Item = T> + '_ {
    value
        .unwrap_or_default()
        .split(',')
        .filter_map(|item| item.trim().parse().ok())
}

impl From<ViewParams> for ViewState {
    fn from(params: ViewParams) -> Self {
        let mut state = ViewState::default()
            .update(ViewAction::FilterPriority(params.priority.and_then(|p| p.parse().ok())))
            .update(ViewAction::FilterStatus(params.status.and_then(|s| s.parse().ok())))
            .update(ViewAction::FilterType(params.issue_type.and_then(|t| t.parse().ok())))
            .update(ViewAction::SearchOrganization(params.organization.unwrap_or_default()));

        if matches!(params.direction.as_deref(), Some(d) if d.eq_ignore_ascii_case("asc")) {
            state = state.update(ViewAction::TogglePriorityDirection);
        }
        if matches!(params.view.as_deref(), Some(v) if v.eq_ignore_ascii_case("summary")) {
            state = state.update(ViewAction::ToggleMode);
        }

        let hidden: BTreeSet<Field> = comma_separated(params.hidden.as_deref()).collect();
        let expanded: BTreeSet<i64> = comma_separated(params.expanded.as_deref()).collect();
        let columns = hidden.into_iter().map(ViewAction::ToggleColumn);
        let rows = expanded.into_iter().map(ViewAction::ToggleRow);
        columns.chain(rows).fold(state, ViewState::update)
    }
}
