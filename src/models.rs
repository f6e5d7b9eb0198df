use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct IssueListResponse {
    pub results: Vec<IssueRecord>,
}

/// A single service desk ticket as returned by the remote API.
///
/// Enum-like fields keep the remote text verbatim so that unexpected casing or
/// vocabulary still groups and displays; compare them through [`Field`] and
/// the case-insensitive helpers instead of matching on the raw strings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct IssueRecord {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub status: String,
    pub created: String,
    pub updated: String,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<Identifier>,
    #[serde(default)]
    pub organization_id: Option<Identifier>,
    #[serde(default)]
    pub ticket_form_id: Option<i64>,
    #[serde(default)]
    pub satisfaction_rating: Option<SatisfactionRating>,
    #[serde(default)]
    pub via: Option<Via>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SatisfactionRating {
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Via {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub source: ViaSource,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ViaSource {
    #[serde(default)]
    pub from: ViaContact,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ViaContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Assignee and organization ids arrive as numbers or strings depending on the
/// upstream account.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

/// Columns of [`IssueRecord`] that can be grouped, filtered or compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    Subject,
    Priority,
    Type,
    Status,
    AssigneeId,
    OrganizationId,
    Created,
    Updated,
    Due,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Id,
        Field::Subject,
        Field::Priority,
        Field::Type,
        Field::Status,
        Field::AssigneeId,
        Field::OrganizationId,
        Field::Created,
        Field::Updated,
        Field::Due,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Subject => "subject",
            Field::Priority => "priority",
            Field::Type => "type",
            Field::Status => "status",
            Field::AssigneeId => "assignee_id",
            Field::OrganizationId => "organization_id",
            Field::Created => "created",
            Field::Updated => "updated",
            Field::Due => "due",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("field", s))
    }
}

impl IssueRecord {
    /// Stringified value of `field`. Absent optional fields yield "".
    pub fn field(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.to_string(),
            Field::Subject => self.subject.clone(),
            Field::Priority => self.priority.clone(),
            Field::Type => self.issue_type.clone(),
            Field::Status => self.status.clone(),
            Field::AssigneeId => display_or_empty(self.assignee_id.as_ref()),
            Field::OrganizationId => display_or_empty(self.organization_id.as_ref()),
            Field::Created => self.created.clone(),
            Field::Updated => self.updated.clone(),
            Field::Due => self.due.clone().unwrap_or_default(),
        }
    }

    pub fn satisfaction_score(&self) -> Option<f64> {
        self.satisfaction_rating.as_ref().and_then(|rating| rating.score)
    }

    pub fn priority_rank(&self) -> u8 {
        self.priority
            .parse::<Priority>()
            .map(Priority::rank)
            .unwrap_or(0)
    }
}

fn display_or_empty(value: Option<&Identifier>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Declares a closed, lower-case vocabulary that parses case-insensitively.
macro_rules! vocabulary {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownVariant::new($kind, s))
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary!(Priority, "priority", {
    Low => "low",
    Normal => "normal",
    High => "high",
});

vocabulary!(IssueType, "issue type", {
    Problem => "problem",
    Task => "task",
    Incident => "incident",
    Question => "question",
});

vocabulary!(Status, "status", {
    New => "new",
    Open => "open",
    Pending => "pending",
    Solved => "solved",
    Hold => "hold",
});

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Normal => 2,
            Priority::Low => 1,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal record; tests override the fields they care about.
    pub fn issue(id: i64, priority: &str, issue_type: &str, status: &str) -> IssueRecord {
        IssueRecord {
            id,
            subject: format!("Issue {}", id),
            priority: priority.to_string(),
            issue_type: issue_type.to_string(),
            status: status.to_string(),
            created: "2024-01-01T00:00:00Z".to_string(),
            updated: "2024-01-01T00:00:00Z".to_string(),
            due: None,
            assignee_id: Some(Identifier::Number(7)),
            organization_id: Some(Identifier::Text(format!("org-{}", id))),
            ticket_form_id: None,
            satisfaction_rating: None,
            via: None,
        }
    }

    pub fn timed(mut record: IssueRecord, created: &str, updated: &str) -> IssueRecord {
        record.created = created.to_string();
        record.updated = updated.to_string();
        record
    }

    pub fn scored(mut record: IssueRecord, score: f64) -> IssueRecord {
        record.satisfaction_rating = Some(SatisfactionRating { score: Some(score) });
        record
    }
}
