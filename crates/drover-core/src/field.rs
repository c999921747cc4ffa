use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named resource columns a caller may project on.
///
/// Distinct-projection queries only accept these, so the set of columns reachable from a
/// list call is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceField {
    AccountName,
    SpinnakerApp,
    TaskId,
    ApiGroup,
    Kind,
    Name,
    Namespace,
    ResourceBody,
    Version,
}

/// Columns returned by a by-task listing.
pub const TASK_PROJECTION: [ResourceField; 7] = [
    ResourceField::AccountName,
    ResourceField::ApiGroup,
    ResourceField::Kind,
    ResourceField::Name,
    ResourceField::Namespace,
    ResourceField::ResourceBody,
    ResourceField::Version,
];

impl ResourceField {
    pub const ALL: [ResourceField; 9] = [
        ResourceField::AccountName,
        ResourceField::SpinnakerApp,
        ResourceField::TaskId,
        ResourceField::ApiGroup,
        ResourceField::Kind,
        ResourceField::Name,
        ResourceField::Namespace,
        ResourceField::ResourceBody,
        ResourceField::Version,
    ];

    /// Column name in the `resources` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceField::AccountName => "account_name",
            ResourceField::SpinnakerApp => "spinnaker_app",
            ResourceField::TaskId => "task_id",
            ResourceField::ApiGroup => "api_group",
            ResourceField::Kind => "kind",
            ResourceField::Name => "name",
            ResourceField::Namespace => "namespace",
            ResourceField::ResourceBody => "resource_body",
            ResourceField::Version => "version",
        }
    }
}

impl fmt::Display for ResourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for ResourceField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ResourceField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Drop repeated fields, keeping first occurrence order.
pub fn dedup_fields(fields: &[ResourceField]) -> Vec<ResourceField> {
    let mut out: Vec<ResourceField> = Vec::with_capacity(fields.len());
    for f in fields {
        if !out.contains(f) {
            out.push(*f);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_column_names() {
        assert_eq!("kind".parse::<ResourceField>().unwrap(), ResourceField::Kind);
        assert_eq!(" Namespace ".parse::<ResourceField>().unwrap(), ResourceField::Namespace);
        assert_eq!("resource_body".parse::<ResourceField>().unwrap(), ResourceField::ResourceBody);
    }

    #[test]
    fn rejects_unknown_columns() {
        let err = "bearer_token".parse::<ResourceField>().unwrap_err();
        assert_eq!(err, UnknownField("bearer_token".into()));
        assert!("kind; DROP TABLE resources".parse::<ResourceField>().is_err());
    }

    #[test]
    fn dedup_keeps_first_order() {
        let got = dedup_fields(&[ResourceField::Namespace, ResourceField::Kind, ResourceField::Namespace]);
        assert_eq!(got, vec![ResourceField::Namespace, ResourceField::Kind]);
    }

    #[test]
    fn task_projection_omits_app_and_task() {
        assert!(!TASK_PROJECTION.contains(&ResourceField::SpinnakerApp));
        assert!(!TASK_PROJECTION.contains(&ResourceField::TaskId));
    }
}
