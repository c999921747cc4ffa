use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ids::*, ResourceField};

/// A registered cluster connection.
///
/// This is the privileged shape returned by a single-provider lookup. Listing goes through
/// [`ProviderSummary`], which has no credential field at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub host: String,
    pub ca_data: String,
    pub bearer_token: String,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("ca_data", &self.ca_data)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

impl Provider {
    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            name: self.name.clone(),
            host: self.host.clone(),
            ca_data: self.ca_data.clone(),
        }
    }
}

/// Listing projection of a [`Provider`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub name: String,
    pub host: String,
    pub ca_data: String,
}

/// One deployed unit, recorded once per deployment action and never mutated.
///
/// Projections (by task, by fields) return this same shape with the columns outside the
/// projection left empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub account_name: String,
    pub spinnaker_app: String,
    pub task_id: TaskId,
    pub api_group: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub resource_body: String,
    pub version: String,
}

impl Resource {
    pub fn field(&self, field: ResourceField) -> &str {
        match field {
            ResourceField::AccountName => &self.account_name,
            ResourceField::SpinnakerApp => &self.spinnaker_app,
            ResourceField::TaskId => self.task_id.as_str(),
            ResourceField::ApiGroup => &self.api_group,
            ResourceField::Kind => &self.kind,
            ResourceField::Name => &self.name,
            ResourceField::Namespace => &self.namespace,
            ResourceField::ResourceBody => &self.resource_body,
            ResourceField::Version => &self.version,
        }
    }

    pub fn set_field(&mut self, field: ResourceField, value: String) {
        match field {
            ResourceField::AccountName => self.account_name = value,
            ResourceField::SpinnakerApp => self.spinnaker_app = value,
            ResourceField::TaskId => self.task_id = TaskId(value),
            ResourceField::ApiGroup => self.api_group = value,
            ResourceField::Kind => self.kind = value,
            ResourceField::Name => self.name = value,
            ResourceField::Namespace => self.namespace = value,
            ResourceField::ResourceBody => self.resource_body = value,
            ResourceField::Version => self.version = value,
        }
    }

    /// Copy of this resource keeping only `fields`.
    pub fn project(&self, fields: &[ResourceField]) -> Resource {
        let mut out = Resource::default();
        for f in fields {
            out.set_field(*f, self.field(*f).to_string());
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPermission {
    pub account_name: String,
    pub read_group: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritePermission {
    pub account_name: String,
    pub write_group: String,
}
