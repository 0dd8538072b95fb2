use serde::{Deserialize, Serialize};

use super::repo_types::Attribute;

#[derive(Debug, Default, Deserialize)]
pub struct CreateAttributeRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// `{id, name}`: list items, create responses, and nested recipe detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeBody {
    pub id: i64,
    pub name: String,
}

impl From<Attribute> for AttributeBody {
    fn from(a: Attribute) -> Self {
        Self { id: a.id, name: a.name }
    }
}
