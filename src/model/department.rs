use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::serde_helpers::double_option;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Dhaka HQ", nullable = true)]
    pub location: Option<String>,
    /// Employee id of the department head
    #[schema(example = 12, nullable = true)]
    pub head_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub location: Option<String>,
    pub head_id: Option<u64>,
}

/// Partial update. An absent field is left alone; `null` clears a
/// nullable column.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub location: Option<Option<String>>,
    /// `null` unassigns the head
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u64>, nullable = true)]
    pub head_id: Option<Option<u64>>,
}

impl DepartmentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.head_id.is_none()
    }

    pub fn apply(self, department: &mut Department) {
        if let Some(v) = self.name {
            department.name = v;
        }
        if let Some(v) = self.location {
            department.location = v;
        }
        if let Some(v) = self.head_id {
            department.head_id = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engineering() -> Department {
        Department {
            id: 1,
            name: "Engineering".to_string(),
            location: Some("Dhaka HQ".to_string()),
            head_id: Some(7),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn null_head_unassigns() {
        let patch: DepartmentPatch = serde_json::from_str(r#"{"head_id": null}"#).unwrap();
        assert!(!patch.is_empty());

        let mut department = engineering();
        patch.apply(&mut department);
        assert_eq!(department.head_id, None);
        assert_eq!(department.location.as_deref(), Some("Dhaka HQ"));
    }

    #[test]
    fn empty_body_changes_nothing() {
        let patch: DepartmentPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }
}
