use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::utils::serde_helpers::double_option;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum EmployeeStatus {
    Active,
    Resigned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP001",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department": "Engineering",
        "designation": "Backend Engineer",
        "date_of_joining": "2024-01-01",
        "status": "Active",
        "profile_id": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": null
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    /// Department name, not id
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Backend Engineer", nullable = true)]
    pub designation: Option<String>,

    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    pub date_of_joining: Option<NaiveDate>,

    pub status: EmployeeStatus,

    /// Authentication identity this record is linked to, once the employee has an account
    #[schema(nullable = true)]
    pub profile_id: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Employee {
    /// Up to two upper-cased initials, `NA` for an empty name.
    pub fn initials(&self) -> String {
        initials(&self.name)
    }
}

pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .take(2)
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    if letters.is_empty() {
        "NA".to_string()
    } else {
        letters
    }
}

/// Record handed to the store on insert.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub status: EmployeeStatus,
    pub profile_id: Option<String>,
}

/// Partial update. An absent field is left alone; `null` clears a
/// nullable column.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub designation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(example = "2026-01-01", value_type = Option<String>, format = "date", nullable = true)]
    pub date_of_joining: Option<Option<NaiveDate>>,
    pub status: Option<EmployeeStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub profile_id: Option<Option<String>>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.department.is_none()
            && self.designation.is_none()
            && self.date_of_joining.is_none()
            && self.status.is_none()
            && self.profile_id.is_none()
    }

    pub fn apply(self, employee: &mut Employee) {
        if let Some(v) = self.name {
            employee.name = v;
        }
        if let Some(v) = self.email {
            employee.email = v;
        }
        if let Some(v) = self.phone {
            employee.phone = v;
        }
        if let Some(v) = self.department {
            employee.department = v;
        }
        if let Some(v) = self.designation {
            employee.designation = v;
        }
        if let Some(v) = self.date_of_joining {
            employee.date_of_joining = v;
        }
        if let Some(v) = self.status {
            employee.status = v;
        }
        if let Some(v) = self.profile_id {
            employee.profile_id = v;
        }
    }
}

/// Listing filter. All conditions are AND-ed; `search` matches name, email
/// or employee code, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub joined_since: Option<NaiveDate>,
    pub limit: Option<u32>,
}

impl EmployeeFilter {
    pub fn active() -> Self {
        Self {
            status: Some(EmployeeStatus::Active),
            ..Self::default()
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none()
            && self.status.is_none()
            && self.department.is_none()
            && self.email.is_none()
            && self.joined_since.is_none()
            && self.limit.is_none()
    }

    /// Row predicate; `limit` is applied by the caller.
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(term) = self.search.as_deref().map(str::to_lowercase) {
            let hit = employee.name.to_lowercase().contains(&term)
                || employee.email.to_lowercase().contains(&term)
                || employee.employee_code.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(status) = self.status {
            if employee.status != status {
                return false;
            }
        }
        if let Some(department) = self.department.as_deref() {
            if employee.department.as_deref() != Some(department) {
                return false;
            }
        }
        if let Some(email) = self.email.as_deref() {
            if !employee.email.eq_ignore_ascii_case(email) {
                return false;
            }
        }
        if let Some(since) = self.joined_since {
            match employee.date_of_joining {
                Some(joined) if joined >= since => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, email: &str, code: &str) -> Employee {
        Employee {
            id: 1,
            employee_code: code.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            department: Some("Engineering".to_string()),
            designation: None,
            date_of_joining: NaiveDate::from_ymd_opt(2024, 3, 1),
            status: EmployeeStatus::Active,
            profile_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("jane mary doe"), "JM");
        assert_eq!(initials("Ola"), "O");
        assert_eq!(initials("   "), "NA");
    }

    #[test]
    fn search_matches_name_email_and_code() {
        let e = employee("Jane Doe", "jane@corp.io", "EMP007");
        let by = |term: &str| EmployeeFilter {
            search: Some(term.to_string()),
            ..EmployeeFilter::default()
        };

        assert!(by("jane").matches(&e));
        assert!(by("CORP.IO").matches(&e));
        assert!(by("emp007").matches(&e));
        assert!(!by("smith").matches(&e));
    }

    #[test]
    fn joined_since_excludes_missing_dates() {
        let mut e = employee("Jane Doe", "jane@corp.io", "EMP007");
        let filter = EmployeeFilter {
            joined_since: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..EmployeeFilter::default()
        };
        assert!(filter.matches(&e));

        e.date_of_joining = None;
        assert!(!filter.matches(&e));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("resigned".parse::<EmployeeStatus>().ok(), Some(EmployeeStatus::Resigned));
        assert!("fired".parse::<EmployeeStatus>().is_err());
    }

    #[test]
    fn email_filter_ignores_case() {
        let e = employee("Jane Doe", "Jane@Corp.io", "EMP007");
        let filter = EmployeeFilter {
            email: Some("jane@corp.io".to_string()),
            ..EmployeeFilter::default()
        };
        assert!(filter.matches(&e));
    }

    #[test]
    fn patch_null_clears_and_absent_keeps() {
        let patch: EmployeePatch =
            serde_json::from_str(r#"{"department": null, "designation": "Lead"}"#).unwrap();
        assert!(!patch.is_empty());

        let mut e = employee("Jane Doe", "jane@corp.io", "EMP007");
        e.phone = Some("+880170000000".to_string());
        patch.apply(&mut e);

        assert_eq!(e.department, None);
        assert_eq!(e.designation.as_deref(), Some("Lead"));
        assert_eq!(e.phone.as_deref(), Some("+880170000000"));
    }
}
