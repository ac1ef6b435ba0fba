use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// `null`, a missing field and `""` all become `None`; anything else must
/// parse as `T`.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Tells an explicit `null` apart from an absent field: pair with
/// `#[serde(default)]` so absent is `None` and `null` is `Some(None)`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        day: Option<NaiveDate>,
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        head_id: Option<Option<u64>>,
    }

    #[test]
    fn blank_dates_read_as_none() {
        for body in [r#"{}"#, r#"{"day": null}"#, r#"{"day": ""}"#, r#"{"day": "  "}"#] {
            let form: Form = serde_json::from_str(body).unwrap();
            assert_eq!(form.day, None, "{body}");
        }
        let form: Form = serde_json::from_str(r#"{"day": "2024-02-29"}"#).unwrap();
        assert_eq!(form.day, NaiveDate::from_ymd_opt(2024, 2, 29));

        assert!(serde_json::from_str::<Form>(r#"{"day": "yesterday"}"#).is_err());
    }

    #[test]
    fn null_is_distinct_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.head_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"head_id": null}"#).unwrap();
        assert_eq!(cleared.head_id, Some(None));

        let set: Patch = serde_json::from_str(r#"{"head_id": 4}"#).unwrap();
        assert_eq!(set.head_id, Some(Some(4)));
    }
}
