use chrono::Utc;

use crate::model::employee::Employee;

const PREFIX: &str = "EMP";

fn code_number(code: &str) -> Option<u64> {
    let digits: String = code
        .strip_prefix(PREFIX)?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}

/// `EMP` + (highest existing number + 1), zero-padded to three digits.
pub fn next_employee_code(existing: &[Employee]) -> String {
    let next = existing
        .iter()
        .filter_map(|e| code_number(&e.employee_code))
        .max()
        .map_or(1, |n| n + 1);
    format!("{PREFIX}{next:03}")
}

/// Used when existing codes cannot be listed: last six digits of the
/// current millisecond timestamp.
pub fn fallback_employee_code() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    format!("{PREFIX}{:06}", millis % 1_000_000)
}
