pub mod db_utils;
pub mod employee_code;
pub mod serde_helpers;
pub mod snapshot_cache;
