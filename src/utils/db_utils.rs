use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Null,
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<V: Into<SqlValue>> From<Option<V>> for SqlValue {
    fn from(v: Option<V>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Column assignments collected from a partial update.
#[derive(Debug, Default)]
pub struct Assignments(Vec<(&'static str, SqlValue)>);

impl Assignments {
    pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) -> &mut Self {
        self.0.push((column, value.into()));
        self
    }

    pub fn set_opt<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.set(column, v);
        }
        self
    }

    /// Absent leaves the column alone; `Some(None)` writes NULL.
    pub fn set_nullable<V: Into<SqlValue>>(
        &mut self,
        column: &'static str,
        value: Option<Option<V>>,
    ) -> &mut Self {
        if let Some(v) = value {
            self.set(column, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names come from `&'static str` literals only, never from input.
pub fn build_update_sql(table: &str, assignments: Assignments, id_column: &str, id: u64) -> SqlUpdate {
    let set_clause = assignments
        .0
        .iter()
        .map(|(k, _)| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = assignments.0.into_iter().map(|(_, v)| v).collect();
    // WHERE id = ?
    values.push(SqlValue::U64(id));

    SqlUpdate { sql, values }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sql_lists_columns_in_order_and_binds_id_last() {
        let mut a = Assignments::default();
        a.set("status", "Approved").set_opt("reviewed_by", Some("hr-1")).set_opt::<u64>("head_id", None);

        let update = build_update_sql("leave_requests", a, "id", 9);
        assert_eq!(
            update.sql,
            "UPDATE leave_requests SET status = ?, reviewed_by = ? WHERE id = ?"
        );
        assert_eq!(update.values.last(), Some(&SqlValue::U64(9)));
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn cleared_columns_bind_null() {
        let mut a = Assignments::default();
        a.set_nullable::<u64>("head_id", Some(None))
            .set_nullable::<String>("location", None)
            .set("reviewed_by", None::<String>);

        let update = build_update_sql("departments", a, "id", 3);
        assert_eq!(
            update.sql,
            "UPDATE departments SET head_id = ?, reviewed_by = ? WHERE id = ?"
        );
        assert_eq!(update.values[0], SqlValue::Null);
        assert_eq!(update.values[1], SqlValue::Null);
    }
}
