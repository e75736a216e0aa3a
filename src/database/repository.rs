use sqlx::sqlite::SqliteRow;
use sqlx::{Encode, FromRow, Sqlite, SqliteExecutor, SqlitePool, Type};
use std::fmt::Display;
use thiserror::Error;

/// Errors from keyed record tables
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{table} record '{key}' already exists")]
    Duplicate { table: &'static str, key: String },

    #[error("{table} record '{key}' not found")]
    NotFound { table: &'static str, key: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RecordError {
    /// Turn a UNIQUE/PRIMARY KEY violation into `Duplicate`, pass anything else through.
    pub fn from_insert(err: sqlx::Error, table: &'static str, key: impl Display) -> Self {
        let duplicate = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if duplicate {
            RecordError::Duplicate {
                table,
                key: key.to_string(),
            }
        } else {
            RecordError::Database(err)
        }
    }
}

/// A flat table with a natural key.
pub trait Table: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    type Key: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Display + Send + Sync + 'static;

    const NAME: &'static str;
    const KEY: &'static str;
    /// ORDER BY clause used for listings.
    const ORDER: &'static str;
}

/// Generic keyed access shared by every record table. Column names passed
/// in are always `&'static str` from the calling service, never user input.
pub struct Repository<T> {
    pool: SqlitePool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Table> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T: Table> Repository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get(&self, key: T::Key) -> Result<Option<T>, RecordError> {
        let sql = format!("SELECT * FROM {} WHERE {} = ?", T::NAME, T::KEY);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_404(&self, key: T::Key) -> Result<T, RecordError> {
        let label = key.to_string();
        self.get(key).await?.ok_or(RecordError::NotFound {
            table: T::NAME,
            key: label,
        })
    }

    pub async fn list(&self) -> Result<Vec<T>, RecordError> {
        let sql = format!("SELECT * FROM {} ORDER BY {}", T::NAME, T::ORDER);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn select_eq(&self, column: &'static str, value: &str) -> Result<Vec<T>, RecordError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {}",
            T::NAME,
            column,
            T::ORDER
        );
        Ok(sqlx::query_as::<_, T>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Case-insensitive substring match over any of `columns`.
    pub async fn search(&self, columns: &[&'static str], term: &str) -> Result<Vec<T>, RecordError> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let clause = columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY {}",
            T::NAME,
            clause,
            T::ORDER
        );
        let pattern = format!("%{}%", escape_like(term));

        let mut query = sqlx::query_as::<_, T>(&sql);
        for _ in columns {
            query = query.bind(pattern.clone());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Set one column on the row with `key`.
    pub async fn update_column(
        &self,
        key: T::Key,
        column: &'static str,
        value: &str,
    ) -> Result<(), RecordError> {
        let label = key.to_string();
        let sql = format!("UPDATE {} SET {} = ? WHERE {} = ?", T::NAME, column, T::KEY);
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RecordError::NotFound {
                table: T::NAME,
                key: label,
            });
        }
        Ok(())
    }

    pub async fn delete(&self, key: T::Key) -> Result<(), RecordError> {
        let label = key.to_string();
        let sql = format!("DELETE FROM {} WHERE {} = ?", T::NAME, T::KEY);
        let result = sqlx::query(&sql).bind(key).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RecordError::NotFound {
                table: T::NAME,
                key: label,
            });
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, RecordError> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::NAME);
        let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Remove every row; runs on whatever executor the caller holds so it
    /// can share a transaction with a reload.
    pub async fn clear<'e, E>(executor: E) -> Result<u64, RecordError>
    where
        E: SqliteExecutor<'e>,
    {
        let sql = format!("DELETE FROM {}", T::NAME);
        let result = sqlx::query(&sql).execute(executor).await?;
        Ok(result.rows_affected())
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("phishing"), "phishing");
    }
}
