use crate::application::repos::RepoError;

// Postgres SQLSTATE classes: 23xxx integrity, 22P02 bad text representation,
// 57014 query_canceled.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            match db.code().as_deref() {
                Some("23505") => RepoError::Duplicate {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                },
                Some("23503") | Some("22P02") => RepoError::InvalidInput { message },
                Some(code) if code.starts_with("23") => RepoError::Integrity { message },
                Some("57014") => RepoError::Timeout,
                _ => RepoError::Persistence(message),
            }
        }
        other => RepoError::from_persistence(other),
    }
}
