use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A message referenced a user id with no account row.
    #[error("referenced user does not exist")]
    UnknownUser,

    #[error("database lock poisoned")]
    Poisoned,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Classify insert failures so foreign-key violations stay distinguishable.
    pub(crate) fn from_insert(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Self::UnknownUser
            }
            other => Self::Sqlite(other),
        }
    }
}
