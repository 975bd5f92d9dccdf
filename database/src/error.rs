use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// A unique, foreign key, not-null or check constraint rejected the write.
    #[error("constraint violated: {message}")]
    Constraint { message: String },

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl Error {
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// postgres reports integrity violations under SQLSTATE class 23
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err
                .code()
                .is_some_and(|code| code.starts_with(INTEGRITY_CONSTRAINT_CLASS))
            {
                return Self::Constraint {
                    message: db_err.message().to_string(),
                };
            }
        }

        Self::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct PgError {
        code: &'static str,
    }

    impl std::fmt::Display for PgError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "sqlstate {}", self.code)
        }
    }

    impl std::error::Error for PgError {}

    impl DatabaseError for PgError {
        fn message(&self) -> &str {
            "rejected by postgres"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                "23505" => ErrorKind::UniqueViolation,
                "23503" => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn from_sqlstate(code: &'static str) -> Error {
        Error::from(sqlx::Error::Database(Box::new(PgError { code })))
    }

    #[test]
    fn integrity_violations_become_constraints() {
        for code in ["23505", "23503", "23502", "23514"] {
            let err = from_sqlstate(code);
            assert!(err.is_constraint(), "{code} should be a constraint");
            assert_eq!(err.to_string(), "constraint violated: rejected by postgres");
        }
    }

    #[test]
    fn other_sqlstates_stay_sqlx_errors() {
        for code in ["42P01", "40001", "08006"] {
            let err = from_sqlstate(code);
            assert!(!err.is_constraint(), "{code} should not be a constraint");
            assert!(matches!(err, Error::Sqlx(sqlx::Error::Database(_))));
        }
    }

    #[test]
    fn row_not_found_is_not_a_constraint() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(!err.is_constraint());
        assert!(matches!(err, Error::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn display_names_the_missing_row() {
        let err = Error::NotFound {
            entity: "song",
            id: 7,
        };
        assert_eq!(err.to_string(), "song 7 not found");
        assert!(err.is_not_found());
    }
}
