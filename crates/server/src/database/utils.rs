pub fn map_not_found_as_none<T>(result: Result<T, sqlx::Error>) -> Result<Option<T>, sqlx::Error> {
    match result {
        Ok(ok) => Ok(Some(ok)),
        Err(e) => {
            if matches!(e, sqlx::Error::RowNotFound) {
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|e| e.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_becomes_none() {
        assert_eq!(
            map_not_found_as_none::<i32>(Err(sqlx::Error::RowNotFound)).unwrap(),
            None
        );
        assert_eq!(map_not_found_as_none(Ok(3)).unwrap(), Some(3));
        assert!(map_not_found_as_none::<i32>(Err(sqlx::Error::PoolTimedOut)).is_err());
    }

    #[test]
    fn non_database_errors_are_not_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_foreign_key_violation(&sqlx::Error::PoolClosed));
    }
}
