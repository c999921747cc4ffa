use drover_storage::CatalogError;
use rusqlite::ErrorCode;

/// Sort a rusqlite error into the catalog's error kinds, keeping the driver message.
pub(crate) fn classify(err: rusqlite::Error) -> CatalogError {
    let code = match &err {
        rusqlite::Error::SqliteFailure(e, _) => Some(e.code),
        _ => None,
    };
    match code {
        Some(ErrorCode::ConstraintViolation) => CatalogError::ConstraintViolation(err.to_string()),
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::OutOfMemory
            | ErrorCode::DiskFull
            | ErrorCode::PermissionDenied
            | ErrorCode::NotADatabase,
        ) => CatalogError::BackendUnavailable(err.to_string()),
        _ => CatalogError::Backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drover_storage::ErrorKind;
    use rusqlite::ffi;

    fn failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), Some("boom".into()))
    }

    #[test]
    fn constraint_codes_map_to_constraint_violation() {
        assert_eq!(classify(failure(ffi::SQLITE_CONSTRAINT)).kind(), ErrorKind::ConstraintViolation);
    }

    #[test]
    fn busy_and_open_failures_are_unavailable() {
        assert_eq!(classify(failure(ffi::SQLITE_BUSY)).kind(), ErrorKind::BackendUnavailable);
        assert_eq!(classify(failure(ffi::SQLITE_CANTOPEN)).kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn other_errors_pass_through() {
        let err = classify(rusqlite::Error::InvalidColumnName("bearer".into()));
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().contains("bearer"));
    }
}
