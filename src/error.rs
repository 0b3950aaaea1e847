//! Lifecycle error kinds.
//!
//! Callers branch on kind, never on exception text: conflicts and
//! already-done cases are terminal for that input (pick another bed, fetch a
//! fresh invoice), while `StoreUnavailable` is always safe to retry because
//! nothing before the commit point survives a failure.

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Resource already committed elsewhere — bed occupied, patient already
    /// admitted, or a racing writer won the compare-and-set.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Admission {0} is already discharged")]
    AlreadyDischarged(Uuid),

    #[error("Invoice {0} is not pending")]
    AlreadyPaid(Uuid),

    /// Backing store failure mid-transaction. The transaction's rollback
    /// guarantees no partial state, so the caller may retry as-is.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<DatabaseError> for LifecycleError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlite(e) => match e.sqlite_error_code() {
                Some(rusqlite::ErrorCode::ConstraintViolation) => {
                    // The partial unique indexes on active admissions fire
                    // when a racing writer slipped past the guarded update.
                    LifecycleError::Conflict(e.to_string())
                }
                Some(rusqlite::ErrorCode::DatabaseBusy)
                | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                    LifecycleError::StoreUnavailable(e.to_string())
                }
                _ => LifecycleError::StoreUnavailable(e.to_string()),
            },
            DatabaseError::NotFound { entity_type, id } => {
                // Id parse already succeeded upstream; fall back to nil on
                // the re-parse rather than panicking inside error mapping.
                LifecycleError::NotFound {
                    entity: match entity_type.as_str() {
                        "patient" => "patient",
                        "bed" => "bed",
                        "clinician" => "clinician",
                        "invoice" => "invoice",
                        _ => "admission",
                    },
                    id: Uuid::parse_str(&id).unwrap_or_default(),
                }
            }
            other => LifecycleError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for LifecycleError {
    fn from(err: rusqlite::Error) -> Self {
        LifecycleError::from(DatabaseError::Sqlite(err))
    }
}
