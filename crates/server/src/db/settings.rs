//! Settings database operations.
//!
//! Plain key/value rows in `app_settings`. The order block reference
//! counter is the only one in use.

use sqlx::PgPool;

use super::RepositoryError;

/// Key of the order block reference counter.
pub const REFERENCE_COUNTER_KEY: &str = "npdfIdCounter";

/// Prefix of order block references.
const REFERENCE_PREFIX: &str = "npdf";

/// Allocate the next order block reference (`npdf001`, `npdf002`, ...).
///
/// The increment is a single upsert, so concurrent callers never receive
/// the same number.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails, or
/// `RepositoryError::DataCorruption` if the stored counter is not a number.
pub async fn next_reference(pool: &PgPool) -> Result<String, RepositoryError> {
    let value = sqlx::query_scalar::<_, String>(
        r"
        INSERT INTO app_settings (key, value)
        VALUES ($1, '1')
        ON CONFLICT (key) DO UPDATE
            SET value = (app_settings.value::bigint + 1)::text, updated_at = NOW()
        RETURNING value
        ",
    )
    .bind(REFERENCE_COUNTER_KEY)
    .fetch_one(pool)
    .await?;

    let counter = value.parse::<u64>().map_err(|_| {
        RepositoryError::DataCorruption(format!("{REFERENCE_COUNTER_KEY} is not a number: {value}"))
    })?;

    Ok(format_reference(counter))
}

/// Render a counter value as a reference.
#[must_use]
pub fn format_reference(counter: u64) -> String {
    format!("{REFERENCE_PREFIX}{counter:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reference_pads_to_three_digits() {
        assert_eq!(format_reference(1), "npdf001");
        assert_eq!(format_reference(42), "npdf042");
        assert_eq!(format_reference(999), "npdf999");
        assert_eq!(format_reference(1000), "npdf1000");
    }
}
