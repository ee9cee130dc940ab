//! Text helpers shared by SQL and Rust code.
//!
//! SQLite's built-in `lower()` only folds ASCII letters. Name search folds
//! both the stored column and the user query with [`fold_case`], exposed to
//! SQL as `fold_case(text)`.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the scalar function registered by [`register_text_functions`].
pub(crate) const FOLD_CASE_SQL: &str = "fold_case";

/// Unicode lower-case fold used for case-insensitive matching.
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Registers `fold_case(text)` on `conn`. NULL input yields NULL.
///
/// Scalar functions live on the connection, not in the file, so every
/// connection that runs name searches needs this call.
pub(crate) fn register_text_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_SQL,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|value| fold_case(&value)))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{fold_case, register_text_functions};
    use rusqlite::Connection;

    #[test]
    fn fold_case_handles_non_ascii_letters() {
        assert_eq!(fold_case("ÜBUNG"), "übung");
        assert_eq!(fold_case("Ésprit Drill"), "ésprit drill");
        assert_eq!(fold_case("PC 10"), "pc 10");
    }

    #[test]
    fn sql_fold_matches_rust_fold() {
        let conn = Connection::open_in_memory().unwrap();
        register_text_functions(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT fold_case(?1);", ["ÉSPRIT Übung"], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, fold_case("ÉSPRIT Übung"));

        let null: Option<String> = conn
            .query_row("SELECT fold_case(NULL);", [], |row| row.get(0))
            .unwrap();
        assert!(null.is_none());
    }
}
