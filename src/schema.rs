//! Schema bootstrap for the policy-rule table.
//!
//! The adapter core never interpolates raw identifiers; the table and index
//! names are quoted here once, at bootstrap, and the quoted table name is
//! what every statement builder receives.

use rusqlite::Connection;

use crate::error::Result;

/// Quotes an identifier for safe interpolation into a statement, doubling
/// any embedded quote characters.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Creates the policy-rule table and its uniqueness index if they do not
/// exist yet. The unique index treats NULL columns as equal to themselves
/// by coalescing them to the empty string, so two rows with matching
/// tuples including matching NULLs count as duplicates.
pub fn bootstrap(connection: &Connection, table_name: &str) -> Result<()> {
    let table = quote_identifier(table_name);
    let index = quote_identifier(&format!("idx_{table_name}"));
    connection.execute_batch(&format!(
        "
        create table if not exists {table} (
            id integer primary key autoincrement,
            ptype text not null,
            v0 text,
            v1 text,
            v2 text,
            v3 text,
            v4 text,
            v5 text
        );
        create unique index if not exists {index}
            on {table} (
                ptype,
                coalesce(v0, ''),
                coalesce(v1, ''),
                coalesce(v2, ''),
                coalesce(v3, ''),
                coalesce(v4, ''),
                coalesce(v5, '')
            );
        ",
    ))?;
    Ok(())
}
