use keel_core::SqlWriter;

/// Backtick quoted identifiers and `?` parameters, MySQL already speaks the generic dialect.
/// Quoted strings accept backslash escapes.
#[derive(Default, Debug, Clone, Copy)]
pub struct MySQLSqlWriter;

impl SqlWriter for MySQLSqlWriter {
    fn backslash_escapes(&self) -> bool {
        true
    }
}
