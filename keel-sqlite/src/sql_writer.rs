use keel_core::SqlWriter;
use std::fmt::Write;

/// Generic dialect with numbered `?NNN` parameters.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter;

impl SqlWriter for SqliteSqlWriter {
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "?{}", index);
    }
}
