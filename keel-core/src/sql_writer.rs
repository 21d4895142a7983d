use crate::{FieldDef, Filter, Order, Value, separated_by};

/// Dialect printer turning schema metadata into concrete SQL text.
///
/// Every statement produced here uses `?` for the parameters, the executor later
/// calls [`SqlWriter::rewrite_placeholders`] with the writer of the driver to obtain
/// the native syntax. Values are never written into the SQL text.
pub trait SqlWriter: Send + Sync {
    /// Whether a backslash escapes the next character inside quoted text.
    fn backslash_escapes(&self) -> bool {
        false
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers (`name`) doubling inner backticks.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    /// Native placeholder for the parameter at `index` (starting from 1).
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    /// Replace every `?` outside of quoted text with the native placeholder.
    ///
    /// Returns the rewritten SQL and the number of placeholders found.
    fn rewrite_placeholders(&self, sql: &str) -> (String, usize) {
        let mut out = String::with_capacity(sql.len() + 16);
        let mut count = 0;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        let backslash = self.backslash_escapes();
        for c in sql.chars() {
            if let Some(q) = quote {
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' && q != '`' && backslash {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    count += 1;
                    self.write_placeholder(&mut out, count);
                }
                _ => out.push(c),
            }
        }
        (out, count)
    }

    fn write_placeholders(&self, out: &mut String, count: usize) {
        separated_by(out, 0..count, |out, _| out.push('?'), ", ");
    }

    fn write_column_list(&self, out: &mut String, columns: &[&str]) {
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
    }

    fn write_select(&self, out: &mut String, table: &str, columns: &[&str]) {
        out.push_str("SELECT ");
        self.write_column_list(out, columns);
        out.push_str(" FROM ");
        self.write_identifier_quoted(out, table);
    }

    fn write_select_count(&self, out: &mut String, table: &str, column: &str) {
        out.push_str("SELECT COUNT(");
        self.write_identifier_quoted(out, column);
        out.push_str(") FROM ");
        self.write_identifier_quoted(out, table);
    }

    fn write_insert(&self, out: &mut String, table: &str, columns: &[&str]) {
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(out, table);
        out.push_str(" (");
        self.write_column_list(out, columns);
        out.push_str(") VALUES (");
        self.write_placeholders(out, columns.len());
        out.push(')');
    }

    /// With no `columns` the key is assigned to itself, the statement still binds only
    /// the key.
    fn write_update(&self, out: &mut String, table: &str, columns: &[&str], key: &str) {
        out.push_str("UPDATE ");
        self.write_identifier_quoted(out, table);
        out.push_str(" SET ");
        if columns.is_empty() {
            self.write_identifier_quoted(out, key);
            out.push('=');
            self.write_identifier_quoted(out, key);
        } else {
            separated_by(
                out,
                columns,
                |out, v| {
                    self.write_identifier_quoted(out, v);
                    out.push_str("=?");
                },
                ", ",
            );
        }
        out.push_str(" WHERE ");
        self.write_identifier_quoted(out, key);
        out.push_str("=?");
    }

    fn write_delete(&self, out: &mut String, table: &str, key: &str) {
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(out, table);
        out.push_str(" WHERE ");
        self.write_identifier_quoted(out, key);
        out.push_str("=?");
    }

    fn write_create_table(
        &self,
        out: &mut String,
        table: &str,
        fields: &[FieldDef],
        if_not_exists: bool,
    ) {
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier_quoted(out, table);
        out.push_str(" (\n");
        separated_by(
            out,
            fields,
            |out, field| {
                out.push_str("    ");
                self.write_identifier_quoted(out, field.name());
                out.push(' ');
                out.push_str(&field.column_type);
                if field.primary_key {
                    out.push_str(" NOT NULL PRIMARY KEY");
                }
            },
            ",\n",
        );
        out.push_str("\n)");
    }

    fn write_drop_table(&self, out: &mut String, table: &str, if_exists: bool) {
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_identifier_quoted(out, table);
    }

    /// Append `WHERE`, `ORDER BY` and `LIMIT` clauses, pushing the bound values in `args`.
    fn write_filter(&self, out: &mut String, filter: &Filter, args: &mut Vec<Value>) {
        self.write_where(out, filter, args);
        if !filter.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            separated_by(
                out,
                &filter.order_by,
                |out, (column, order)| {
                    self.write_identifier_quoted(out, column);
                    if *order == Order::Desc {
                        out.push_str(" DESC");
                    }
                },
                ", ",
            );
        }
        if let Some(limit) = filter.limit {
            out.push_str(" LIMIT ?");
            args.push(Value::Int64(Some(i64::try_from(limit).unwrap_or(i64::MAX))));
            if let Some(offset) = filter.offset {
                out.push_str(" OFFSET ?");
                args.push(Value::Int64(Some(i64::try_from(offset).unwrap_or(i64::MAX))));
            }
        }
    }

    /// Equality conditions joined by `AND`, a NULL value becomes `IS NULL`.
    fn write_where(&self, out: &mut String, filter: &Filter, args: &mut Vec<Value>) {
        if filter.conditions.is_empty() {
            return;
        }
        out.push_str(" WHERE ");
        separated_by(
            out,
            &filter.conditions,
            |out, (column, value)| {
                self.write_identifier_quoted(out, column);
                if value.is_null() {
                    out.push_str(" IS NULL");
                } else {
                    out.push_str("=?");
                    args.push(value.clone());
                }
            },
            " AND ",
        );
    }
}

/// Writer for the SQL understood by MySQL, MariaDB and SQLite alike.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl SqlWriter for GenericSqlWriter {}
