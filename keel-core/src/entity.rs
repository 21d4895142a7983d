use crate::{
    AsValue, Context, Error, Executor, FieldDef, Filter, Result, RowCountError, RowCountPolicy,
    RowLabeled, Schema, SchemaError, Value,
};
use std::{future::Future, mem};

/// A typed struct mapped to a table.
///
/// Implementors describe themselves through a [`Schema`] and move values in and out by
/// attribute name, the operations are provided on top of that. Usually derived:
/// ```ignore
/// #[derive(Entity)]
/// #[keel(table = "users")]
/// struct User {
///     #[keel(primary_key, column_type = "varchar(50)", default_with = next_id)]
///     id: Option<String>,
///     email: String,
///     admin: bool,
/// }
/// ```
pub trait Entity: Sized + Send + Sync {
    fn schema() -> &'static Schema;

    /// Build an instance from a row produced by the select template.
    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Current value of the attribute, `None` if the entity has no such attribute.
    fn get_value(&self, name: &str) -> Option<Value>;

    fn set_value(&mut self, name: &str, value: Value) -> Result<()>;

    /// Look up an instance by primary key, `None` when no row matches.
    fn find<Exec: Executor>(
        executor: &Exec,
        primary_key: impl Into<Value>,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        let schema = Self::schema();
        let filter = Filter::new().eq(schema.primary_key().name.clone(), primary_key);
        async move {
            let (sql, args) = schema.select_filtered(&filter)?;
            let rows = executor.select(&sql, &args, Some(1)).await?;
            rows.into_iter().next().map(Self::from_row).transpose()
        }
    }

    /// Every instance matching the filter, in the order it requests.
    fn find_all<Exec: Executor>(
        executor: &Exec,
        filter: &Filter,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        let query = Self::schema().select_filtered(filter);
        async move {
            let (sql, args) = query?;
            let rows = executor.select(&sql, &args, None).await?;
            rows.into_iter().map(Self::from_row).collect()
        }
    }

    /// Number of rows matching the conditions of the filter, ordering and limits are ignored.
    fn count<Exec: Executor>(
        executor: &Exec,
        filter: &Filter,
    ) -> impl Future<Output = Result<i64>> + Send {
        let schema = Self::schema();
        let query = schema.count_filtered(filter);
        async move {
            let (sql, args) = query?;
            let rows = executor.select(&sql, &args, Some(1)).await?;
            let Some(mut row) = rows.into_iter().next() else {
                let error = Error::msg(format!(
                    "The count query on `{}` returned no rows",
                    schema.table_name()
                ));
                log::error!("{:#}", error);
                return Err(error);
            };
            let value = row.values.first_mut().map(mem::take).unwrap_or_default();
            i64::try_from_value(value)
                .with_context(|| format!("While counting the rows of `{}`", schema.table_name()))
        }
    }

    /// Insert the instance.
    ///
    /// Null attributes with a default take it now, factories are called once per save.
    /// Once the row is inserted the resolved values are stored back into the instance,
    /// a failed insert leaves it untouched.
    fn save<Exec: Executor>(&mut self, executor: &Exec) -> impl Future<Output = Result<()>> + Send {
        async move {
            let schema = Self::schema();
            let mut args = Vec::with_capacity(schema.fields().len());
            let mut resolved = Vec::new();
            for field in schema.ordinary_fields().chain([schema.primary_key()]) {
                let current = current_value(self, field)?;
                let was_null = current.is_null();
                let value = field.resolve(current);
                if was_null && !value.is_null() {
                    resolved.push((field.name(), args.len()));
                }
                args.push(value);
            }
            let affected = executor.execute(schema.insert_sql(), &args).await?;
            for (name, i) in resolved {
                self.set_value(name, mem::take(&mut args[i]))?;
            }
            check_rows_affected(executor.row_count_policy(), "insert", schema, affected.rows_affected)
        }
    }

    /// Write the current attribute values, defaults are not applied.
    fn update<Exec: Executor>(&self, executor: &Exec) -> impl Future<Output = Result<()>> + Send {
        async move {
            let schema = Self::schema();
            let args = schema
                .ordinary_fields()
                .chain([schema.primary_key()])
                .map(|field| current_value(self, field))
                .collect::<Result<Vec<_>>>()?;
            let affected = executor.execute(schema.update_sql(), &args).await?;
            check_rows_affected(executor.row_count_policy(), "update", schema, affected.rows_affected)
        }
    }

    /// Delete the row having the primary key of the instance.
    fn remove<Exec: Executor>(&self, executor: &Exec) -> impl Future<Output = Result<()>> + Send {
        async move {
            let schema = Self::schema();
            let args = [current_value(self, schema.primary_key())?];
            let affected = executor.execute(schema.delete_sql(), &args).await?;
            check_rows_affected(executor.row_count_policy(), "delete", schema, affected.rows_affected)
        }
    }

    fn create_table<Exec: Executor>(
        executor: &Exec,
        if_not_exists: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        let sql = Self::schema().create_table_sql(if_not_exists);
        async move { executor.execute(&sql, &[]).await.map(|_| ()) }
    }

    fn drop_table<Exec: Executor>(
        executor: &Exec,
        if_exists: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        let sql = Self::schema().drop_table_sql(if_exists);
        async move { executor.execute(&sql, &[]).await.map(|_| ()) }
    }
}

fn current_value<E: Entity>(entity: &E, field: &FieldDef) -> Result<Value> {
    entity.get_value(field.name()).ok_or_else(|| {
        SchemaError::UnknownAttribute {
            entity: E::schema().entity_name().to_string(),
            attribute: field.name().to_string(),
        }
        .into()
    })
}

/// Apply the row count policy to the outcome of a single row write.
pub fn check_rows_affected(
    policy: RowCountPolicy,
    operation: &'static str,
    schema: &Schema,
    affected: u64,
) -> Result<()> {
    if affected == 1 {
        return Ok(());
    }
    let error = RowCountError {
        operation,
        table: schema.table_name().to_string(),
        affected,
    };
    match policy {
        RowCountPolicy::Warn => {
            log::warn!("{}", error);
            Ok(())
        }
        RowCountPolicy::Fail => {
            let error = Error::new(error);
            log::error!("{:#}", error);
            Err(error)
        }
    }
}
