use crate::{FieldDef, Filter, GenericSqlWriter, SchemaError, SqlWriter, Value};
use std::{
    borrow::Cow,
    fmt::{self, Debug},
};

/// Mapping metadata of an entity type: table, fields and the SQL templates shared by
/// all of its instances.
///
/// It is built once per entity through [`Schema::builder`] and never changes after.
/// Templates use `?` as placeholder and list the ordinary fields in declaration order
/// followed by the primary key, which fixes the order of the bound arguments.
pub struct Schema {
    entity: Cow<'static, str>,
    table: Cow<'static, str>,
    fields: Box<[FieldDef]>,
    primary_key: usize,
    ordinary: Box<[usize]>,
    writer: &'static dyn SqlWriter,
    select: String,
    select_count: String,
    insert: String,
    update: String,
    delete: String,
}

pub struct SchemaBuilder {
    entity: Cow<'static, str>,
    table: Option<Cow<'static, str>>,
    fields: Vec<FieldDef>,
    writer: &'static dyn SqlWriter,
}

impl SchemaBuilder {
    /// Table name, defaults to the entity name.
    pub fn table(mut self, table: impl Into<Cow<'static, str>>) -> Self {
        self.table = Some(table.into());
        self
    }
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }
    /// Dialect used to quote identifiers in the templates.
    pub fn writer(mut self, writer: &'static dyn SqlWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let entity = self.entity;
        let table = self.table.unwrap_or_else(|| entity.clone());
        log::info!("found model: {} (table: {})", entity, table);
        let mut primary_key: Option<usize> = None;
        let mut ordinary = Vec::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    entity: entity.to_string(),
                    field: field.name.to_string(),
                });
            }
            log::debug!("  found mapping: {} ==> {}", field.name, field);
            if field.primary_key {
                if let Some(first) = primary_key {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        entity: entity.to_string(),
                        first: self.fields[first].name.to_string(),
                        second: field.name.to_string(),
                    });
                }
                primary_key = Some(i);
            } else {
                ordinary.push(i);
            }
        }
        let Some(primary_key) = primary_key else {
            return Err(SchemaError::MissingPrimaryKey {
                entity: entity.to_string(),
            });
        };
        let key = self.fields[primary_key].name();
        let ordinary_names: Vec<&str> = ordinary.iter().map(|i| self.fields[*i].name()).collect();
        let writer = self.writer;

        let mut select = String::with_capacity(128);
        let columns: Vec<&str> = [key]
            .into_iter()
            .chain(ordinary_names.iter().copied())
            .collect();
        writer.write_select(&mut select, &table, &columns);

        let mut select_count = String::with_capacity(64);
        writer.write_select_count(&mut select_count, &table, key);

        let mut insert = String::with_capacity(128);
        let columns: Vec<&str> = ordinary_names.iter().copied().chain([key]).collect();
        writer.write_insert(&mut insert, &table, &columns);

        let mut update = String::with_capacity(128);
        writer.write_update(&mut update, &table, &ordinary_names, key);

        let mut delete = String::with_capacity(64);
        writer.write_delete(&mut delete, &table, key);

        Ok(Schema {
            entity,
            table,
            fields: self.fields.into(),
            primary_key,
            ordinary: ordinary.into(),
            writer,
            select,
            select_count,
            insert,
            update,
            delete,
        })
    }
}

impl Schema {
    pub fn builder(entity: impl Into<Cow<'static, str>>) -> SchemaBuilder {
        SchemaBuilder {
            entity: entity.into(),
            table: None,
            fields: Vec::new(),
            writer: &GenericSqlWriter,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity
    }
    pub fn table_name(&self) -> &str {
        &self.table
    }
    /// All the fields, in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
    pub fn primary_key(&self) -> &FieldDef {
        &self.fields[self.primary_key]
    }
    /// Fields other than the primary key, in declaration order.
    pub fn ordinary_fields(&self) -> impl ExactSizeIterator<Item = &FieldDef> + Clone {
        self.ordinary.iter().map(|i| &self.fields[*i])
    }
    pub fn writer(&self) -> &'static dyn SqlWriter {
        self.writer
    }

    pub fn select_sql(&self) -> &str {
        &self.select
    }
    pub fn select_count_sql(&self) -> &str {
        &self.select_count
    }
    pub fn insert_sql(&self) -> &str {
        &self.insert
    }
    pub fn update_sql(&self) -> &str {
        &self.update
    }
    pub fn delete_sql(&self) -> &str {
        &self.delete
    }

    pub fn create_table_sql(&self, if_not_exists: bool) -> String {
        let mut out = String::with_capacity(256);
        self.writer
            .write_create_table(&mut out, &self.table, &self.fields, if_not_exists);
        out
    }
    pub fn drop_table_sql(&self, if_exists: bool) -> String {
        let mut out = String::with_capacity(64);
        self.writer.write_drop_table(&mut out, &self.table, if_exists);
        out
    }

    pub fn check_attribute(&self, name: &str) -> Result<&FieldDef, SchemaError> {
        self.field(name).ok_or_else(|| SchemaError::UnknownAttribute {
            entity: self.entity.to_string(),
            attribute: name.to_string(),
        })
    }

    /// The select template completed with the clauses of `filter` and its arguments.
    pub fn select_filtered(&self, filter: &Filter) -> Result<(String, Vec<Value>), SchemaError> {
        self.filtered(&self.select, filter)
    }

    /// The count template completed with the conditions of `filter` and its arguments.
    pub fn count_filtered(&self, filter: &Filter) -> Result<(String, Vec<Value>), SchemaError> {
        self.filtered(&self.select_count, &filter.conditions_only())
    }

    fn filtered(
        &self,
        template: &str,
        filter: &Filter,
    ) -> Result<(String, Vec<Value>), SchemaError> {
        for column in filter.columns() {
            self.check_attribute(column)?;
        }
        let mut sql = String::with_capacity(template.len() + 64);
        let mut args = Vec::with_capacity(filter.conditions.len() + 2);
        sql.push_str(template);
        self.writer.write_filter(&mut sql, filter, &mut args);
        Ok((sql, args))
    }
}

impl Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("entity", &self.entity)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("primary_key", &self.primary_key().name)
            .field("writer", &"..")
            .finish()
    }
}
