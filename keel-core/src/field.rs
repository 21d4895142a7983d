use crate::Value;
use std::{
    borrow::Cow,
    fmt::{self, Debug, Display},
    sync::Arc,
};

/// Default applied to a column when the entity is saved with a NULL value.
#[derive(Clone, Default)]
pub enum DefaultValue {
    #[default]
    None,
    /// Literal used as is.
    Value(Value),
    /// Produces a fresh value every time a row is written (ids, timestamps).
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn is_none(&self) -> bool {
        matches!(self, DefaultValue::None)
    }
    /// Produce the default, invoking the factory if there is one.
    pub fn resolve(&self) -> Option<Value> {
        match self {
            DefaultValue::None => None,
            DefaultValue::Value(v) => Some(v.clone()),
            DefaultValue::Factory(f) => Some(f()),
        }
    }
}

impl Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::None => f.write_str("None"),
            DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultValue::Factory(..) => f.write_str("Factory(..)"),
        }
    }
}

/// Declarative description of one mapped attribute.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Attribute and column name.
    pub name: Cow<'static, str>,
    /// Column type used in `CREATE TABLE`, not validated.
    pub column_type: Cow<'static, str>,
    /// Whether the field is the primary key of the entity.
    pub primary_key: bool,
    /// Value used on save when the attribute is NULL.
    pub default: DefaultValue,
}

impl FieldDef {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        column_type: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            primary_key: false,
            default: DefaultValue::None,
        }
    }
    pub fn string(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, "varchar(100)")
    }
    pub fn integer(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, "bigint")
    }
    pub fn boolean(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, "boolean")
    }
    pub fn float(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, "real")
    }
    pub fn text(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, "text")
    }

    pub fn ddl(mut self, column_type: impl Into<Cow<'static, str>>) -> Self {
        self.column_type = column_type.into();
        self
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Value(value.into());
        self
    }
    /// The factory is called lazily, once per row written.
    pub fn default_with<F, V>(mut self, factory: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.default = DefaultValue::Factory(Arc::new(move || factory().into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value unless it is NULL and a default exists.
    pub fn resolve(&self, current: Value) -> Value {
        if current.is_null() {
            if let Some(value) = self.default.resolve() {
                log::debug!("using default value for {}: {:?}", self.name, value);
                return value;
            }
        }
        current
    }
}

impl Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.column_type, self.name)
    }
}
