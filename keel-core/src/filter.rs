use crate::Value;
use std::borrow::Cow;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Single table selection: equality conditions, ordering and a limit/offset pair.
///
/// ```rust
/// use keel_core::{Filter, Order};
/// let filter = Filter::new()
///     .eq("user_id", "0015")
///     .order_by("created_at", Order::Desc)
///     .limit(10)
///     .offset(20);
/// assert_eq!(filter.conditions.len(), 1);
/// ```
#[derive(Default, Debug, Clone)]
pub struct Filter {
    pub conditions: Vec<(Cow<'static, str>, Value)>,
    pub order_by: Vec<(Cow<'static, str>, Order)>,
    pub limit: Option<u64>,
    /// Only written when `limit` is present.
    pub offset: Option<u64>,
}

impl Filter {
    /// Matches every row.
    pub fn new() -> Self {
        Self::default()
    }
    pub fn eq(mut self, column: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }
    pub fn order_by(mut self, column: impl Into<Cow<'static, str>>, order: Order) -> Self {
        self.order_by.push((column.into(), order));
        self
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
    /// Same conditions, without ordering and limits.
    pub fn conditions_only(&self) -> Filter {
        Filter {
            conditions: self.conditions.clone(),
            ..Default::default()
        }
    }
    pub(crate) fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .map(|(c, _)| c.as_ref())
            .chain(self.order_by.iter().map(|(c, _)| c.as_ref()))
    }
}
