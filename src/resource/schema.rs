//! Schema Descriptor
//!
//! Declares output columns as (name, type, accessor, transforms). Each
//! column is resolved independently of every other column, from the source
//! item alone, so columns can be added or reordered freely.

use super::row::Row;
use serde::Serialize;
use serde_json::Value;

/// Semantic type of a column as exposed to the query engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Json,
}

/// Post-fetch transform applied to an extracted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Lower-case strings; other values pass through
    ToLower,
    /// Coerce numbers and numeric strings to an integer; anything else becomes null
    ToInt,
    /// Turn a resource id into its list of akas
    IdToAkas,
}

impl Transform {
    pub fn apply(self, value: Value) -> Value {
        match self {
            Transform::ToLower => match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other,
            },
            Transform::ToInt => to_int(&value).map(Value::from).unwrap_or(Value::Null),
            Transform::IdToAkas => match value {
                Value::String(id) => Value::Array(vec![
                    Value::String(format!("azure://{}", id)),
                    Value::String(format!("azure://{}", id.to_lowercase())),
                ]),
                _ => Value::Null,
            },
        }
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        },
        _ => None,
    }
}

/// One output column of a table over items of type `T`
pub struct Column<T> {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub description: &'static str,
    accessor: fn(&T) -> Value,
    transforms: &'static [Transform],
}

impl<T> Column<T> {
    pub const fn new(
        name: &'static str,
        column_type: ColumnType,
        description: &'static str,
        accessor: fn(&T) -> Value,
    ) -> Self {
        Self {
            name,
            column_type,
            description,
            accessor,
            transforms: &[],
        }
    }

    /// Apply `transforms` in order after extraction
    pub fn with_transforms(self, transforms: &'static [Transform]) -> Self {
        Self { transforms, ..self }
    }

    pub fn transforms(&self) -> &'static [Transform] {
        self.transforms
    }

    /// Resolve this column for one item
    pub fn resolve(&self, item: &T) -> Value {
        self.transforms
            .iter()
            .fold((self.accessor)(item), |value, transform| transform.apply(value))
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("column_type", &self.column_type)
            .field("transforms", &self.transforms)
            .finish()
    }
}

/// A table definition: columns plus the key columns the host must supply
#[derive(Debug)]
pub struct Table<T> {
    pub name: &'static str,
    pub description: &'static str,
    /// Every one of these must be equality-constrained for a point lookup
    pub get_key_columns: &'static [&'static str],
    /// Equality constraint required to list
    pub list_key_columns: &'static [&'static str],
    pub columns: Vec<Column<T>>,
}

impl<T> Table<T> {
    /// Evaluate every column for one item, in declaration order
    pub fn row(&self, item: &T) -> Row {
        let mut row = Row::with_capacity(self.columns.len());
        for column in &self.columns {
            row.insert(column.name, column.resolve(item));
        }
        row
    }

    pub fn column(&self, name: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Public description of every column, including its key roles
    pub fn describe(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .map(|c| ColumnSummary {
                name: c.name,
                column_type: c.column_type,
                description: c.description,
                transforms: c.transforms(),
                get_key: self.get_key_columns.contains(&c.name),
                list_key: self.list_key_columns.contains(&c.name),
            })
            .collect()
    }
}

/// One column as shown to users of the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub description: &'static str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub transforms: &'static [Transform],
    /// Required for a point lookup
    pub get_key: bool,
    /// Required to list
    pub list_key: bool,
}
