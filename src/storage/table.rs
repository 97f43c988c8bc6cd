use std::collections::BTreeMap;
use crate::core::{Column, ColumnDefault, DataType, ModelError, Record, Result, Value};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";
pub const IS_DELETED: &str = "is_deleted";

/// Shape of one relation: typed columns plus an optional primary key.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key: Vec::new(),
        }
    }

    /// The relation every model table gets by default: a generated uuid `id`
    /// primary key, the caller's columns, audit timestamps and a soft-delete
    /// flag.
    pub fn standard(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut all = Vec::with_capacity(columns.len() + 5);
        all.push(
            Column::new("id", DataType::Uuid)
                .not_null()
                .default_to(ColumnDefault::GeneratedUuid),
        );
        all.extend(columns);
        all.push(
            Column::new(CREATED_AT, DataType::Timestamp)
                .not_null()
                .default_to(ColumnDefault::Now),
        );
        all.push(
            Column::new(UPDATED_AT, DataType::Timestamp)
                .not_null()
                .default_to(ColumnDefault::Now),
        );
        all.push(
            Column::new(DELETED_AT, DataType::Timestamp)
                .default_to(ColumnDefault::Constant(Value::Null)),
        );
        all.push(
            Column::new(IS_DELETED, DataType::Boolean)
                .not_null()
                .default_to(ColumnDefault::Constant(Value::Boolean(false))),
        );

        Self::new(name, all).primary_key(&["id"])
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key
    }

    /// Renders PostgreSQL DDL for this relation.
    pub fn to_create_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                let mut line = format!("  {} {}", col.name, col.data_type.sql_name());
                if self.primary_key.len() == 1 && self.primary_key[0] == col.name {
                    line.push_str(" PRIMARY KEY");
                }
                if !col.nullable {
                    line.push_str(" NOT NULL");
                }
                if let Some(default) = &col.default {
                    line.push_str(&format!(" DEFAULT {}", default.sql()));
                }
                line
            })
            .collect();

        if self.primary_key.len() > 1 {
            lines.push(format!("  PRIMARY KEY ({})", self.primary_key.join(", ")));
        }

        let mut sql = String::new();
        if self
            .columns
            .iter()
            .any(|col| col.default == Some(ColumnDefault::GeneratedUuid))
        {
            sql.push_str("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";\n");
        }
        sql.push_str(&format!(
            "CREATE TABLE {} (\n{}\n);",
            self.name,
            lines.join(",\n")
        ));
        sql
    }
}

/// Rows of one relation keyed by store-wide row id, in insertion order.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<u64, Record>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, row_id: u64) -> Option<&Record> {
        self.rows.get(&row_id)
    }

    pub fn scan(&self) -> Vec<Record> {
        self.rows.values().cloned().collect()
    }

    /// Rows matching `predicate`, with their ids.
    pub fn matching(&self, predicate: &Record, limit: Option<usize>) -> Vec<(u64, Record)> {
        let iter = self
            .rows
            .iter()
            .filter(|(_, row)| row.matches(predicate))
            .map(|(id, row)| (*id, row.clone()));
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }

    pub fn check_columns(&self, payload: &Record) -> Result<()> {
        for key in payload.keys() {
            if !self.schema.has_column(key) {
                return Err(ModelError::ColumnNotFound(
                    key.to_string(),
                    self.schema.name.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Builds the full row an insert of `payload` produces: defaults for
    /// missing columns, coercion into column types, NOT NULL and type checks.
    pub fn materialize_insert(&self, payload: &Record, strict: bool) -> Result<Record> {
        if strict {
            self.check_columns(payload)?;
        }

        let mut row = payload.clone();
        for column in &self.schema.columns {
            let value = match payload.get(&column.name) {
                Some(value) => column.data_type.coerce(value.clone()),
                None => column
                    .default
                    .as_ref()
                    .map(ColumnDefault::produce)
                    .unwrap_or(Value::Null),
            };
            column.validate(&value)?;
            row.insert(column.name.clone(), value);
        }
        Ok(row)
    }

    /// Applies `payload` on top of `current`, validating touched columns.
    pub fn materialize_update(&self, current: &Record, payload: &Record, strict: bool) -> Result<Record> {
        if strict {
            self.check_columns(payload)?;
        }

        let mut row = current.clone();
        for (key, value) in payload.iter() {
            let value = match self.schema.column(key) {
                Some(column) => {
                    let value = column.data_type.coerce(value.clone());
                    column.validate(&value)?;
                    value
                }
                None => value.clone(),
            };
            row.insert(key.clone(), value);
        }
        Ok(row)
    }

    /// Fails when another row already holds the primary key of `row`.
    pub fn check_uniqueness(&self, row: &Record, skip: Option<u64>) -> Result<()> {
        if self.schema.primary_key.is_empty() {
            return Ok(());
        }

        let key: Record = self
            .schema
            .primary_key
            .iter()
            .map(|col| (col.clone(), row.get(col).cloned().unwrap_or(Value::Null)))
            .collect();

        let clash = self
            .rows
            .iter()
            .any(|(id, existing)| Some(*id) != skip && existing.matches(&key));
        if clash {
            return Err(ModelError::ConstraintViolation(format!(
                "Duplicate primary key ({}) in table '{}'",
                self.schema.primary_key.join(", "),
                self.schema.name
            )));
        }
        Ok(())
    }

    pub fn put(&mut self, row_id: u64, row: Record) {
        self.rows.insert(row_id, row);
    }

    pub fn remove(&mut self, row_id: u64) -> Option<Record> {
        self.rows.remove(&row_id)
    }
}
