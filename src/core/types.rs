use chrono::Utc;
use uuid::Uuid;
use super::{DataType, ModelError, Result, Value};

/// How a column is filled when an insert leaves it out.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// A fresh v4 uuid per row
    GeneratedUuid,
    /// The insert's wall-clock time
    Now,
    Constant(Value),
}

impl ColumnDefault {
    pub fn produce(&self) -> Value {
        match self {
            Self::GeneratedUuid => Value::Uuid(Uuid::new_v4()),
            Self::Now => Value::Timestamp(Utc::now()),
            Self::Constant(value) => value.clone(),
        }
    }

    /// SQL expression used for `DEFAULT` in rendered DDL.
    pub fn sql(&self) -> String {
        match self {
            Self::GeneratedUuid => "uuid_generate_v4()".to_string(),
            Self::Now => "now()".to_string(),
            Self::Constant(Value::Null) => "NULL".to_string(),
            Self::Constant(Value::Text(s)) => format!("'{}'", s.replace('\'', "''")),
            Self::Constant(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_to(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if matches!(value, Value::Null) {
            if !self.nullable {
                return Err(ModelError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(ModelError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}
