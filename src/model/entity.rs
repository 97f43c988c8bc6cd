use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use serde::{Serialize, Serializer};
use super::{Model, Options, Properties};
use crate::core::{FromValue, ModelError, Record, Result, Value};
use crate::interface::TransactionScope;

/// An instance of model `M`.
///
/// All field access goes through [`Properties`], which keeps the natural
/// (camelCase) view and the storage (snake_case) snapshot in step. Internal
/// bookkeeping such as the bound transaction lives in private fields and is
/// never reported as a field.
pub struct Entity<M: Model> {
    pub(crate) properties: Properties,
    pub(crate) transaction: Option<Arc<dyn TransactionScope>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Entity<M> {
    pub(crate) fn from_properties(properties: Properties) -> Self {
        Self {
            properties,
            transaction: None,
            _model: PhantomData,
        }
    }

    /// Wraps a row returned by the store. Calls made inside a transaction
    /// hand back entities bound to it.
    pub(crate) fn wrap(row: Record, opts: &Options) -> Self {
        let mut entity = Self::from_properties(Properties::from_row(row));
        entity.transaction = opts.transaction.clone();
        entity
    }

    /// Builds an unsaved entity. No I/O.
    pub fn forge(fields: Record) -> Self {
        Self::from_properties(Properties::new(fields))
    }

    pub fn new() -> Self {
        Self::forge(Record::new())
    }

    /// Relation backing `M`.
    pub fn table_name(&self) -> String {
        M::table_name()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Typed read. A missing field reads as `NULL`, so ask for `Option<T>`
    /// when the field may be absent.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get(name).unwrap_or(&Value::Null);
        T::from_value(value).map_err(|err| match err {
            ModelError::TypeMismatch(detail) => {
                ModelError::TypeMismatch(format!("field '{}': {}", name, detail))
            }
            other => other,
        })
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.properties.set(name, value.into());
        self
    }

    /// Removes a field from the entity and its storage snapshot.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    /// Field names the caller can see, in natural case.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys()
    }

    pub fn fields(&self) -> &Record {
        self.properties.natural()
    }

    /// Snapshot of the row as the store names its columns.
    pub fn storage_fields(&self) -> &Record {
        self.properties.storage()
    }

    pub fn into_fields(self) -> Record {
        self.properties.into_natural()
    }

    /// Binds later persistence calls on this entity to `scope`.
    pub fn with_transaction(mut self, scope: Arc<dyn TransactionScope>) -> Self {
        self.bind_transaction(scope);
        self
    }

    pub fn bind_transaction(&mut self, scope: Arc<dyn TransactionScope>) {
        self.transaction = Some(scope);
    }

    pub fn unbind_transaction(&mut self) -> Option<Arc<dyn TransactionScope>> {
        self.transaction.take()
    }

    pub fn transaction(&self) -> Option<&Arc<dyn TransactionScope>> {
        self.transaction.as_ref()
    }

    pub fn to_json(&self) -> Result<String> {
        self.properties.natural().to_json()
    }

    /// JSON text of the natural fields.
    pub fn serialize(&self) -> String {
        // String keys and scalar values: serde_json has no failing case for a Record
        self.to_json().unwrap_or_else(|_| String::from("{}"))
    }
}

impl<M: Model> Default for Entity<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for Entity<M> {
    fn clone(&self) -> Self {
        Self {
            properties: self.properties.clone(),
            transaction: self.transaction.clone(),
            _model: PhantomData,
        }
    }
}

/// Entities are equal when their natural fields are.
impl<M: Model> PartialEq for Entity<M> {
    fn eq(&self, other: &Self) -> bool {
        self.properties.natural() == other.properties.natural()
    }
}

impl<M: Model> fmt::Debug for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("table", &M::table_name())
            .field("fields", self.properties.natural())
            .field("transaction", &self.transaction.as_ref().map(|t| t.id()))
            .finish()
    }
}

impl<M: Model> fmt::Display for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl<M: Model> Serialize for Entity<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.properties.natural().serialize(serializer)
    }
}

impl<M: Model> From<Record> for Entity<M> {
    fn from(fields: Record) -> Self {
        Self::forge(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    struct Widget;
    impl Model for Widget {}

    #[test]
    fn test_forge_with_properties() {
        let widget = Entity::<Widget>::forge(record! { "foo" => "bar", "bar" => "baz" });
        assert_eq!(widget.get("foo"), Some(&Value::from("bar")));
        assert_eq!(widget.get("bar"), Some(&Value::from("baz")));
        assert!(widget.transaction().is_none());
    }

    #[test]
    fn test_set_then_read_back() {
        let mut widget = Entity::<Widget>::new();
        widget.set("fooBar", "baz");

        assert_eq!(widget.get("fooBar"), Some(&Value::from("baz")));
        assert_eq!(widget.fields().get("fooBar"), Some(&Value::from("baz")));
        assert_eq!(widget.storage_fields().get("foo_bar"), Some(&Value::from("baz")));
    }

    #[test]
    fn test_keys_report_user_fields_only() {
        let widget = Entity::<Widget>::forge(record! { "foo" => "bar" });
        assert_eq!(widget.keys().collect::<Vec<_>>(), vec!["foo"]);
    }

    #[test]
    fn test_remove_field() {
        let mut widget = Entity::<Widget>::forge(record! { "foo" => "bar", "fooBar" => 1 });
        widget.remove("foo");
        widget.remove("fooBar");

        assert!(widget.get("foo").is_none());
        assert!(widget.keys().next().is_none());
        assert!(widget.storage_fields().is_empty());
    }

    #[test]
    fn test_get_as() {
        let widget = Entity::<Widget>::forge(record! { "count" => 3, "name" => "w" });
        assert_eq!(widget.get_as::<i64>("count").unwrap(), 3);
        assert_eq!(widget.get_as::<Option<String>>("missing").unwrap(), None);

        let err = widget.get_as::<bool>("name").unwrap_err();
        assert!(err.to_string().contains("field 'name'"));
    }

    #[test]
    fn test_serialize_natural_fields() {
        let widget = Entity::<Widget>::forge(record! { "foo" => "bar", "bar" => "baz" });
        assert_eq!(widget.serialize(), r#"{"bar":"baz","foo":"bar"}"#);
        assert_eq!(widget.to_string(), widget.serialize());
    }

    #[test]
    fn test_table_name_from_instance() {
        assert_eq!(Entity::<Widget>::new().table_name(), "widgets");
    }
}
