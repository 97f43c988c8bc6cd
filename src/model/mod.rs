//! Base model layer.
//!
//! A model is declared by implementing [`Model`] on a marker type (usually
//! through the [`model!`](crate::model!) macro). Its rows are handled as
//! [`Entity<M>`] values, which expose the natural-case field API and the
//! CRUD operations.
//!
//! ```
//! use modelbase::{model, record, Entity, Options};
//! use modelbase::storage::{MemoryStore, TableSchema};
//! use modelbase::{Column, DataType};
//!
//! model! {
//!     /// A blog post.
//!     pub struct Post;
//! }
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store
//!     .create_table(TableSchema::standard("posts", vec![Column::new("title", DataType::Text)]))
//!     .await?;
//!
//! let opts = Options::using(store.clone());
//! let post = Entity::<Post>::create(record! { "title" => "Hello" }, &opts).await?;
//! let found = Entity::<Post>::fetch(record! { "id" => post.get("id").cloned() }, &opts).await?;
//! assert_eq!(found, Some(post));
//! # Ok::<(), modelbase::ModelError>(())
//! # }).unwrap();
//! ```

mod crud;
mod entity;
mod options;
mod properties;

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use lazy_static::lazy_static;
use crate::interface::Handle;
use crate::naming::table_name_of;

pub use entity::Entity;
pub use options::{Options, SaveMethod, SaveOptions};
pub use properties::Properties;

lazy_static! {
    static ref DERIVED_TABLE_NAMES: RwLock<HashMap<TypeId, String>> = RwLock::new(HashMap::new());
}

/// Table name derived from the type name of `M`, computed once per type.
pub fn derived_table_name<M: 'static>() -> String {
    let id = TypeId::of::<M>();
    if let Some(name) = DERIVED_TABLE_NAMES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return name.clone();
    }

    let name = table_name_of::<M>();
    DERIVED_TABLE_NAMES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_insert(name)
        .clone()
}

/// Type-level configuration of an entity kind.
pub trait Model: Send + Sync + Sized + 'static {
    /// Relation backing this model. Defaults to the pluralized, underscored
    /// type name (`UserProfile` -> `user_profiles`).
    fn table_name() -> String {
        derived_table_name::<Self>()
    }

    /// Fields that identify one row, in natural case. Empty means `id`.
    fn identity_keys() -> &'static [&'static str] {
        &[]
    }

    /// Handle used by this model when a call brings none of its own.
    fn handle() -> Option<Handle> {
        None
    }
}

/// Declares a model marker type.
///
/// ```
/// use modelbase::{model, Model};
///
/// model! {
///     pub struct Account;
/// }
///
/// model! {
///     pub struct Membership => "group_memberships", keys ["userId", "groupId"];
/// }
///
/// assert_eq!(Account::table_name(), "accounts");
/// assert_eq!(Membership::table_name(), "group_memberships");
/// assert_eq!(Membership::identity_keys(), &["userId", "groupId"]);
/// ```
#[macro_export]
macro_rules! model {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::Model for $name {}
    };
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $table:literal $(, keys [$($key:literal),* $(,)?])?;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $name;

        impl $crate::Model for $name {
            fn table_name() -> String {
                String::from($table)
            }

            $(
                fn identity_keys() -> &'static [&'static str] {
                    &[$($key),*]
                }
            )?
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person;
    impl Model for Person {}

    crate::model! {
        struct Ledger => "ledger_entries", keys ["entryId"];
    }

    #[test]
    fn test_derived_table_name_is_cached() {
        assert_eq!(Person::table_name(), "people");
        assert_eq!(Person::table_name(), "people");
        let cached = DERIVED_TABLE_NAMES.read().unwrap();
        assert_eq!(cached.get(&TypeId::of::<Person>()).map(String::as_str), Some("people"));
    }

    #[test]
    fn test_declared_table_and_keys() {
        assert_eq!(Ledger::table_name(), "ledger_entries");
        assert_eq!(Ledger::identity_keys(), &["entryId"]);
        assert!(Ledger::handle().is_none());
    }
}
