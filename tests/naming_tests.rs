/// Naming tests
///
/// Key translation between entity fields and storage columns, and table
/// name derivation.
/// Run with: cargo test --test naming_tests

use modelbase::naming::{tableize, to_natural_case, to_natural_key, to_storage_case, to_storage_key};
use modelbase::{Model, model, record};

#[test]
fn test_storage_key_examples() {
    assert_eq!(to_storage_key("fooBar"), "foo_bar");
    assert_eq!(to_storage_key("createdAt"), "created_at");
    assert_eq!(to_storage_key("id"), "id");
    assert_eq!(to_storage_key("address1Line"), "address1_line");
    assert_eq!(to_storage_key("already_snake"), "already_snake");
}

#[test]
fn test_natural_key_examples() {
    assert_eq!(to_natural_key("foo_bar"), "fooBar");
    assert_eq!(to_natural_key("deleted_at"), "deletedAt");
    assert_eq!(to_natural_key("is_deleted"), "isDeleted");
    assert_eq!(to_natural_key("alreadyCamel"), "alreadyCamel");
}

#[test]
fn test_round_trip_law() {
    let keys = [
        "a",
        "foo",
        "fooBar",
        "fooBarBaz",
        "createdAt",
        "userId",
        "aBC",
        "line2",
        "address1Line",
        "x9Y8z7",
    ];

    for key in keys {
        let storage = to_storage_key(key);
        assert_eq!(to_natural_key(&storage), key, "round trip through '{}'", storage);
    }
}

#[test]
fn test_record_translation_keeps_values() {
    let natural = record! { "fooBar" => "baz", "count" => 3 };
    let storage = to_storage_case(&natural);

    assert_eq!(storage, record! { "foo_bar" => "baz", "count" => 3 });
    assert_eq!(to_natural_case(&storage), natural);
}

#[test]
fn test_tableize_type_names() {
    assert_eq!(tableize("Model"), "models");
    assert_eq!(tableize("BlogPost"), "blog_posts");
    assert_eq!(tableize("Category"), "categories");
    assert_eq!(tableize("Person"), "people");
}

model! {
    struct InvoiceLine;
}

model! {
    struct Legacy => "tbl_legacy";
}

#[test]
fn test_model_table_names() {
    assert_eq!(InvoiceLine::table_name(), "invoice_lines");
    assert_eq!(Legacy::table_name(), "tbl_legacy");
    assert!(Legacy::identity_keys().is_empty());
}
