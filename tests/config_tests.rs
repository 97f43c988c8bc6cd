/// Config tests
///
/// Process-wide default handle. Kept in its own test binary because the
/// default is shared by every test in the process.
/// Run with: cargo test --test config_tests

use std::sync::Arc;
use modelbase::{
    Column, Config, DataType, Entity, Handle, MemoryStore, Options, SaveOptions, TableSchema,
    model, record,
};

model! {
    struct Widget => "models";
}

async fn store_with_models() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .create_table(TableSchema::standard("models", vec![Column::new("foo", DataType::Text)]))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_global_handle_lifecycle() {
    let mut widget = Entity::<Widget>::forge(record! { "foo" => "bar" });
    assert!(widget.save(&SaveOptions::new()).await.unwrap_err().is_missing_handle());

    let global = store_with_models().await;
    Config::set_handle(Arc::new(global.clone()));
    widget.save(&SaveOptions::new()).await.unwrap();
    assert_eq!(global.row_count("models").await.unwrap(), 1);

    // A scoped handle wins over the process-wide one
    let scoped = store_with_models().await;
    let scoped_handle: Handle = Arc::new(scoped.clone());
    Config::scope(scoped_handle, async {
        Entity::<Widget>::create(record! { "foo" => "scoped" }, &Options::new())
            .await
            .unwrap();
    })
    .await;
    assert_eq!(scoped.row_count("models").await.unwrap(), 1);
    assert_eq!(global.row_count("models").await.unwrap(), 1);

    assert!(Config::clear().is_some());
    assert!(Config::global_handle().is_none());
    let err = Entity::<Widget>::collection(record! {}, &Options::new())
        .await
        .unwrap_err();
    assert!(err.is_missing_handle());
}
