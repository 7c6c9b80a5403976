//! Facade tests against the in-process store
//!
//! Run with: cargo test --test facade

use firestore_facade::firestore::{Firestore, MemoryStore, Query};
use firestore_facade::{
    Collection, CollectionGroup, FirebaseError, Filter, FilterQuery, FirestoreError, OrderBy, Record,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record literal must be an object")
}

/// "users" with Alice and Bob, plus posts under each of them
fn seeded() -> Firestore<MemoryStore> {
    let store = MemoryStore::with_documents(vec![
        ("users/a", record(json!({"name": "Alice", "age": 30, "tags": ["admin", "dev"]}))),
        ("users/b", record(json!({"name": "Bob", "age": 25, "tags": ["dev"]}))),
        ("users/a/posts/p1", record(json!({"title": "Hello", "likes": 3}))),
        ("users/a/posts/p2", record(json!({"title": "Again", "likes": 10}))),
        ("users/b/posts/p3", record(json!({"title": "Hi", "likes": 7}))),
    ]);
    Firestore::with_store("demo", store)
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct NameOnly {
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    #[serde(rename = "docId")]
    id: String,
    name: String,
    age: u32,
}

#[tokio::test]
async fn test_search_users_by_name() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    let results = users.search(Filter::equal("name", "Alice"), None, None).await.unwrap();

    assert_eq!(
        results.to_list(true),
        vec![record(json!({"name": "Alice", "age": 30, "tags": ["admin", "dev"], "docId": "a"}))]
    );
}

#[tokio::test]
async fn test_search_with_filter_list_order_and_limit() {
    let firestore = seeded();
    let posts = Collection::new(&firestore, "users/a/posts");

    let filters = vec![
        Filter::new("likes", ">", json!(1)).unwrap(),
        Filter::value_in("title", vec![json!("Hello"), json!("Again")]),
    ];
    let results = posts
        .search(filters, Some(OrderBy::descending("likes")), Some(1))
        .await
        .unwrap();
    assert_eq!(results.ids(), vec!["p2"]);
}

#[tokio::test]
async fn test_range_filters_on_two_fields_fail_in_store() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    let err = users
        .search(
            vec![Filter::new("age", ">", json!(1)).unwrap(), Filter::new("name", "<", json!("Z")).unwrap()],
            None,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FirebaseError::Firestore(FirestoreError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_to_list_has_one_entry_per_record() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    let results = users.get_all().await.unwrap();
    let list = results.to_list(true);
    assert_eq!(list.len(), 2);

    let ids: Vec<&str> = list.iter().map(|r| r["docId"].as_str().unwrap()).collect();
    assert_eq!(ids, results.ids());
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn test_to_dict_keys_match_ids_without_doc_id() {
    let firestore = seeded();
    let group = CollectionGroup::new(&firestore, "posts").unwrap();

    let results = group.get_all().await.unwrap();
    let dict = results.to_dict(false);

    let keys: HashSet<&str> = dict.keys().map(String::as_str).collect();
    let ids: HashSet<&str> = results.ids().into_iter().collect();
    assert_eq!(keys, ids);
    assert_eq!(keys.len(), 3);
    assert!(dict.values().all(|record| !record.contains_key("docId")));
}

#[tokio::test]
async fn test_get_one_missing_returns_none() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    assert!(users.get_one("zed").await.unwrap().is_none());
    assert!(!users.is_document_exists("zed").await.unwrap());
    assert!(users.is_document_exists("a").await.unwrap());
}

#[tokio::test]
async fn test_update_missing_fails_with_not_found() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");
    let err = users.update("zed", record(json!({"age": 1}))).await.unwrap_err();
    assert!(err.is_not_found());

    let group = CollectionGroup::new(&firestore, "posts").unwrap();
    let err = group.update("p9", "users/a", record(json!({"likes": 1}))).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_merges_fields() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    users.update("b", record(json!({"age": 26}))).await.unwrap();
    let bob = users.get_one("b").await.unwrap().unwrap();
    assert_eq!(bob.data()["age"], json!(26));
    assert_eq!(bob.data()["name"], json!("Bob"));

    let group = CollectionGroup::new(&firestore, "posts").unwrap();
    group.update("p1", "users/a/posts", record(json!({"likes": 4}))).await.unwrap();
    let post = group.get_one("p1", "users/a").await.unwrap().unwrap();
    assert_eq!(post.data()["likes"], json!(4));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    users.delete("a").await.unwrap();
    users.delete("a").await.unwrap();
    assert!(users.get_one("a").await.unwrap().is_none());
    // subcollections are independent documents
    let posts = firestore.collection_group("posts").get().await.unwrap();
    assert_eq!(posts.len(), 3);
}

#[tokio::test]
async fn test_add_generates_id() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    let doc = users.add(record(json!({"name": "Carol"})), None).await.unwrap();
    assert_eq!(doc.id().len(), 20);
    let carol = users.get_one(doc.id()).await.unwrap().unwrap();
    assert_eq!(carol.data()["name"], json!("Carol"));

    let named = users.add(record(json!({"name": "Dan"})), Some("d")).await.unwrap();
    assert_eq!(named.path, "users/d");
}

#[tokio::test]
async fn test_group_get_one_resolves_parent_document() {
    let firestore = seeded();
    let group = CollectionGroup::new(&firestore, "posts").unwrap();

    let post = group.get_one("p1", "users/a").await.unwrap().unwrap();
    assert_eq!(post.path(), "users/a/posts/p1");
    assert_eq!(post.data()["title"], json!("Hello"));

    // p3 lives under users/b only
    assert!(group.get_one("p3", "users/a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_group_search_spans_parents() {
    let firestore = seeded();
    let group = CollectionGroup::new(&firestore, "posts").unwrap();

    let popular = group
        .search(Filter::new("likes", ">=", json!(5)).unwrap(), Some(OrderBy::new("likes")), None)
        .await
        .unwrap();
    assert_eq!(popular.ids(), vec!["p3", "p2"]);

    let all = group.search(FilterQuery::None, None, Some(0)).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_get_first_from_stream() {
    let firestore = seeded();
    let group = CollectionGroup::new(&firestore, "posts").unwrap();

    let post = group.get_first_from_stream("p3").await.unwrap().unwrap();
    assert_eq!(post.path(), "users/b/posts/p3");
    assert!(group.get_first_from_stream("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_projection_rejecting_extra_field_returns_none() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");
    users.add(record(json!({"name": "Carol"})), Some("c")).await.unwrap();
    let carol = users.get_one("c").await.unwrap().unwrap();

    // the stored fields fit, the injected id does not
    assert_eq!(carol.to_class::<NameOnly>(), None);
    let err = carol.try_to_class::<NameOnly>().unwrap_err();
    assert_eq!(err.id, "c");
    assert!(err.to_string().contains("docId"));
}

#[tokio::test]
async fn test_to_class_carries_doc_id() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");
    let alice = users.get_one("a").await.unwrap().unwrap();

    assert_eq!(
        alice.to_class::<User>(),
        Some(User {
            id: "a".to_string(),
            name: "Alice".to_string(),
            age: 30
        })
    );
}

#[tokio::test]
async fn test_typed_lists() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");
    let results = users.search(FilterQuery::None, Some(OrderBy::new("age")), None).await.unwrap();

    let typed: Vec<User> = results.to_list_as(true).unwrap();
    assert_eq!(
        typed,
        vec![
            User {
                id: "b".to_string(),
                name: "Bob".to_string(),
                age: 25
            },
            User {
                id: "a".to_string(),
                name: "Alice".to_string(),
                age: 30
            },
        ]
    );

    assert!(results.to_list_as::<NameOnly>(false).is_err());
    assert!(results.to_list_lossy::<NameOnly>(false).is_empty());
}

#[tokio::test]
async fn test_array_filters() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    let admins = users.search(Filter::array_contains("tags", "admin"), None, None).await.unwrap();
    assert_eq!(admins.ids(), vec!["a"]);

    let devs = users
        .search(Filter::array_contains_any("tags", vec![json!("dev"), json!("ops")]), None, None)
        .await
        .unwrap();
    assert_eq!(devs.len(), 2);
}

#[tokio::test]
async fn test_collection_rejects_nested_document_ids() {
    let firestore = seeded();
    let users = Collection::new(&firestore, "users");

    let err = users.get_one("a/posts/p1").await.unwrap_err();
    assert!(matches!(err, FirebaseError::Firestore(FirestoreError::InvalidArgument(_))));
    let err = users.get_one("a/posts").await.unwrap_err();
    assert!(matches!(err, FirebaseError::Firestore(FirestoreError::InvalidArgument(_))));
    assert!(users.delete("a/posts/p1").await.is_err());

    let group = CollectionGroup::new(&firestore, "posts").unwrap();
    assert!(group.get_one("p1", "users/a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalid_operator_rejected_before_any_query() {
    let err = Filter::new("name", "=~", json!("A")).unwrap_err();
    assert!(matches!(err, FirebaseError::InvalidOperator { ref op, .. } if op == "=~"));
}

#[tokio::test]
async fn test_handles_share_the_store() {
    let firestore = seeded();
    let writer = Collection::new(&firestore, "users");
    let reader = writer.clone();

    writer.add(record(json!({"name": "Eve"})), Some("e")).await.unwrap();
    assert!(reader.is_document_exists("e").await.unwrap());
}
