//! Search and shape users with the facade
//!
//! Runs against the in-process store by default. Set
//! `FIRESTORE_EMULATOR_HOST` (and `FIRESTORE_PROJECT_ID`) to run the same
//! flow against an emulator instead.
//!
//! ```bash
//! RUST_LOG=firestore_facade=debug cargo run --example search_users
//! ```

use firestore_facade::firestore::{DocumentStore, Firestore, MemoryStore};
use firestore_facade::{Collection, CollectionGroup, FirebaseError, Filter, OrderBy, Record};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct User {
    #[serde(rename = "docId")]
    id: String,
    name: String,
    age: u32,
}

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

async fn run<S: DocumentStore>(firestore: Firestore<S>) -> Result<(), FirebaseError> {
    let users = Collection::new(&firestore, "users");
    for (id, name, age) in [("a", "Alice", 30), ("b", "Bob", 25), ("c", "Carol", 17)] {
        if !users.is_document_exists(id).await? {
            users.add(record(json!({"name": name, "age": age})), Some(id)).await?;
        }
    }
    users
        .document("a")?
        .collection("posts")
        .add(record(json!({"title": "Hello"})), Some("p1"))
        .await
        .ok();

    let adults = users
        .search(Filter::new("age", ">=", json!(18))?, Some(OrderBy::new("age")), None)
        .await?;
    println!("adults as mappings:");
    for user in adults.to_list(true) {
        println!("  {}", serde_json::Value::Object(user));
    }

    println!("adults as typed values:");
    for user in adults.to_list_lossy::<User>(true) {
        println!("  {} ({}) is {}", user.name, user.id, user.age);
    }

    let posts = CollectionGroup::new(&firestore, "posts")?;
    match posts.get_one("p1", "users/a").await? {
        Some(post) => println!("post p1: {:?}", post.dict(true)),
        None => println!("post p1 not found"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
        let project_id = std::env::var("FIRESTORE_PROJECT_ID").unwrap_or_else(|_| "demo-project".to_string());
        run(Firestore::from_env(project_id).await?).await?;
    } else {
        run(Firestore::with_store("demo-project", MemoryStore::new())).await?;
    }
    Ok(())
}
