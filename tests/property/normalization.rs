//! Normalization is deterministic and reads return what was written

use normcache::store::normalize;
use normcache::store::dependent_keys;
use normcache::{Field, MemoryStore, NormalizedStore, Operation, ScalarAdapters};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;

fn squad_query() -> Operation {
    Operation::query(
        "Squad",
        vec![Field::object(
            "squad",
            vec![
                Field::scalar("name"),
                Field::object(
                    "members",
                    vec![
                        Field::scalar("__typename"),
                        Field::scalar("id"),
                        Field::scalar("name"),
                    ],
                ),
            ],
        )],
    )
}

fn squad_data(name: &str, members: &[(u32, String)]) -> Value {
    let members: Vec<Value> = members
        .iter()
        .map(|(id, name)| json!({"__typename": "Hero", "id": id.to_string(), "name": name}))
        .collect();
    json!({"squad": {"name": name, "members": members}})
}

/// Members with unique ids, so every record has exactly one source
fn members() -> impl Strategy<Value = Vec<(u32, String)>> {
    prop::collection::hash_map(0u32..1000, "[a-zA-Z0-9 ]{0,12}", 0..8)
        .prop_map(|members: HashMap<u32, String>| members.into_iter().collect())
}

proptest! {
    #[test]
    fn test_normalize_is_deterministic(name in "[a-z]{1,8}", members in members()) {
        let operation = squad_query();
        let data = squad_data(&name, &members);
        let adapters = ScalarAdapters::new();

        let first = normalize::normalize(&operation, &data, &adapters).unwrap();
        let second = normalize::normalize(&operation, &data, &adapters).unwrap();
        prop_assert_eq!(&first, &second);

        let keys = dependent_keys(first.values());
        prop_assert!(keys.contains("QUERY_ROOT"));
        prop_assert!(keys.contains("QUERY_ROOT.squad"));
        for (id, _) in &members {
            let key = format!("Hero:{}", id);
            prop_assert!(keys.contains(&key));
        }
        prop_assert_eq!(keys.len(), members.len() + 2);
    }

    #[test]
    fn test_read_returns_written_data(name in "[a-z]{1,8}", members in members()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let operation = squad_query();
        let data = squad_data(&name, &members);
        let adapters = ScalarAdapters::new();
        let store = MemoryStore::new();

        let read = runtime.block_on(async {
            store
                .write_operation(&operation, &data, &adapters, &Default::default(), false)
                .await
                .unwrap();
            store
                .read_operation(&operation, &adapters, &Default::default())
                .await
                .unwrap()
        });
        prop_assert_eq!(read, data);
    }
}
