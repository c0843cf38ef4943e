//! Property-based tests using proptest
//!
//! These tests verify row derivation, resource id parsing and lookup key
//! validation using randomized inputs.

use cosmos_collections::azure::resource_id::resource_group_from_id;
use cosmos_collections::resource::{
    mongo_collection_table, LookupKey, MongoCollection, MongoCollectionInfo, Transform,
};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Generate an ARM resource name segment
fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9._-]{0,20}"
}

/// Generate an Azure location with arbitrary casing and spaces
fn arb_location() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("East US".to_string()),
        Just("WESTEUROPE".to_string()),
        Just("japaneast".to_string()),
        "[A-Za-z ]{1,20}",
    ]
}

fn arb_collection() -> impl Strategy<Value = MongoCollection> {
    (
        arb_segment(),
        arb_segment(),
        arb_location(),
        proptest::option::of(0i64..1_000_000),
        proptest::option::of(0i64..2_000_000_000),
        any::<bool>(),
    )
        .prop_map(|(rg, name, location, throughput, ts, with_props)| {
            let mut doc = json!({
                "id": format!(
                    "/subscriptions/s/resourceGroups/{}/providers/Microsoft.DocumentDB/databaseAccounts/acct/mongodbDatabases/db/collections/{}",
                    rg, name
                ),
                "name": name,
                "location": location,
            });
            if with_props {
                doc["properties"] = json!({
                    "resource": {"id": name, "_ts": ts},
                    "options": {"throughput": throughput}
                });
            }
            serde_json::from_value::<MongoCollection>(doc).unwrap()
        })
}

fn info(collection: MongoCollection, resource_group: Option<String>) -> MongoCollectionInfo {
    MongoCollectionInfo {
        name: collection.name.clone(),
        location: collection.location.clone(),
        collection,
        account: "acct".to_string(),
        database: "db".to_string(),
        resource_group,
        subscription_id: "sub".to_string(),
        cloud_environment: "AzurePublicCloud".to_string(),
    }
}

proptest! {
    /// The resource group is always the fifth slash-delimited segment
    #[test]
    fn resource_group_is_segment_four(
        sub in arb_segment(),
        rg in arb_segment(),
        rest in prop::collection::vec(arb_segment(), 0..6)
    ) {
        let id = format!("/subscriptions/{}/resourceGroups/{}/{}", sub, rg, rest.join("/"));
        prop_assert_eq!(resource_group_from_id(&id), Some(rg.as_str()));
    }

    /// Region is lower-cased whatever the input casing
    #[test]
    fn region_is_always_lower_case(collection in arb_collection()) {
        let expected = collection.location.clone().unwrap().to_lowercase();
        let row = mongo_collection_table().row(&info(collection, None));
        prop_assert_eq!(row.get_str("region"), Some(expected.as_str()));
    }

    /// Every declared column is present in every row, with a value or null
    #[test]
    fn every_column_resolves(collection in arb_collection()) {
        let table = mongo_collection_table();
        let row = table.row(&info(collection, Some("RG".to_string())));
        prop_assert_eq!(row.len(), table.columns.len());
        for name in table.column_names() {
            prop_assert!(row.get(name).is_some(), "missing column {}", name);
        }
        prop_assert_eq!(row.get_str("resource_group"), Some("rg"));
    }

    /// Same record, same row: columns are pure
    #[test]
    fn rows_are_deterministic(collection in arb_collection()) {
        let table = mongo_collection_table();
        let first = table.row(&info(collection.clone(), None));
        let second = table.row(&info(collection, None));
        prop_assert_eq!(first, second);
    }

    /// Lookup keys are resolvable exactly when the account name has at least
    /// 3 characters and a resource group is given
    #[test]
    fn lookup_key_resolvable(
        account in "[a-z0-9]{0,6}",
        rg in "[A-Za-z0-9]{0,4}",
        database in "[a-z]{1,5}",
        name in "[a-z]{1,5}"
    ) {
        let key = LookupKey::new(&account, &rg, &database, &name);
        prop_assert_eq!(key.is_resolvable(), account.len() >= 3 && !rg.is_empty());
    }

    /// Integer strings coerce to the integer they spell
    #[test]
    fn to_int_parses_integer_strings(n in any::<i64>()) {
        prop_assert_eq!(Transform::ToInt.apply(Value::String(n.to_string())), json!(n));
    }
}
