//! Golden tests for the demand resolver.
//!
//! These tests verify groupings against known scenarios.

use serde_json::{json, Value};
use stockist_demand_core::models::{DemandLine, Medicine, Stockist, UNMATCHED};
use stockist_demand_core::{resolve_demand, ResolverConfig};

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    query: &'static str,
    quantity: u32,
    medicines: Value,
    stockists: Value,
    /// Expected group keys, in order
    expected_groups: Vec<&'static str>,
    /// Expected `medicine` JSON on the first entry of the first group
    expected_medicine: Option<Value>,
}

fn records<T: From<Value>>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items.into_iter().map(T::from).collect(),
        _ => Vec::new(),
    }
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "scenario-a-exact-inventory",
            query: "Paracetamol",
            quantity: 10,
            medicines: json!([{"name": "Paracetamol"}]),
            stockists: json!([{"_id": "s1", "title": "City Pharma", "medicines": ["Paracetamol"]}]),
            expected_groups: vec!["City Pharma"],
            expected_medicine: Some(json!({"name": "Paracetamol"})),
        },
        GoldenCase {
            id: "scenario-b-blank-line",
            query: "",
            quantity: 5,
            medicines: json!([{"_id": "m1", "name": "Paracetamol"}]),
            stockists: json!([{"_id": "s1", "title": "City Pharma", "medicines": ["Paracetamol", ""]}]),
            expected_groups: vec![UNMATCHED],
            expected_medicine: None,
        },
        GoldenCase {
            id: "scenario-c-inventory-only-fallback",
            query: "Xanax",
            quantity: 2,
            medicines: json!([{"_id": "m1", "name": "Paracetamol"}]),
            stockists: json!([{"_id": "s1", "title": "Night Chemist", "medicines": ["Xanax"]}]),
            expected_groups: vec!["Night Chemist"],
            expected_medicine: Some(json!({"name": "Xanax"})),
        },
        GoldenCase {
            id: "scenario-d-no-match",
            query: "zzz",
            quantity: 1,
            medicines: json!([{"_id": "m1", "name": "Paracetamol"}]),
            stockists: json!([{"_id": "s1", "title": "City Pharma", "medicines": ["Paracetamol"]}]),
            expected_groups: vec![UNMATCHED],
            expected_medicine: None,
        },
        GoldenCase {
            id: "exact-beats-substring",
            query: "abc",
            quantity: 3,
            medicines: json!([
                {"_id": "m1", "name": "abc"},
                {"_id": "m2", "name": "abcdef"},
            ]),
            stockists: json!([
                {"_id": "s1", "title": "Carries abc", "medicines": ["abc"]},
                {"_id": "s2", "title": "Carries abcdef", "medicines": ["abcdef"]},
            ]),
            expected_groups: vec!["Carries abc"],
            expected_medicine: Some(json!({"_id": "m1", "name": "abc"})),
        },
        GoldenCase {
            id: "fan-out-to-every-stockist",
            query: "cetirizine",
            quantity: 4,
            medicines: json!([{"_id": "m1", "name": "Cetirizine"}]),
            stockists: json!([
                {"_id": "s1", "title": "North Depot", "medicines": ["CETIRIZINE"]},
                {"_id": "s2", "title": "South Depot", "medicines": ["Cetirizine"]},
            ]),
            expected_groups: vec!["North Depot", "South Depot"],
            expected_medicine: Some(json!({"_id": "m1", "name": "Cetirizine"})),
        },
        GoldenCase {
            id: "reference-field-on-medicine",
            query: "Azithromycin",
            quantity: 7,
            medicines: json!([{
                "_id": "m1",
                "medicineName": "Azithromycin",
                "supplier": {"_id": "s2", "name": "ignored"},
            }]),
            stockists: json!([
                {"_id": "s1", "title": "Not Referenced"},
                {"_id": "s2", "name": "Referenced Co"},
            ]),
            expected_groups: vec!["Referenced Co"],
            expected_medicine: Some(json!({
                "_id": "m1",
                "medicineName": "Azithromycin",
                "supplier": {"_id": "s2", "name": "ignored"},
            })),
        },
        GoldenCase {
            id: "stockist-without-name-keyed-by-id",
            query: "Metformin",
            quantity: 1,
            medicines: json!([{"_id": "m1", "name": "Metformin", "stockists": [{"_id": "s9"}]}]),
            stockists: json!([{"_id": "s9"}]),
            expected_groups: vec!["s9"],
            expected_medicine: Some(json!({"_id": "m1", "name": "Metformin", "stockists": [{"_id": "s9"}]})),
        },
        GoldenCase {
            id: "candidates-without-stockist-fall-back-to-inventory",
            query: "Xanax",
            quantity: 2,
            medicines: json!([{"_id": "m1", "name": "Xanax XR"}]),
            stockists: json!([{"_id": "s1", "title": "Night", "medicines": ["xanax"]}]),
            expected_groups: vec!["Night"],
            expected_medicine: Some(json!({"name": "Xanax"})),
        },
    ]
}

#[test]
fn test_golden_cases() {
    let config = ResolverConfig::default();

    for case in get_golden_cases() {
        let line = DemandLine::with_id("line-1", case.query, case.quantity);
        let medicines: Vec<Medicine> = records(case.medicines);
        let stockists: Vec<Stockist> = records(case.stockists);

        let resolution = resolve_demand(&[line.clone()], &medicines, &stockists, &config);
        let result = resolution.result;

        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(keys, case.expected_groups, "Case {}: group mismatch", case.id);

        for key in &keys {
            for entry in result.get(key).unwrap() {
                assert_eq!(entry.demand_line, line, "Case {}: line mismatch", case.id);
            }
        }

        let first = &result.get(keys[0]).unwrap()[0];
        let entry_json = serde_json::to_value(first).unwrap();

        match &case.expected_medicine {
            Some(expected) => {
                assert_eq!(&entry_json["medicine"], expected, "Case {}: medicine mismatch", case.id);
                assert_eq!(entry_json["available"], json!(true), "Case {}: availability", case.id);
                assert_eq!(
                    entry_json["quantity"],
                    json!(case.quantity),
                    "Case {}: quantity mismatch",
                    case.id
                );
            }
            None => {
                assert_eq!(
                    entry_json,
                    json!({"demandLine": {"id": "line-1", "name": case.query, "quantity": case.quantity}}),
                    "Case {}: unmatched entry should carry only the demand line",
                    case.id
                );
            }
        }

        assert_eq!(resolution.trace.len(), 1, "Case {}: one trace record per line", case.id);
    }
}

#[test]
fn test_cached_json_shape() {
    let medicines: Vec<Medicine> = records(json!([{"_id": "m1", "name": "Paracetamol"}]));
    let stockists: Vec<Stockist> = records(json!([
        {"_id": "s1", "title": "City Pharma", "medicines": ["Paracetamol"]},
    ]));
    let lines = vec![
        DemandLine::with_id("l1", "Paracetamol", 10),
        DemandLine::with_id("l2", "zzz", 1),
    ];

    let result = resolve_demand(&lines, &medicines, &stockists, &ResolverConfig::default()).result;
    let json = serde_json::to_string(&result).unwrap();

    assert_eq!(
        json,
        concat!(
            r#"{"City Pharma":[{"demandLine":{"id":"l1","name":"Paracetamol","quantity":10},"#,
            r#""medicine":{"_id":"m1","name":"Paracetamol"},"available":true,"quantity":10}],"#,
            r#""unmatched":[{"demandLine":{"id":"l2","name":"zzz","quantity":1}}]}"#
        )
    );
}
