//! Property tests: random operation sequences against an in-memory model.

mod common;

use std::collections::BTreeMap;

use common::{assert_indices_consistent, fields, keys, page_keys, student, students_schema};
use gridtabledb::{Error, StorageConfig, Table};
use gridtabledb_core::Value;
use proptest::prelude::*;
use tempfile::tempdir;

const GPAS: [f64; 5] = [0.5, 1.0, 2.5, 4.0, 5.0];
const NAMES: [&str; 3] = ["ana", "bo", "cy"];

#[derive(Debug, Clone)]
enum Op {
    Insert { id: i32, gpa: usize, name: usize },
    DeleteKey(i32),
    DeleteGpa(usize),
    DeleteAge(i32),
    DeleteName(usize),
    Update { id: i32, gpa: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..120i32, 0..GPAS.len(), 0..NAMES.len())
            .prop_map(|(id, gpa, name)| Op::Insert { id, gpa, name }),
        1 => (0..120i32).prop_map(Op::DeleteKey),
        1 => (0..GPAS.len()).prop_map(Op::DeleteGpa),
        1 => (0..12i32).prop_map(Op::DeleteAge),
        1 => (0..NAMES.len()).prop_map(Op::DeleteName),
        2 => (0..120i32, 0..GPAS.len()).prop_map(|(id, gpa)| Op::Update { id, gpa }),
    ]
}

#[derive(Debug, Clone, PartialEq)]
struct Modeled {
    gpa: f64,
    name: &'static str,
}

fn age_of(id: i32) -> i32 {
    id % 12
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_inserts_scan_in_key_order(ids in prop::collection::btree_set(0..500i32, 1..60), cap in 1usize..5) {
        let dir = tempdir().unwrap();
        let mut table = Table::create(dir.path(), students_schema(), StorageConfig::new(cap, 3)).unwrap();

        // Insert in a scrambled but deterministic order.
        let mut order: Vec<i32> = ids.iter().copied().collect();
        order.sort_by_key(|id| (id.wrapping_mul(7919)) % 499);
        for id in &order {
            table.insert(student(*id, "s", 1.0, 1)).unwrap();
        }

        let scanned = keys(&table);
        prop_assert!(scanned.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(scanned, ids.into_iter().collect::<Vec<_>>());
        prop_assert!(page_keys(&table).iter().all(|p| !p.is_empty() && p.len() <= cap));
    }

    #[test]
    fn prop_operations_match_model(ops in prop::collection::vec(op(), 1..50), cap in 1usize..4, bucket in 1usize..4) {
        let dir = tempdir().unwrap();
        let config = StorageConfig::new(cap, bucket).with_cells_per_dimension(4);
        let mut table = Table::create(dir.path(), students_schema(), config).unwrap();
        table.create_index(&["gpa"]).unwrap();
        table.create_index(&["age", "gpa"]).unwrap();

        let mut model: BTreeMap<i32, Modeled> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert { id, gpa, name } => {
                    let result = table.insert(student(id, NAMES[name], GPAS[gpa], age_of(id)));
                    if model.contains_key(&id) {
                        prop_assert!(matches!(result, Err(Error::DuplicateClusteringKey(_))));
                    } else {
                        result.unwrap();
                        model.insert(id, Modeled { gpa: GPAS[gpa], name: NAMES[name] });
                    }
                }
                Op::DeleteKey(id) => {
                    let n = table.delete(&fields(&[("id", Value::Int(id))])).unwrap();
                    prop_assert_eq!(n, usize::from(model.remove(&id).is_some()));
                }
                Op::DeleteGpa(g) => {
                    let n = table.delete(&fields(&[("gpa", Value::Double(GPAS[g]))])).unwrap();
                    let before = model.len();
                    model.retain(|_, m| m.gpa != GPAS[g]);
                    prop_assert_eq!(n, before - model.len());
                }
                Op::DeleteAge(age) => {
                    let n = table.delete(&fields(&[("age", Value::Int(age))])).unwrap();
                    let before = model.len();
                    model.retain(|id, _| age_of(*id) != age);
                    prop_assert_eq!(n, before - model.len());
                }
                Op::DeleteName(name) => {
                    let n = table.delete(&fields(&[("name", Value::from(NAMES[name]))])).unwrap();
                    let before = model.len();
                    model.retain(|_, m| m.name != NAMES[name]);
                    prop_assert_eq!(n, before - model.len());
                }
                Op::Update { id, gpa } => {
                    let result = table.update(&Value::Int(id), fields(&[("gpa", Value::Double(GPAS[gpa]))]));
                    match model.get_mut(&id) {
                        Some(m) => {
                            result.unwrap();
                            m.gpa = GPAS[gpa];
                        }
                        None => prop_assert!(matches!(result, Err(Error::ClusteringKeyNotFound(_)))),
                    }
                }
            }
        }

        prop_assert_eq!(keys(&table), model.keys().copied().collect::<Vec<_>>());
        for row in table.scan() {
            let row = row.unwrap();
            let id = match row.key() {
                Some(Value::Int(id)) => *id,
                _ => unreachable!(),
            };
            prop_assert_eq!(row.get("gpa"), Some(&Value::Double(model[&id].gpa)));
        }
        assert_indices_consistent(&table);

        // Reloading from disk yields the same table.
        let before = keys(&table);
        drop(table);
        let reopened = Table::open(dir.path(), "students").unwrap();
        prop_assert_eq!(keys(&reopened), before);
        assert_indices_consistent(&reopened);
    }
}
