//! Contract checks shared by every counter store backend.
//!
//! Each check expects an empty store.

#![allow(dead_code)]

use object_counter::counter::{Count, CounterStore, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read everything as a label -> quantity map
pub async fn totals(store: &dyn CounterStore) -> BTreeMap<String, u64> {
    store
        .read(None)
        .await
        .expect("Failed to read totals")
        .into_iter()
        .map(|count| (count.class_label().to_string(), count.quantity()))
        .collect()
}

fn labels(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

pub async fn first_write_creates(store: &dyn CounterStore) {
    store.update(&[Count::new("dog", 4)]).await.unwrap();

    let counts = store.read(Some(&labels(&["dog"]))).await.unwrap();
    assert_eq!(counts, vec![Count::new("dog", 4)]);
}

pub async fn scenario_cat_and_dog(store: &dyn CounterStore) {
    store.update(&[Count::new("cat", 2)]).await.unwrap();
    store
        .update(&[Count::new("cat", 3), Count::new("dog", 1)])
        .await
        .unwrap();

    let expected = BTreeMap::from([("cat".to_string(), 5), ("dog".to_string(), 1)]);
    assert_eq!(totals(store).await, expected);
}

pub async fn additivity_across_calls(store: &dyn CounterStore) {
    let deltas = [4_u64, 0, 7, 1, 13];
    for delta in deltas {
        store.update(&[Count::new("person", delta)]).await.unwrap();
    }

    assert_eq!(
        store.read_one("person").await.unwrap(),
        Some(Count::new("person", deltas.iter().sum()))
    );
}

pub async fn repeated_labels_in_one_call_accumulate(store: &dyn CounterStore) {
    store
        .update(&[Count::new("cat", 1), Count::new("cat", 1), Count::new("cat", 3)])
        .await
        .unwrap();

    assert_eq!(store.read_one("cat").await.unwrap(), Some(Count::new("cat", 5)));
}

pub async fn labels_are_case_sensitive(store: &dyn CounterStore) {
    store
        .update(&[Count::new("Cat", 1), Count::new("cat", 2)])
        .await
        .unwrap();

    let expected = BTreeMap::from([("Cat".to_string(), 1), ("cat".to_string(), 2)]);
    assert_eq!(totals(store).await, expected);
}

pub async fn read_filter_omits_absent_and_unrequested(store: &dyn CounterStore) {
    store
        .update(&[Count::new("a", 3), Count::new("b", 5)])
        .await
        .unwrap();

    let counts = store.read(Some(&labels(&["a", "c"]))).await.unwrap();
    assert_eq!(counts, vec![Count::new("a", 3)]);

    assert_eq!(store.read_one("c").await.unwrap(), None);
}

pub async fn duplicate_filter_labels_yield_one_record(store: &dyn CounterStore) {
    store.update(&[Count::new("a", 3)]).await.unwrap();

    let counts = store.read(Some(&labels(&["a", "a"]))).await.unwrap();
    assert_eq!(counts, vec![Count::new("a", 3)]);
}

pub async fn empty_filter_reads_everything(store: &dyn CounterStore) {
    store
        .update(&[Count::new("a", 3), Count::new("b", 5)])
        .await
        .unwrap();

    let mut counts = store.read(Some(&[])).await.unwrap();
    counts.sort_by(|x, y| x.class_label().cmp(y.class_label()));
    assert_eq!(counts, vec![Count::new("a", 3), Count::new("b", 5)]);
}

pub async fn unfiltered_read_is_complete(store: &dyn CounterStore) {
    assert!(store.read(None).await.unwrap().is_empty());

    store
        .update(&[Count::new("cat", 1), Count::new("dog", 2)])
        .await
        .unwrap();
    store
        .update(&[Count::new("bird", 3), Count::new("cat", 4)])
        .await
        .unwrap();

    let expected = BTreeMap::from([
        ("bird".to_string(), 3),
        ("cat".to_string(), 5),
        ("dog".to_string(), 2),
    ]);
    assert_eq!(totals(store).await, expected);
}

pub async fn empty_update_is_a_noop(store: &dyn CounterStore) {
    store.update(&[]).await.unwrap();
    assert!(store.read(None).await.unwrap().is_empty());
}

pub async fn empty_label_rejects_whole_update(store: &dyn CounterStore) {
    let result = store.update(&[Count::new("cat", 1), Count::new("", 1)]).await;
    assert!(matches!(result, Err(StoreError::InvalidDelta(_))));
    assert!(store.read(None).await.unwrap().is_empty());
}

/// `tasks` concurrent `+1` updates to one label, plus a disjoint label per task.
pub async fn concurrent_increments_are_not_lost(store: Arc<dyn CounterStore>, tasks: u64) {
    store.update(&[Count::new("cat", 10)]).await.unwrap();

    let handles: Vec<_> = (0..tasks)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .update(&[Count::new("cat", 1), Count::new(format!("solo-{}", i), 1)])
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle
            .await
            .expect("update task panicked")
            .expect("concurrent update failed");
    }

    assert_eq!(
        store.read_one("cat").await.unwrap(),
        Some(Count::new("cat", 10 + tasks))
    );
    assert_eq!(totals(store.as_ref()).await.len() as u64, tasks + 1);
}
