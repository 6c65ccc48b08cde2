//! Properties of size-bounded partitioning and text range splitting.

use std::sync::Arc;

use cumulus_storage::{
    CloudCollection, PartitionedCollection, PartitionedSequence, StoreContext, StoreError,
    TextSequence, WriteOptions,
};
use cumulus_store_memory::MemoryStore;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn context() -> (Arc<MemoryStore>, StoreContext) {
    let store = Arc::new(MemoryStore::new("memory"));
    let ctx = StoreContext::json(store.clone());
    (store, ctx)
}

proptest! {
    #[test]
    fn partitions_respect_size_and_order(
        values in prop::collection::vec("[a-z]{0,12}", 0..60),
        max_size in 1u64..64,
    ) {
        let (store, ctx) = context();
        let (sizes, records, joined) = runtime().block_on(async {
            let parts = PartitionedSequence::create(&ctx, values.clone(), max_size, WriteOptions::default())
                .await
                .unwrap();
            let mut sizes = Vec::new();
            let mut records = Vec::new();
            for partition in parts.partitions() {
                sizes.push(store.contents(partition.path()).unwrap().len() as u64);
                records.push(partition.count().await.unwrap());
            }
            (sizes, records, parts.to_vec().await.unwrap())
        });

        prop_assert_eq!(joined, values);
        for (size, count) in sizes.iter().zip(&records) {
            // Only a lone oversized record may exceed the limit.
            prop_assert!(*size <= max_size || *count == 1);
            prop_assert!(*count > 0);
        }
    }

    #[test]
    fn text_partitions_cover_every_line(
        lines in prop::collection::vec("[a-z ]{0,10}", 0..40),
        n in 1usize..12,
    ) {
        let (_, ctx) = context();
        let (ranges, seen, len) = runtime().block_on(async {
            let text = TextSequence::create(&ctx, lines.clone(), WriteOptions::default())
                .await
                .unwrap();
            let len = text.size().await.unwrap();
            let mut ranges = Vec::new();
            let mut seen = Vec::new();
            for part in text.partitions(n).await.unwrap() {
                ranges.push(part.range().unwrap());
                let part_lines: Vec<String> = part.stream().await.unwrap().try_collect().await.unwrap();
                seen.extend(part_lines);
            }
            (ranges, seen, len)
        });

        prop_assert_eq!(ranges.len(), n);
        prop_assert_eq!(ranges.first().map(|r| r.start), Some(0));
        prop_assert_eq!(ranges.last().map(|r| r.end), Some(len));
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        prop_assert_eq!(seen, lines);
    }
}

#[tokio::test]
async fn non_positive_partition_size_is_rejected() {
    let (store, ctx) = context();
    let result =
        PartitionedSequence::create(&ctx, vec![1u32, 2, 3], 0, WriteOptions::default()).await;
    assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    assert_eq!(store.writes(), 0);
}
