#![allow(dead_code)]

use birka::record::ImageRecord;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Metadata drawn from small domains so that ties and shifting majorities
/// are common.
pub fn arb_record(path: String) -> BoxedStrategy<ImageRecord> {
    (
        prop_oneof![Just("uint8"), Just("uint16"), Just("float32")],
        1u32..=3,
        1u32..=3,
        1u32..=3,
        prop_oneof![Just("TCZYX"), Just("CZYX")],
        pixel_size_strategy(),
        pixel_size_strategy(),
        channel_names_strategy(),
    )
        .prop_map(
            move |(dtype, timepoints, channels, depth, order, pixel_xy, pixel_z, names)| {
                let mut record = ImageRecord::new(path.clone(), 64, 48)
                    .with_dtype(dtype)
                    .with_timepoints(timepoints)
                    .with_channels(channels)
                    .with_depth(depth)
                    .with_dimension_order(order)
                    .with_channel_names(names);
                record.pixel_size_x = pixel_xy;
                record.pixel_size_y = pixel_xy;
                record.pixel_size_z = pixel_z;
                record
            },
        )
        .boxed()
}

/// A batch with distinct paths, in arbitrary order.
pub fn arb_unique_batch(max_records: usize) -> BoxedStrategy<Vec<ImageRecord>> {
    assert!(max_records > 0, "max_records must be > 0");

    proptest::collection::hash_set(path_strategy(), 1..=max_records)
        .prop_flat_map(|paths| {
            paths
                .into_iter()
                .map(arb_record)
                .collect::<Vec<_>>()
        })
        .boxed()
}

/// A batch whose paths come from a small pool, so duplicates are likely.
/// May be empty.
pub fn arb_batch_with_duplicates(max_records: usize) -> BoxedStrategy<Vec<ImageRecord>> {
    proptest::collection::vec(
        prop_oneof![Just("a.tif"), Just("b.tif"), Just("c.tif"), Just("d.tif")]
            .prop_flat_map(|path| arb_record(path.to_string())),
        0..=max_records,
    )
    .boxed()
}

fn path_strategy() -> BoxedStrategy<String> {
    "[a-z]{1,3}/[a-z0-9]{1,6}\\.tif".boxed()
}

fn pixel_size_strategy() -> BoxedStrategy<Option<f64>> {
    prop_oneof![Just(None), Just(Some(0.1)), Just(Some(0.2)), Just(Some(0.1000004))].boxed()
}

fn channel_names_strategy() -> BoxedStrategy<Vec<&'static str>> {
    prop_oneof![
        Just(vec![]),
        Just(vec!["DAPI"]),
        Just(vec!["DAPI", "GFP"]),
        Just(vec!["GFP", "DAPI"]),
    ]
    .boxed()
}
