use birka::collection::RecordCollection;
use birka::consensus::compute_consensus;
use birka::validation::{is_export_eligible, row_validity, validate_collection, Field, ValidationContext};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn consensus_ignores_input_order(
        (batch, shuffled) in proptest_helpers::arb_unique_batch(8)
            .prop_flat_map(|batch| (Just(batch.clone()), Just(batch).prop_shuffle()))
    ) {
        prop_assert_eq!(compute_consensus(&batch), compute_consensus(&shuffled));
    }

    #[test]
    fn consensus_values_come_from_the_batch(batch in proptest_helpers::arb_unique_batch(8)) {
        let consensus = compute_consensus(&batch);

        prop_assert!(batch.iter().any(|r| r.dtype == consensus.dtype));
        prop_assert!(batch.iter().any(|r| r.n_channels == consensus.n_channels));
        prop_assert!(batch.iter().any(|r| r.channel_names == consensus.channel_names));
        prop_assert!(batch.iter().any(|r| r.pixel_size_z_str() == consensus.pixel_size_z));
    }

    #[test]
    fn collection_matches_batch_consensus(batch in proptest_helpers::arb_unique_batch(8)) {
        let mut collection = RecordCollection::new();
        for record in batch.iter().cloned() {
            collection.push(record);
        }

        prop_assert_eq!(collection.consensus(), &compute_consensus(&batch));

        let removed = collection.remove(0).expect("non-empty batch");
        prop_assert_eq!(collection.consensus(), &compute_consensus(collection.records()));
        prop_assert_eq!(&removed, &batch[0]);
    }

    #[test]
    fn report_errors_agree_with_eligibility(batch in proptest_helpers::arb_batch_with_duplicates(6)) {
        let consensus = compute_consensus(&batch);
        let report = validate_collection(&batch, &consensus, None);

        prop_assert_eq!(report.is_ok(), is_export_eligible(&batch));
    }

    #[test]
    fn majority_records_are_not_flagged(batch in proptest_helpers::arb_unique_batch(8)) {
        let consensus = compute_consensus(&batch);
        let ctx = ValidationContext::new(&batch, &consensus, None);

        for record in &batch {
            let validity = row_validity(record, &ctx);
            prop_assert!(validity.is_valid(Field::Path));
            prop_assert_eq!(
                validity.is_valid(Field::Dtype),
                record.dtype == consensus.dtype
            );
            prop_assert_eq!(
                validity.is_valid(Field::PixelSizeX),
                record.pixel_size_x_str() == consensus.pixel_size_x
            );
        }
    }
}
