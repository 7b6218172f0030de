use cemc_core::{apply_step, SiteFlip};
use cemc_expansion::{
    verify_delta, ClusterProcessor, CompositeProcessor, CorrelationTable, EwaldProcessor, Orbit,
    Processor,
};
use proptest::prelude::*;

const NUM_SITES: usize = 6;

/// Six binary sites on a ring with point, pair and a triplet orbit.
fn sample_processor() -> ClusterProcessor {
    let point_table = CorrelationTable::new(vec![2], vec![-1.0, 1.0]).unwrap();
    let pair_table = CorrelationTable::new(vec![2, 2], vec![1.0, -1.0, -1.0, 1.0]).unwrap();
    let triplet_table = CorrelationTable::new(
        vec![2, 2, 2],
        vec![-1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0],
    )
    .unwrap();

    let point = Orbit::new(
        0,
        (0..NUM_SITES).map(|site| vec![site]).collect(),
        point_table,
    )
    .unwrap();
    let pair = Orbit::new(
        1,
        (0..NUM_SITES)
            .map(|site| vec![site, (site + 1) % NUM_SITES])
            .collect(),
        pair_table,
    )
    .unwrap();
    let triplet = Orbit::new(
        2,
        (0..NUM_SITES)
            .map(|site| vec![site, (site + 1) % NUM_SITES, (site + 2) % NUM_SITES])
            .collect(),
        triplet_table,
    )
    .unwrap();

    ClusterProcessor::new(
        vec![point, pair, triplet],
        vec![0.3, -1.0, 0.05],
        &[2; NUM_SITES],
    )
    .unwrap()
}

fn sample_ewald() -> EwaldProcessor {
    // Deterministic symmetric matrix over 12 (site, code) rows.
    let rows = 2 * NUM_SITES;
    let mut matrix = vec![vec![0.0; rows]; rows];
    for i in 0..rows {
        for j in i..rows {
            let value = ((i * 7 + j * 3) % 11) as f64 / 10.0 - 0.5;
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    EwaldProcessor::new(&[2; NUM_SITES], matrix, 0.2).unwrap()
}

fn step_strategy() -> impl Strategy<Value = Vec<SiteFlip>> {
    proptest::collection::vec((0usize..NUM_SITES, 0usize..2), 1..4)
        .prop_map(|flips| flips.into_iter().map(|(s, c)| SiteFlip::new(s, c)).collect())
}

proptest! {
    #[test]
    fn cluster_delta_matches_full_difference(
        occupancy in proptest::collection::vec(0usize..2, NUM_SITES),
        step in step_strategy(),
    ) {
        let processor = sample_processor();
        let delta = processor.feature_change(&occupancy, &step).unwrap();
        let before = processor.feature_vector(&occupancy).unwrap();
        let after = processor.feature_vector(&apply_step(&occupancy, &step)).unwrap();
        for ((b, a), d) in before.iter().zip(&after).zip(&delta) {
            prop_assert!(((a - b) - d).abs() < 1e-10);
        }
    }

    #[test]
    fn ewald_delta_matches_full_difference(
        occupancy in proptest::collection::vec(0usize..2, NUM_SITES),
        step in step_strategy(),
    ) {
        let processor = sample_ewald();
        let delta = processor.feature_change(&occupancy, &step).unwrap();
        let before = processor.feature_vector(&occupancy).unwrap();
        let after = processor.feature_vector(&apply_step(&occupancy, &step)).unwrap();
        prop_assert!(((after[0] - before[0]) - delta[0]).abs() < 1e-9);
    }

    #[test]
    fn composite_delta_matches_full_difference(
        occupancy in proptest::collection::vec(0usize..2, NUM_SITES),
        step in step_strategy(),
    ) {
        let composite = CompositeProcessor::new(vec![
            Box::new(sample_processor()),
            Box::new(sample_ewald()),
        ])
        .unwrap();
        prop_assert!(verify_delta(&composite, &occupancy, &step, 1e-9).is_ok());

        let energy_delta = composite.energy_change(&occupancy, &step).unwrap();
        let full = composite.energy(&apply_step(&occupancy, &step)).unwrap()
            - composite.energy(&occupancy).unwrap();
        prop_assert!((full - energy_delta).abs() < 1e-9);
    }
}

#[test]
fn composite_concatenates_feature_spaces() {
    let composite = CompositeProcessor::new(vec![
        Box::new(sample_processor()),
        Box::new(sample_ewald()),
    ])
    .unwrap();
    assert_eq!(composite.num_features(), 4);
    assert_eq!(composite.coefficients(), &[0.3, -1.0, 0.05, 0.2]);
    let occupancy = vec![0; NUM_SITES];
    assert_eq!(composite.feature_vector(&occupancy).unwrap().len(), 4);
}

#[test]
fn asymmetric_matrix_is_rejected() {
    let mut matrix = vec![vec![0.0; 4]; 4];
    matrix[0][1] = 1.0;
    let err = EwaldProcessor::new(&[2, 2], matrix, 1.0).unwrap_err();
    assert_eq!(err.info().code, "matrix-asymmetry");
}
