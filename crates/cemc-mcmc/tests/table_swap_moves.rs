use cemc_core::{apply_step, RngHandle, Species};
use cemc_lattice::Sublattice;
use cemc_mcmc::{MoveKind, SwapTableEntry, TableSwapUsher};

fn lithium() -> Species {
    Species::ion("Li", 1)
}

fn two_sublattices() -> Vec<Sublattice> {
    vec![
        Sublattice::new(vec![lithium(), Species::Vacancy], vec![0, 1, 2]).unwrap(),
        Sublattice::new(vec![lithium(), Species::Vacancy], vec![3, 4, 5]).unwrap(),
    ]
}

fn cross_entry(probability: f64) -> SwapTableEntry {
    SwapTableEntry {
        sublattice_a: 0,
        species_a: lithium(),
        sublattice_b: 1,
        species_b: Species::Vacancy,
        probability,
    }
}

#[test]
fn probabilities_must_sum_to_one() {
    let err = TableSwapUsher::new(two_sublattices(), vec![cross_entry(0.4)], None).unwrap_err();
    assert_eq!(err.info().code, "probability-sum");
}

#[test]
fn degenerate_entries_rejected() {
    let entry = SwapTableEntry {
        sublattice_a: 0,
        species_a: lithium(),
        sublattice_b: 0,
        species_b: lithium(),
        probability: 1.0,
    };
    let err = TableSwapUsher::new(two_sublattices(), vec![entry], None).unwrap_err();
    assert_eq!(err.info().code, "degenerate-entry");
}

#[test]
fn exchanged_species_must_fit_the_opposite_side() {
    // Sodium lives only on the second sublattice, so the exchange would
    // place it on a sublattice that does not allow it.
    let sublattices = vec![
        Sublattice::new(vec![lithium(), Species::Vacancy], vec![0, 1, 2]).unwrap(),
        Sublattice::new(
            vec![lithium(), Species::ion("Na", 1), Species::Vacancy],
            vec![3, 4, 5],
        )
        .unwrap(),
    ];
    let entry = SwapTableEntry {
        sublattice_a: 0,
        species_a: lithium(),
        sublattice_b: 1,
        species_b: Species::ion("Na", 1),
        probability: 1.0,
    };
    let err = TableSwapUsher::new(sublattices, vec![entry], None).unwrap_err();
    assert_eq!(err.info().code, "entry-cross-not-allowed");
}

#[test]
fn shared_species_restriction_applies_to_cross_entries() {
    let err = TableSwapUsher::new(
        two_sublattices(),
        vec![cross_entry(1.0)],
        Some(&[lithium()]),
    )
    .unwrap_err();
    assert_eq!(err.info().code, "entry-not-shared");
}

#[test]
fn proposed_swap_exchanges_the_two_species() {
    let usher = TableSwapUsher::new(two_sublattices(), vec![cross_entry(1.0)], None).unwrap();
    // First sublattice all lithium, second all vacancies.
    let occupancy = vec![0, 0, 0, 1, 1, 1];
    let mut rng = RngHandle::from_seed(23);
    let proposal = usher.propose(&occupancy, &mut rng);
    assert_eq!(proposal.kind, MoveKind::TableSwap);
    assert_eq!(proposal.step.len(), 2);

    let after = apply_step(&occupancy, &proposal.step);
    // One vacancy moved into the first sublattice, one lithium into the
    // second.
    assert_eq!(after[..3].iter().filter(|&&c| c == 1).count(), 1);
    assert_eq!(after[3..].iter().filter(|&&c| c == 0).count(), 1);

    // Forward selection: 3 lithium hosts x 3 vacancy hosts. Reverse: the
    // single moved vacancy and the single moved lithium.
    assert!((proposal.log_ratio - 9.0_f64.ln()).abs() < 1e-12);
}

#[test]
fn absent_species_yields_annotated_null() {
    let usher = TableSwapUsher::new(two_sublattices(), vec![cross_entry(1.0)], None).unwrap();
    // No vacancies anywhere on the second sublattice.
    let occupancy = vec![0, 0, 0, 0, 0, 0];
    let mut rng = RngHandle::from_seed(29);
    let proposal = usher.propose(&occupancy, &mut rng);
    assert!(proposal.is_null());
    assert!(proposal.note.is_some());
    assert_eq!(proposal.log_ratio, 0.0);
}
