use cemc_core::{RngHandle, Species};
use cemc_expansion::{ClusterProcessor, CorrelationTable, Orbit};
use cemc_lattice::Sublattice;
use cemc_mcmc::{ChainState, Ensemble, FlipUsher, Kernel, MoveKind, SwapTableEntry, TableSwapUsher, Usher};

const NUM_SITES: usize = 6;

fn binary_sublattices() -> Vec<Sublattice> {
    vec![Sublattice::new(
        vec![Species::ion("Li", 1), Species::Vacancy],
        (0..NUM_SITES).collect(),
    )
    .unwrap()]
}

/// Point-term-only processor: each site contributes -c/6 for code 0 and
/// +c/6 for code 1, so flipping 1 -> 0 is always downhill for c > 0.
fn point_processor(coefficient: f64) -> ClusterProcessor {
    let table = CorrelationTable::new(vec![2], vec![-1.0, 1.0]).unwrap();
    let clusters = (0..NUM_SITES).map(|site| vec![site]).collect();
    let orbit = Orbit::new(0, clusters, table).unwrap();
    ClusterProcessor::new(vec![orbit], vec![coefficient], &[2; NUM_SITES]).unwrap()
}

fn flip_setup(coefficient: f64) -> (Ensemble, ClusterProcessor, Usher) {
    let sublattices = binary_sublattices();
    let ensemble = Ensemble::canonical(sublattices.clone(), NUM_SITES).unwrap();
    let usher = Usher::Flip(FlipUsher::new(sublattices, None).unwrap());
    (ensemble, point_processor(coefficient), usher)
}

#[test]
fn downhill_flips_always_accepted() {
    let (ensemble, processor, usher) = flip_setup(1.0);
    let kernel = Kernel::Metropolis { temperature: 1.0 };
    let mut state = ChainState::new(&processor, vec![1; NUM_SITES]).unwrap();
    let mut rng = RngHandle::from_seed(7);
    // From the all-ones state every flip is 1 -> 0 and strictly downhill.
    let outcome = kernel
        .single_step(&ensemble, &processor, &usher, &mut state, &mut rng)
        .unwrap();
    assert!(outcome.accepted);
    assert!(outcome.energy_delta < 0.0);
    assert_eq!(state.occupancy.iter().filter(|&&c| c == 0).count(), 1);
}

#[test]
fn uphill_flips_rejected_at_low_temperature() {
    let (ensemble, processor, usher) = flip_setup(1.0);
    let kernel = Kernel::Metropolis { temperature: 1.0 };
    // Ground state: every proposal raises the energy by 2/6 eV, and at 1 K
    // the Boltzmann factor is effectively zero.
    let mut state = ChainState::new(&processor, vec![0; NUM_SITES]).unwrap();
    let mut rng = RngHandle::from_seed(11);
    for _ in 0..50 {
        let outcome = kernel
            .single_step(&ensemble, &processor, &usher, &mut state, &mut rng)
            .unwrap();
        assert!(!outcome.accepted);
    }
    assert_eq!(state.occupancy, vec![0; NUM_SITES]);
}

#[test]
fn extreme_temperature_accepts_everything() {
    let (ensemble, processor, usher) = flip_setup(1.0);
    let kernel = Kernel::Metropolis {
        temperature: 1.0e12,
    };
    let mut state = ChainState::new(&processor, vec![0; NUM_SITES]).unwrap();
    let mut rng = RngHandle::from_seed(13);
    let mut accepted = 0;
    for _ in 0..100 {
        if kernel
            .single_step(&ensemble, &processor, &usher, &mut state, &mut rng)
            .unwrap()
            .accepted
        {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 100);
}

#[test]
fn uniformly_random_kernel_ignores_energy() {
    let (ensemble, processor, usher) = flip_setup(100.0);
    let kernel = Kernel::UniformlyRandom;
    let mut state = ChainState::new(&processor, vec![0; NUM_SITES]).unwrap();
    let mut rng = RngHandle::from_seed(17);
    for _ in 0..20 {
        let outcome = kernel
            .single_step(&ensemble, &processor, &usher, &mut state, &mut rng)
            .unwrap();
        assert!(outcome.accepted);
    }
}

#[test]
fn symmetric_ushers_carry_zero_log_ratio() {
    let sublattices = binary_sublattices();
    let flip = FlipUsher::new(sublattices.clone(), None).unwrap();
    let swap = cemc_mcmc::SwapUsher::new(sublattices, Vec::new()).unwrap();
    let occupancy = vec![0, 1, 0, 1, 0, 1];
    let mut rng = RngHandle::from_seed(31);
    for _ in 0..20 {
        assert_eq!(flip.propose(&occupancy, &mut rng).log_ratio, 0.0);
        let proposal = swap.propose(&occupancy, &mut rng);
        assert_eq!(proposal.log_ratio, 0.0);
        assert!(!proposal.is_null());
    }
}

#[test]
fn random_walk_on_a_ring_stays_bounded() {
    // 4-site binary ring, ferromagnetic pair term, flips accepted blindly:
    // the pair correlation stays in [-1, 1] so the energy stays in [-1, 1]
    // however long the walk runs.
    let sublattices = vec![Sublattice::new(
        vec![Species::ion("Li", 1), Species::Vacancy],
        vec![0, 1, 2, 3],
    )
    .unwrap()];
    let pair = Orbit::new(
        0,
        vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 0]],
        CorrelationTable::new(vec![2, 2], vec![1.0, -1.0, -1.0, 1.0]).unwrap(),
    )
    .unwrap();
    let processor = ClusterProcessor::new(vec![pair], vec![-1.0], &[2; 4]).unwrap();
    let ensemble = Ensemble::canonical(sublattices.clone(), 4).unwrap();
    let usher = Usher::Flip(FlipUsher::new(sublattices, None).unwrap());
    let kernel = Kernel::UniformlyRandom;
    let mut state = ChainState::new(&processor, vec![0, 0, 0, 0]).unwrap();
    let mut rng = RngHandle::from_seed(37);
    for _ in 0..10_000 {
        kernel
            .single_step(&ensemble, &processor, &usher, &mut state, &mut rng)
            .unwrap();
        assert!(state.energy >= -1.0 - 1e-9 && state.energy <= 1.0 + 1e-9);
    }
    // The incrementally tracked energy has not drifted.
    use cemc_expansion::Processor;
    let full = processor.energy(&state.occupancy).unwrap();
    assert!((full - state.energy).abs() < 1e-9);
}

#[test]
fn athermal_kernel_has_no_temperature() {
    let mut kernel = Kernel::UniformlyRandom;
    assert_eq!(kernel.temperature(), None);
    let err = kernel.set_temperature(500.0).unwrap_err();
    assert_eq!(err.info().code, "athermal-kernel");
}

#[test]
fn null_proposal_counts_as_rejection_and_leaves_state_alone() {
    // Sodium is allowed on the sublattice but absent from the occupancy, so
    // the single table entry can never find a host and proposes null moves.
    let sublattices = vec![Sublattice::new(
        vec![Species::ion("Li", 1), Species::ion("Na", 1), Species::Vacancy],
        (0..NUM_SITES).collect(),
    )
    .unwrap()];
    let table = CorrelationTable::new(vec![3], vec![-1.0, 0.0, 1.0]).unwrap();
    let orbit = Orbit::new(0, (0..NUM_SITES).map(|site| vec![site]).collect(), table).unwrap();
    let processor = ClusterProcessor::new(vec![orbit], vec![1.0], &[3; NUM_SITES]).unwrap();
    let usher = Usher::TableSwap(
        TableSwapUsher::new(
            sublattices.clone(),
            vec![SwapTableEntry {
                sublattice_a: 0,
                species_a: Species::ion("Na", 1),
                sublattice_b: 0,
                species_b: Species::Vacancy,
                probability: 1.0,
            }],
            None,
        )
        .unwrap(),
    );
    let ensemble = Ensemble::canonical(sublattices, NUM_SITES).unwrap();
    let kernel = Kernel::Metropolis { temperature: 1000.0 };
    let occupancy = vec![0, 0, 0, 2, 2, 2];
    let mut state = ChainState::new(&processor, occupancy.clone()).unwrap();
    let mut rng = RngHandle::from_seed(19);
    let outcome = kernel
        .single_step(&ensemble, &processor, &usher, &mut state, &mut rng)
        .unwrap();
    assert!(outcome.null);
    assert!(!outcome.accepted);
    assert_eq!(outcome.kind, MoveKind::TableSwap);
    assert_eq!(outcome.energy_delta, 0.0);
    assert_eq!(state.occupancy, occupancy);
}
