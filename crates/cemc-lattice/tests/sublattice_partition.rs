use cemc_core::Species;
use cemc_lattice::{build_sublattices, validate_partition, SiteIndex, Sublattice};

fn binary_space() -> Vec<Species> {
    vec![Species::element("A"), Species::element("B")]
}

fn cation_space() -> Vec<Species> {
    vec![Species::ion("Li", 1), Species::Vacancy]
}

#[test]
fn grouping_by_identical_site_spaces() {
    let allowed = vec![
        binary_space(),
        cation_space(),
        binary_space(),
        cation_space(),
        binary_space(),
    ];
    let sublattices = build_sublattices(&allowed).unwrap();
    assert_eq!(sublattices.len(), 2);
    assert_eq!(sublattices[0].sites(), &[0, 2, 4]);
    assert_eq!(sublattices[1].sites(), &[1, 3]);
    assert_eq!(sublattices[0].species(), binary_space().as_slice());
}

#[test]
fn partition_accepts_full_cover() {
    let sublattices = build_sublattices(&[binary_space(), binary_space(), cation_space()]).unwrap();
    validate_partition(&sublattices, 3).unwrap();
    let index = SiteIndex::new(&sublattices, 3).unwrap();
    assert_eq!(index.sublattice_of(0), Some(0));
    assert_eq!(index.sublattice_of(2), Some(1));
}

#[test]
fn partition_rejects_gap() {
    let sublattices = vec![Sublattice::new(binary_space(), vec![0, 1]).unwrap()];
    let err = validate_partition(&sublattices, 3).unwrap_err();
    assert_eq!(err.info().code, "partition-gap");
}

#[test]
fn partition_rejects_overlap() {
    let sublattices = vec![
        Sublattice::new(binary_space(), vec![0, 1]).unwrap(),
        Sublattice::new(cation_space(), vec![1, 2]).unwrap(),
    ];
    let err = validate_partition(&sublattices, 3).unwrap_err();
    assert_eq!(err.info().code, "partition-overlap");
}

#[test]
fn partition_rejects_out_of_range_site() {
    let sublattices = vec![Sublattice::new(binary_space(), vec![0, 5]).unwrap()];
    let err = validate_partition(&sublattices, 2).unwrap_err();
    assert_eq!(err.info().code, "site-out-of-range");
}

#[test]
fn restriction_and_reset() {
    let mut sublattice = Sublattice::new(cation_space(), vec![3, 4, 5, 6]).unwrap();
    sublattice.restrict_sites(&[4, 6]).unwrap();
    assert_eq!(sublattice.active_sites(), &[3, 5]);
    assert_eq!(sublattice.restricted_sites(), vec![4, 6]);
    assert!(!sublattice.is_active(4));

    sublattice.reset_restricted_sites();
    assert_eq!(sublattice.active_sites(), &[3, 4, 5, 6]);
}

#[test]
fn restriction_rejects_foreign_site() {
    let mut sublattice = Sublattice::new(cation_space(), vec![0, 1]).unwrap();
    let err = sublattice.restrict_sites(&[7]).unwrap_err();
    assert_eq!(err.info().code, "foreign-site");
}

#[test]
fn codes_map_back_to_species() {
    let sublattice = Sublattice::new(cation_space(), vec![0]).unwrap();
    assert_eq!(sublattice.code_for_species(&Species::Vacancy), Some(1));
    assert_eq!(
        sublattice.species_for_code(0),
        Some(&Species::ion("Li", 1))
    );
    assert_eq!(sublattice.species_for_code(2), None);
}

#[test]
fn empty_site_space_is_fatal() {
    let err = Sublattice::new(Vec::new(), vec![0]).unwrap_err();
    assert_eq!(err.info().code, "empty-site-space");
}
