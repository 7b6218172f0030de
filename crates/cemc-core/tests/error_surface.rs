use cemc_core::errors::{CemcError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("site", "12")
        .with_context("species", "Li1+")
}

#[test]
fn config_error_surface() {
    let err = CemcError::Config(sample_info("table-prob-sum", "probabilities do not sum to one"));
    assert_eq!(err.info().code, "table-prob-sum");
    assert!(err.info().context.contains_key("site"));
}

#[test]
fn lattice_error_surface() {
    let err = CemcError::Lattice(sample_info("partition-gap", "site not covered"));
    assert_eq!(err.info().code, "partition-gap");
    assert!(err.info().context.contains_key("species"));
}

#[test]
fn proposal_error_surface() {
    let err = CemcError::Proposal(sample_info("bad-entry", "unknown table species"));
    assert_eq!(err.info().code, "bad-entry");
}

#[test]
fn processor_error_surface() {
    let err = CemcError::Processor(sample_info("delta-mismatch", "delta disagrees with full"));
    assert_eq!(err.info().code, "delta-mismatch");
}

#[test]
fn sampling_error_surface() {
    let err = CemcError::Sampling(sample_info("no-initial-state", "no occupancy provided"));
    assert_eq!(err.info().code, "no-initial-state");
}

#[test]
fn error_display_includes_hint() {
    let err = CemcError::Config(
        ErrorInfo::new("missing-mu", "no chemical potential for Li1+")
            .with_hint("add an entry for every active species"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("missing-mu"));
    assert!(rendered.contains("add an entry"));
}

#[test]
fn error_info_roundtrips_through_json() {
    let err = CemcError::Serde(sample_info("schema", "unexpected field"));
    let json = serde_json::to_string(&err).unwrap();
    let restored: CemcError = serde_json::from_str(&json).unwrap();
    assert_eq!(err, restored);
}
