//! Table-directed swap and stoichiometric reaction proposals.
//!
//! A swap table declares which species may exchange across which sublattice
//! pairs, each entry with a selection probability. The semigrand variant adds
//! reaction entries that change species counts, enabling grand-canonical
//! moves under a chemical-potential ensemble. Entries whose species are
//! currently absent from the structure produce null moves, never errors: the
//! chain keeps running and the null step counts toward acceptance totals.

use cemc_core::{CemcError, ErrorInfo, RngHandle, SiteFlip, Species};
use cemc_lattice::Sublattice;

use crate::moves_flip::{select_weighted, validate_probabilities};
use crate::proposal::{MoveKind, Proposal};

/// One allowed exchange across a sublattice pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapTableEntry {
    /// First sublattice index.
    pub sublattice_a: usize,
    /// Species picked on the first sublattice.
    pub species_a: Species,
    /// Second sublattice index (may equal the first).
    pub sublattice_b: usize,
    /// Species picked on the second sublattice.
    pub species_b: Species,
    /// Probability of selecting this entry; entries must sum to one.
    pub probability: f64,
}

/// Table-directed swap proposer across declared sublattice sets.
#[derive(Debug, Clone)]
pub struct TableSwapUsher {
    sublattices: Vec<Sublattice>,
    entries: Vec<SwapTableEntry>,
}

impl TableSwapUsher {
    /// Builds the usher, validating the table.
    ///
    /// `shared_species`, when given, restricts cross-sublattice entries to
    /// species in the list (e.g. only a mobile species may cross between two
    /// otherwise disjoint sublattices). Malformed tables are fatal at
    /// construction.
    pub fn new(
        sublattices: Vec<Sublattice>,
        entries: Vec<SwapTableEntry>,
        shared_species: Option<&[Species]>,
    ) -> Result<Self, CemcError> {
        if entries.is_empty() {
            return Err(CemcError::Config(ErrorInfo::new(
                "empty-table",
                "swap table needs at least one entry",
            )));
        }
        let probs: Vec<f64> = entries.iter().map(|entry| entry.probability).collect();
        validate_probabilities(&probs, "swap table probabilities")?;
        for (idx, entry) in entries.iter().enumerate() {
            if entry.sublattice_a >= sublattices.len() || entry.sublattice_b >= sublattices.len() {
                return Err(CemcError::Config(
                    ErrorInfo::new("entry-sublattice-range", "table entry names unknown sublattice")
                        .with_context("entry", idx.to_string()),
                ));
            }
            let lattice_a = &sublattices[entry.sublattice_a];
            let lattice_b = &sublattices[entry.sublattice_b];
            if entry.sublattice_a == entry.sublattice_b && entry.species_a == entry.species_b {
                return Err(CemcError::Config(
                    ErrorInfo::new("degenerate-entry", "entry exchanges a species with itself")
                        .with_context("entry", idx.to_string()),
                ));
            }
            for (species, lattice, side) in [
                (&entry.species_a, lattice_a, "a"),
                (&entry.species_b, lattice_b, "b"),
            ] {
                if lattice.code_for_species(species).is_none() {
                    return Err(CemcError::Config(
                        ErrorInfo::new(
                            "entry-species-unknown",
                            "entry species not allowed on its sublattice",
                        )
                        .with_context("entry", idx.to_string())
                        .with_context("side", side.to_string())
                        .with_context("species", species.canonical_key()),
                    ));
                }
            }
            // The exchange places each species on the opposite sublattice.
            if lattice_a.code_for_species(&entry.species_b).is_none()
                || lattice_b.code_for_species(&entry.species_a).is_none()
            {
                return Err(CemcError::Config(
                    ErrorInfo::new(
                        "entry-cross-not-allowed",
                        "exchanged species not allowed on the opposite sublattice",
                    )
                    .with_context("entry", idx.to_string()),
                ));
            }
            if let Some(shared) = shared_species {
                if entry.sublattice_a != entry.sublattice_b
                    && (!shared.contains(&entry.species_a) || !shared.contains(&entry.species_b))
                {
                    return Err(CemcError::Config(
                        ErrorInfo::new(
                            "entry-not-shared",
                            "cross-sublattice entry uses a species outside the shared set",
                        )
                        .with_context("entry", idx.to_string()),
                    ));
                }
            }
        }
        Ok(Self {
            sublattices,
            entries,
        })
    }

    /// Proposes one table swap.
    pub fn propose(&self, occupancy: &[usize], rng: &mut RngHandle) -> Proposal {
        let probs: Vec<f64> = self.entries.iter().map(|entry| entry.probability).collect();
        let entry = &self.entries[select_weighted(&probs, rng)];
        let lattice_a = &self.sublattices[entry.sublattice_a];
        let lattice_b = &self.sublattices[entry.sublattice_b];
        let code_a = lattice_a
            .code_for_species(&entry.species_a)
            .expect("validated at construction");
        let code_b = lattice_b
            .code_for_species(&entry.species_b)
            .expect("validated at construction");

        let hosts_a = hosts(lattice_a, occupancy, code_a);
        let hosts_b = hosts(lattice_b, occupancy, code_b);
        if hosts_a.is_empty() || hosts_b.is_empty() {
            return Proposal::null(
                MoveKind::TableSwap,
                Some(format!(
                    "no site hosts {} or {} for the selected entry",
                    entry.species_a.canonical_key(),
                    entry.species_b.canonical_key()
                )),
            );
        }
        let site_a = hosts_a[rng.index_below(hosts_a.len())];
        let site_b = hosts_b[rng.index_below(hosts_b.len())];
        if site_a == site_b {
            // Same sublattice, same site can only happen for degenerate
            // entries, which construction rejects; guard anyway.
            return Proposal::null(MoveKind::TableSwap, None);
        }
        let new_code_a = lattice_a
            .code_for_species(&entry.species_b)
            .expect("validated at construction");
        let new_code_b = lattice_b
            .code_for_species(&entry.species_a)
            .expect("validated at construction");
        let step = vec![
            SiteFlip::new(site_a, new_code_a),
            SiteFlip::new(site_b, new_code_b),
        ];

        // Reverse selection counts on the post-swap occupancy: the entry
        // mirrored, species b drawn on sublattice a and vice versa.
        let after = cemc_core::apply_step(occupancy, &step);
        let rev_a = hosts(lattice_a, &after, new_code_a).len();
        let rev_b = hosts(lattice_b, &after, new_code_b).len();
        let log_ratio = ((hosts_a.len() * hosts_b.len()) as f64).ln()
            - ((rev_a.max(1) * rev_b.max(1)) as f64).ln();
        Proposal::step(MoveKind::TableSwap, step, log_ratio)
    }
}

fn hosts(sublattice: &Sublattice, occupancy: &[usize], code: usize) -> Vec<usize> {
    sublattice
        .active_sites()
        .iter()
        .copied()
        .filter(|&site| occupancy[site] == code)
        .collect()
}

/// One species transmutation within a reaction entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionChange {
    /// Sublattice the change acts on; `None` means any sublattice allowing
    /// both species (subject to the usher's domain-combination policy).
    pub sublattice: Option<usize>,
    /// Species removed by the change.
    pub from_species: Species,
    /// Species inserted by the change.
    pub to_species: Species,
}

/// A stoichiometric reaction: one or more coupled transmutations applied in
/// a single step (e.g. a lithium removal paired with an oxidation-state
/// change elsewhere).
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEntry {
    /// Coupled changes applied in order.
    pub changes: Vec<ReactionChange>,
    /// Probability of selecting this reaction; entries must sum to one.
    pub probability: f64,
}

/// Semigrand move proposer mixing canonical table swaps with reactions.
#[derive(Debug, Clone)]
pub struct SemigrandTableSwapUsher {
    sublattices: Vec<Sublattice>,
    swap: Option<TableSwapUsher>,
    reactions: Vec<ReactionEntry>,
    grand_move_probability: f64,
    combine_domains: bool,
}

impl SemigrandTableSwapUsher {
    /// Builds the usher.
    ///
    /// On each step a reaction is attempted with `grand_move_probability`,
    /// otherwise a canonical table swap. `combine_domains` controls whether
    /// an unnamed change selects its site from the union of eligible
    /// sublattices or picks one eligible sublattice first.
    pub fn new(
        sublattices: Vec<Sublattice>,
        swap_entries: Vec<SwapTableEntry>,
        reactions: Vec<ReactionEntry>,
        grand_move_probability: f64,
        combine_domains: bool,
    ) -> Result<Self, CemcError> {
        if !(0.0..=1.0).contains(&grand_move_probability) {
            return Err(CemcError::Config(
                ErrorInfo::new("grand-probability-range", "grand move probability must be in [0, 1]")
                    .with_context("probability", grand_move_probability.to_string()),
            ));
        }
        if reactions.is_empty() && grand_move_probability > 0.0 {
            return Err(CemcError::Config(ErrorInfo::new(
                "no-reactions",
                "grand move probability is positive but no reactions are declared",
            )));
        }
        if swap_entries.is_empty() && grand_move_probability < 1.0 {
            return Err(CemcError::Config(ErrorInfo::new(
                "no-swap-entries",
                "canonical moves are reachable but no swap table is declared",
            )));
        }
        if !reactions.is_empty() {
            let probs: Vec<f64> = reactions.iter().map(|entry| entry.probability).collect();
            validate_probabilities(&probs, "reaction probabilities")?;
        }
        for (idx, entry) in reactions.iter().enumerate() {
            if entry.changes.is_empty() {
                return Err(CemcError::Config(
                    ErrorInfo::new("empty-reaction", "reaction entry has no changes")
                        .with_context("entry", idx.to_string()),
                ));
            }
            for change in &entry.changes {
                if change.from_species == change.to_species {
                    return Err(CemcError::Config(
                        ErrorInfo::new("identity-reaction", "reaction change keeps the species")
                            .with_context("entry", idx.to_string())
                            .with_context("species", change.from_species.canonical_key()),
                    ));
                }
                let eligible = eligible_sublattices(&sublattices, change)?;
                if eligible.is_empty() {
                    return Err(CemcError::Config(
                        ErrorInfo::new(
                            "reaction-species-unknown",
                            "no sublattice allows both reaction species",
                        )
                        .with_context("entry", idx.to_string())
                        .with_context("from", change.from_species.canonical_key())
                        .with_context("to", change.to_species.canonical_key()),
                    ));
                }
            }
        }
        let swap = if swap_entries.is_empty() {
            None
        } else {
            Some(TableSwapUsher::new(
                sublattices.clone(),
                swap_entries,
                None,
            )?)
        };
        Ok(Self {
            sublattices,
            swap,
            reactions,
            grand_move_probability,
            combine_domains,
        })
    }

    /// Proposes either a reaction flip or a canonical table swap.
    pub fn propose(&self, occupancy: &[usize], rng: &mut RngHandle) -> Proposal {
        if rng.uniform_f64() < self.grand_move_probability {
            self.propose_reaction(occupancy, rng)
        } else {
            match &self.swap {
                Some(swap) => swap.propose(occupancy, rng),
                None => Proposal::null(MoveKind::TableSwap, None),
            }
        }
    }

    fn propose_reaction(&self, occupancy: &[usize], rng: &mut RngHandle) -> Proposal {
        let probs: Vec<f64> = self.reactions.iter().map(|entry| entry.probability).collect();
        let entry = &self.reactions[select_weighted(&probs, rng)];
        // Each reaction fires forward or backward with equal probability so
        // the chain can undo an accepted reaction through the same entry.
        let forward = rng.uniform_f64() < 0.5;
        let changes: Vec<ReactionChange> = if forward {
            entry.changes.clone()
        } else {
            entry
                .changes
                .iter()
                .rev()
                .map(|change| ReactionChange {
                    sublattice: change.sublattice,
                    from_species: change.to_species.clone(),
                    to_species: change.from_species.clone(),
                })
                .collect()
        };

        let mut scratch = occupancy.to_vec();
        let mut step = Vec::with_capacity(changes.len());
        let mut old_codes = Vec::with_capacity(changes.len());
        let mut log_forward = 0.0;
        for change in &changes {
            let Some((site, sl_idx, ln_count)) = self.select_site(&scratch, change, rng) else {
                return Proposal::null(
                    MoveKind::ReactionFlip,
                    Some(format!(
                        "no active site hosts {}",
                        change.from_species.canonical_key()
                    )),
                );
            };
            log_forward += ln_count;
            let code = self.sublattices[sl_idx]
                .code_for_species(&change.to_species)
                .expect("validated at construction");
            old_codes.push(scratch[site]);
            scratch[site] = code;
            step.push(SiteFlip::new(site, code));
        }

        // Reverse path: the mirrored changes in reverse order, forced through
        // the same sites, walking the occupancy back to the initial state.
        let mut log_reverse = 0.0;
        for ((change, flip), &old_code) in
            changes.iter().zip(&step).zip(&old_codes).rev()
        {
            let reversed = ReactionChange {
                sublattice: change.sublattice,
                from_species: change.to_species.clone(),
                to_species: change.from_species.clone(),
            };
            let Some(ln_count) = self.reverse_count(&scratch, &reversed, flip.site) else {
                // The reverse path cannot select our site; reject outright by
                // reporting an infinitely unfavourable ratio.
                return Proposal::null(MoveKind::ReactionFlip, None);
            };
            log_reverse += ln_count;
            scratch[flip.site] = old_code;
        }

        // p_fwd ~ prod(1/n_i), p_rev ~ prod(1/n'_j): the ratio inverts.
        let log_ratio = log_forward - log_reverse;
        Proposal::step(MoveKind::ReactionFlip, step, log_ratio)
    }

    fn select_site(
        &self,
        occupancy: &[usize],
        change: &ReactionChange,
        rng: &mut RngHandle,
    ) -> Option<(usize, usize, f64)> {
        let eligible = eligible_sublattices(&self.sublattices, change)
            .expect("validated at construction");
        if self.combine_domains {
            let mut pool = Vec::new();
            for &sl_idx in &eligible {
                let lattice = &self.sublattices[sl_idx];
                let code = lattice.code_for_species(&change.from_species)?;
                for &site in lattice.active_sites() {
                    if occupancy[site] == code {
                        pool.push((site, sl_idx));
                    }
                }
            }
            if pool.is_empty() {
                return None;
            }
            let (site, sl_idx) = pool[rng.index_below(pool.len())];
            Some((site, sl_idx, (pool.len() as f64).ln()))
        } else {
            let candidate_lists: Vec<(usize, Vec<usize>)> = eligible
                .iter()
                .filter_map(|&sl_idx| {
                    let lattice = &self.sublattices[sl_idx];
                    let code = lattice.code_for_species(&change.from_species)?;
                    let sites = hosts(lattice, occupancy, code);
                    (!sites.is_empty()).then_some((sl_idx, sites))
                })
                .collect();
            if candidate_lists.is_empty() {
                return None;
            }
            let (sl_idx, sites) = &candidate_lists[rng.index_below(candidate_lists.len())];
            let site = sites[rng.index_below(sites.len())];
            Some((
                site,
                *sl_idx,
                ((candidate_lists.len() * sites.len()) as f64).ln(),
            ))
        }
    }

    fn reverse_count(
        &self,
        occupancy: &[usize],
        change: &ReactionChange,
        site: usize,
    ) -> Option<f64> {
        let eligible = eligible_sublattices(&self.sublattices, change)
            .expect("validated at construction");
        if self.combine_domains {
            let mut total = 0usize;
            let mut contains_site = false;
            for &sl_idx in &eligible {
                let lattice = &self.sublattices[sl_idx];
                let code = lattice.code_for_species(&change.from_species)?;
                for &candidate in lattice.active_sites() {
                    if occupancy[candidate] == code {
                        total += 1;
                        if candidate == site {
                            contains_site = true;
                        }
                    }
                }
            }
            contains_site.then(|| (total as f64).ln())
        } else {
            let mut nonempty = 0usize;
            let mut own_count = None;
            for &sl_idx in &eligible {
                let lattice = &self.sublattices[sl_idx];
                let Some(code) = lattice.code_for_species(&change.from_species) else {
                    continue;
                };
                let sites = hosts(lattice, occupancy, code);
                if sites.is_empty() {
                    continue;
                }
                nonempty += 1;
                if sites.contains(&site) {
                    own_count = Some(sites.len());
                }
            }
            own_count.map(|count| ((nonempty * count) as f64).ln())
        }
    }
}

fn eligible_sublattices(
    sublattices: &[Sublattice],
    change: &ReactionChange,
) -> Result<Vec<usize>, CemcError> {
    match change.sublattice {
        Some(sl_idx) => {
            if sl_idx >= sublattices.len() {
                return Err(CemcError::Config(
                    ErrorInfo::new("reaction-sublattice-range", "reaction names unknown sublattice")
                        .with_context("sublattice", sl_idx.to_string()),
                ));
            }
            let lattice = &sublattices[sl_idx];
            if lattice.code_for_species(&change.from_species).is_some()
                && lattice.code_for_species(&change.to_species).is_some()
            {
                Ok(vec![sl_idx])
            } else {
                Ok(Vec::new())
            }
        }
        None => Ok(sublattices
            .iter()
            .enumerate()
            .filter(|(_, lattice)| {
                lattice.code_for_species(&change.from_species).is_some()
                    && lattice.code_for_species(&change.to_species).is_some()
            })
            .map(|(idx, _)| idx)
            .collect()),
    }
}
