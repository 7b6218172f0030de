//! Composite processor summing independent feature-space contributions.

use cemc_core::{CemcError, ErrorInfo, SiteFlip};

use crate::processor::Processor;

/// Concatenates the feature spaces of member processors.
///
/// The feature vector, feature change and coefficient vector are the
/// member vectors laid end to end, so the composite energy is the sum of
/// member energies. Typical use pairs a [`crate::ClusterProcessor`] with an
/// [`crate::EwaldProcessor`].
pub struct CompositeProcessor {
    members: Vec<Box<dyn Processor>>,
    coefficients: Vec<f64>,
}

impl CompositeProcessor {
    /// Builds a composite from at least one member processor.
    pub fn new(members: Vec<Box<dyn Processor>>) -> Result<Self, CemcError> {
        if members.is_empty() {
            return Err(CemcError::Processor(ErrorInfo::new(
                "no-members",
                "composite processor needs at least one member",
            )));
        }
        let coefficients = members
            .iter()
            .flat_map(|member| member.coefficients().iter().copied())
            .collect();
        Ok(Self {
            members,
            coefficients,
        })
    }

    /// Member processors in concatenation order.
    pub fn members(&self) -> &[Box<dyn Processor>] {
        &self.members
    }
}

impl Processor for CompositeProcessor {
    fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    fn feature_vector(&self, occupancy: &[usize]) -> Result<Vec<f64>, CemcError> {
        let mut features = Vec::with_capacity(self.coefficients.len());
        for member in &self.members {
            features.extend(member.feature_vector(occupancy)?);
        }
        Ok(features)
    }

    fn feature_change(
        &self,
        occupancy: &[usize],
        step: &[SiteFlip],
    ) -> Result<Vec<f64>, CemcError> {
        let mut delta = Vec::with_capacity(self.coefficients.len());
        for member in &self.members {
            delta.extend(member.feature_change(occupancy, step)?);
        }
        Ok(delta)
    }
}
