//! Cascade Simulation
//!
//! Step-bounded propagation of neurotransmitter level changes through the
//! brain region connectivity graph.
//!
//! # Algorithm
//!
//! 1. Every region starts at `{activation: 0, confidence: 0}`.
//! 2. Direct pass (step 0): for each changed neurotransmitter that has at
//!    least one production site, every receptor profile for it adds
//!    `calculate_response(baseline + change)` to its region's activation and
//!    raises that region's confidence to at least 0.7.
//! 3. Propagation, for `step in 1..steps`: every region with
//!    |activation| > 0.1 pushes `activation × weight` along each outgoing
//!    edge into a per-step delta, and lifts the target's confidence to at
//!    least `source_confidence × 0.8^step`. Deltas are applied after all
//!    sources are visited, then all activations are clamped to [−1, 1].
//! 4. Regions with |activation| <= 0.05 are dropped from the result.
//!
//! Cycles and self-loops are not detected; the step bound and the per-step
//! clamp keep activations finite. Regions are visited in
//! [`BrainRegion::ALL`] order, so results are fully deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{CascadeConfig, DEFAULT_STEPS};
use crate::enums::{BrainRegion, ClinicalSignificance, Neurotransmitter};
use crate::error::ValidationError;
use crate::mapping::NeurotransmitterMapping;

/// Simulated effect on one region
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionActivation {
    /// Signed effect magnitude in [−1, 1]
    pub activation: f64,
    /// Heuristic certainty in [0, 1]
    pub confidence: f64,
}

impl RegionActivation {
    /// Bucket this activation into a clinical significance level
    pub fn clinical_significance(&self) -> ClinicalSignificance {
        ClinicalSignificance::from_activation(self.activation)
    }
}

/// Surviving regions of a cascade
pub type CascadeResult = BTreeMap<BrainRegion, RegionActivation>;

/// Snapshot of all touched regions after one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 0 for the direct pass, then 1.. for propagation steps
    pub step: usize,
    /// Regions with nonzero activation or confidence
    pub regions: BTreeMap<BrainRegion, RegionActivation>,
}

/// Cascade result together with its per-step history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeTrace {
    pub steps: Vec<CascadeStep>,
    pub result: CascadeResult,
}

type RegionState = [RegionActivation; BrainRegion::COUNT];

impl NeurotransmitterMapping {
    /// Simulate a cascade with reference parameters.
    ///
    /// `steps` counts the direct pass, so `steps <= 1` performs no
    /// propagation. Fails only on non-finite changes or a step count above
    /// the configured ceiling.
    pub fn simulate_cascade(
        &self,
        initial_changes: &BTreeMap<Neurotransmitter, f64>,
        steps: usize,
    ) -> Result<CascadeResult, ValidationError> {
        self.simulate_cascade_with(initial_changes, steps, &CascadeConfig::default())
    }

    /// [`simulate_cascade`](Self::simulate_cascade) with three steps
    pub fn simulate_cascade_default(
        &self,
        initial_changes: &BTreeMap<Neurotransmitter, f64>,
    ) -> Result<CascadeResult, ValidationError> {
        self.simulate_cascade(initial_changes, DEFAULT_STEPS)
    }

    /// Simulate a cascade for `config.default_steps` steps
    pub fn simulate_cascade_default_with(
        &self,
        initial_changes: &BTreeMap<Neurotransmitter, f64>,
        config: &CascadeConfig,
    ) -> Result<CascadeResult, ValidationError> {
        self.simulate_cascade_with(initial_changes, config.default_steps, config)
    }

    /// Simulate a cascade with explicit parameters
    pub fn simulate_cascade_with(
        &self,
        initial_changes: &BTreeMap<Neurotransmitter, f64>,
        steps: usize,
        config: &CascadeConfig,
    ) -> Result<CascadeResult, ValidationError> {
        run_cascade(self, initial_changes, steps, config, None)
    }

    /// Simulate a cascade and keep a snapshot of every step
    pub fn simulate_cascade_traced(
        &self,
        initial_changes: &BTreeMap<Neurotransmitter, f64>,
        steps: usize,
        config: &CascadeConfig,
    ) -> Result<CascadeTrace, ValidationError> {
        let mut history = Vec::with_capacity(steps.max(1));
        let result = run_cascade(self, initial_changes, steps, config, Some(&mut history))?;
        Ok(CascadeTrace {
            steps: history,
            result,
        })
    }
}

fn run_cascade(
    mapping: &NeurotransmitterMapping,
    initial_changes: &BTreeMap<Neurotransmitter, f64>,
    steps: usize,
    config: &CascadeConfig,
    mut history: Option<&mut Vec<CascadeStep>>,
) -> Result<CascadeResult, ValidationError> {
    config.validate()?;
    config.check_steps(steps)?;
    mapping.validate().inspect_err(|e| {
        tracing::warn!(patient_id = %mapping.patient_id(), error = %e, "Mapping failed validation")
    })?;
    for (nt, change) in initial_changes {
        ValidationError::check_finite("initial change", *change).inspect_err(|e| {
            tracing::warn!(neurotransmitter = %nt, error = %e, "Rejected cascade input")
        })?;
    }

    let mut state: RegionState = [RegionActivation::default(); BrainRegion::COUNT];

    apply_direct_effects(mapping, initial_changes, config, &mut state);
    if let Some(history) = history.as_deref_mut() {
        history.push(snapshot(0, &state));
    }

    for step in 1..steps {
        propagate_step(mapping, step, config, &mut state);
        if let Some(history) = history.as_deref_mut() {
            history.push(snapshot(step, &state));
        }
    }

    let result: CascadeResult = BrainRegion::ALL
        .iter()
        .filter_map(|region| {
            let slot = state[region.index()];
            // Direct-pass sums are only clamped here when no propagation ran
            let activation = slot.activation.clamp(-1.0, 1.0);
            (activation.abs() > config.result_threshold).then_some((
                *region,
                RegionActivation {
                    activation,
                    confidence: slot.confidence,
                },
            ))
        })
        .collect();

    tracing::debug!(
        patient_id = %mapping.patient_id(),
        changes = initial_changes.len(),
        steps,
        affected = result.len(),
        "Cascade simulated"
    );
    Ok(result)
}

fn apply_direct_effects(
    mapping: &NeurotransmitterMapping,
    initial_changes: &BTreeMap<Neurotransmitter, f64>,
    config: &CascadeConfig,
    state: &mut RegionState,
) {
    for (&nt, &change) in initial_changes {
        if mapping.get_producing_regions(nt).is_empty() {
            tracing::trace!(neurotransmitter = %nt, "No production sites, skipping");
            continue;
        }

        let level = config.baseline_level + change;
        for profile in mapping.get_receptor_profiles_for_neurotransmitter(nt) {
            let slot = &mut state[profile.brain_region.index()];
            slot.activation += profile.calculate_response(level);
            slot.confidence = slot.confidence.max(config.direct_confidence);
        }
    }
}

fn propagate_step(
    mapping: &NeurotransmitterMapping,
    step: usize,
    config: &CascadeConfig,
    state: &mut RegionState,
) {
    let confidence_decay = config.confidence_decay.powi(step as i32);
    let mut deltas = [0.0f64; BrainRegion::COUNT];
    let mut sources = 0usize;

    for source in BrainRegion::ALL {
        // Read at visit time: confidence may already have been lifted by an
        // earlier source in this step, activation has not changed yet.
        let current = state[source.index()];
        // Negated so a NaN activation never passes the gate
        if !(current.activation.abs() > config.propagation_threshold) {
            continue;
        }
        sources += 1;

        for (target, weight) in mapping.connections_from(source) {
            let propagated = current.activation * weight;
            deltas[target.index()] += propagated;

            let slot = &mut state[target.index()];
            slot.confidence = slot.confidence.max(current.confidence * confidence_decay);

            tracing::trace!(step, %source, %target, propagated, "Propagated activation");
        }
    }

    for (slot, delta) in state.iter_mut().zip(deltas) {
        slot.activation = (slot.activation + delta).clamp(-1.0, 1.0);
    }

    tracing::debug!(step, sources, confidence_decay, "Cascade step complete");
}

fn snapshot(step: usize, state: &RegionState) -> CascadeStep {
    let regions = BrainRegion::ALL
        .iter()
        .filter_map(|region| {
            let slot = state[region.index()];
            (slot.activation != 0.0 || slot.confidence != 0.0).then_some((*region, slot))
        })
        .collect();
    CascadeStep { step, regions }
}
