//! Neurotransmitter Mapping
//!
//! Per-patient aggregate of receptor profiles, neurotransmitter production
//! sites and the weighted directed connectivity graph between brain regions.
//!
//! # Invariants
//!
//! - At most one [`ReceptorProfile`] per `(BrainRegion, Neurotransmitter)`;
//!   adding a profile for an existing key replaces it (last write wins).
//! - Production sites hold no duplicate region per neurotransmitter and keep
//!   insertion order.
//! - Connectivity weights are in [0, 1]. The graph need not be symmetric or
//!   acyclic; self-loops are allowed.
//! - `version` starts at 1 and increases by one on every effective mutation.
//!
//! The mapping has no internal synchronization. Callers sharing a mapping
//! across threads serialize access per patient (see
//! [`crate::repository::MappingStore`]).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BASELINE_LEVEL;
use crate::enums::{BrainRegion, Neurotransmitter, ReceptorType};
use crate::error::{NeurotransmitterResult, ValidationError};
use crate::receptor::ReceptorProfile;

/// Identity key of a receptor profile within a mapping
pub type ProfileKey = (BrainRegion, Neurotransmitter);

/// Weighted adjacency: source region -> (target region -> weight)
pub type Connectivity = BTreeMap<BrainRegion, BTreeMap<BrainRegion, f64>>;

/// Reserved feedback table: neurotransmitter -> region -> (neurotransmitter -> weight).
///
/// Carried and serialized but never read by any computation.
pub type FeedbackMechanisms =
    BTreeMap<Neurotransmitter, BTreeMap<BrainRegion, BTreeMap<Neurotransmitter, f64>>>;

/// Scale applied to sensitivity to obtain a response confidence
pub const RESPONSE_CONFIDENCE_FACTOR: f64 = 0.8;

/// Lower bound of the response confidence heuristic
pub const MIN_RESPONSE_CONFIDENCE: f64 = 0.2;

/// Upper bound of the response confidence heuristic
pub const MAX_RESPONSE_CONFIDENCE: f64 = 1.0;

/// One-hop effect of a neurotransmitter level change on a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeurotransmitterEffect {
    /// Response at the new level
    pub effect: f64,
    /// Sensitivity-derived confidence heuristic
    pub confidence: f64,
    /// Response at the new level minus response at baseline
    pub change_from_baseline: f64,
}

/// Aggregated receptor picture of one neurotransmitter in one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionNeurotransmitterProfile {
    /// Mean sensitivity of the contributing profiles
    pub sensitivity: f64,
    /// Sum of contributing densities (not normalized; may exceed 1.0)
    pub receptor_density: f64,
    /// Distinct receptor types, in first-seen order
    pub receptor_types: Vec<ReceptorType>,
}

/// Per-patient neurotransmitter mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeurotransmitterMapping {
    patient_id: Uuid,
    production_sites: BTreeMap<Neurotransmitter, Vec<BrainRegion>>,
    #[serde(with = "profile_list")]
    pub(crate) receptor_profiles: BTreeMap<ProfileKey, ReceptorProfile>,
    pub(crate) brain_region_connectivity: Connectivity,
    #[serde(default)]
    feedback_mechanisms: FeedbackMechanisms,
    pub(crate) version: u32,
    updated_at: DateTime<Utc>,
}

impl NeurotransmitterMapping {
    /// Create an empty mapping for a patient
    pub fn new(patient_id: Uuid) -> Self {
        NeurotransmitterMapping {
            patient_id,
            production_sites: BTreeMap::new(),
            receptor_profiles: BTreeMap::new(),
            brain_region_connectivity: BTreeMap::new(),
            feedback_mechanisms: BTreeMap::new(),
            version: 1,
            updated_at: Utc::now(),
        }
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    /// Mutation counter, starting at 1
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn production_sites(&self) -> &BTreeMap<Neurotransmitter, Vec<BrainRegion>> {
        &self.production_sites
    }

    pub fn brain_region_connectivity(&self) -> &Connectivity {
        &self.brain_region_connectivity
    }

    pub fn feedback_mechanisms(&self) -> &FeedbackMechanisms {
        &self.feedback_mechanisms
    }

    /// All profiles ordered by (region, neurotransmitter)
    pub fn receptor_profiles(&self) -> impl Iterator<Item = &ReceptorProfile> {
        self.receptor_profiles.values()
    }

    pub fn profile_count(&self) -> usize {
        self.receptor_profiles.len()
    }

    fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.updated_at = Utc::now();
    }

    // ==================== QUERIES ====================

    /// Profiles located in `region`
    pub fn get_receptor_profiles_for_region(&self, region: BrainRegion) -> Vec<&ReceptorProfile> {
        self.receptor_profiles
            .values()
            .filter(|p| p.brain_region == region)
            .collect()
    }

    /// Profiles responding to `neurotransmitter`, in region order
    pub fn get_receptor_profiles_for_neurotransmitter(
        &self,
        neurotransmitter: Neurotransmitter,
    ) -> Vec<&ReceptorProfile> {
        self.receptor_profiles
            .values()
            .filter(|p| p.neurotransmitter == neurotransmitter)
            .collect()
    }

    /// Regions producing `neurotransmitter`, in insertion order
    pub fn get_producing_regions(&self, neurotransmitter: Neurotransmitter) -> &[BrainRegion] {
        self.production_sites
            .get(&neurotransmitter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Profiles for a (region, neurotransmitter) pair: empty or exactly one
    pub fn get_receptor_profiles(
        &self,
        region: BrainRegion,
        neurotransmitter: Neurotransmitter,
    ) -> Vec<&ReceptorProfile> {
        self.get_receptor_profile(region, neurotransmitter)
            .into_iter()
            .collect()
    }

    /// The profile for a (region, neurotransmitter) pair, if any
    pub fn get_receptor_profile(
        &self,
        region: BrainRegion,
        neurotransmitter: Neurotransmitter,
    ) -> Option<&ReceptorProfile> {
        self.receptor_profiles.get(&(region, neurotransmitter))
    }

    /// Outgoing edges of `region` (empty when it has none)
    pub fn connections_from(&self, region: BrainRegion) -> impl Iterator<Item = (BrainRegion, f64)> + '_ {
        self.brain_region_connectivity
            .get(&region)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(target, weight)| (*target, *weight)))
    }

    // ==================== MUTATIONS ====================

    /// Insert a validated profile, replacing any existing profile for the
    /// same (region, neurotransmitter). Returns the replaced profile.
    ///
    /// A profile failing [`ReceptorProfile::validate`] is rejected and the
    /// mapping is left untouched.
    pub fn add_receptor_profile(
        &mut self,
        profile: ReceptorProfile,
    ) -> Result<Option<ReceptorProfile>, ValidationError> {
        profile.validate().inspect_err(|e| {
            tracing::warn!(
                region = %profile.brain_region,
                neurotransmitter = %profile.neurotransmitter,
                error = %e,
                "Rejected receptor profile"
            )
        })?;

        let key = profile.key();
        let replaced = self.receptor_profiles.insert(key, profile);
        self.touch();

        tracing::debug!(
            patient_id = %self.patient_id,
            region = %key.0,
            neurotransmitter = %key.1,
            replaced = replaced.is_some(),
            version = self.version,
            "Receptor profile added"
        );
        Ok(replaced)
    }

    /// Record `region` as a production site of `neurotransmitter`.
    ///
    /// Idempotent; returns whether the site was new.
    pub fn add_production_site(
        &mut self,
        neurotransmitter: Neurotransmitter,
        region: BrainRegion,
    ) -> bool {
        let sites = self.production_sites.entry(neurotransmitter).or_default();
        if sites.contains(&region) {
            return false;
        }
        sites.push(region);
        self.touch();

        tracing::debug!(
            patient_id = %self.patient_id,
            neurotransmitter = %neurotransmitter,
            region = %region,
            "Production site added"
        );
        true
    }

    /// Set the weight of the edge `source -> target`.
    pub fn set_connection(
        &mut self,
        source: BrainRegion,
        target: BrainRegion,
        weight: f64,
    ) -> Result<(), ValidationError> {
        let weight = ValidationError::check_range("connection weight", weight, 0.0, 1.0)
            .inspect_err(|e| tracing::warn!(%source, %target, error = %e, "Rejected connection"))?;

        self.brain_region_connectivity
            .entry(source)
            .or_default()
            .insert(target, weight);
        self.touch();

        tracing::debug!(%source, %target, weight, "Connection set");
        Ok(())
    }

    /// Remove the edge `source -> target`, returning its weight.
    pub fn remove_connection(&mut self, source: BrainRegion, target: BrainRegion) -> Option<f64> {
        let targets = self.brain_region_connectivity.get_mut(&source)?;
        let weight = targets.remove(&target)?;
        if targets.is_empty() {
            self.brain_region_connectivity.remove(&source);
        }
        self.touch();
        Some(weight)
    }

    /// Apply sustained exposure regulation to every profile of
    /// `neurotransmitter`. Returns the number of profiles visited.
    pub fn apply_sustained_exposure(
        &mut self,
        neurotransmitter: Neurotransmitter,
        sustained_level: f64,
        duration_factor: f64,
    ) -> usize {
        let mut adjusted = 0;
        for profile in self
            .receptor_profiles
            .values_mut()
            .filter(|p| p.neurotransmitter == neurotransmitter)
        {
            profile.update_regulation(sustained_level, duration_factor);
            adjusted += 1;
        }

        if adjusted > 0 {
            self.touch();
        }
        tracing::debug!(
            neurotransmitter = %neurotransmitter,
            sustained_level,
            duration_factor,
            adjusted,
            "Sustained exposure applied"
        );
        adjusted
    }

    // ==================== REGION CALCULATIONS ====================

    /// Sensitivity of the profile for (region, neurotransmitter), or 0.0 when
    /// the region has no such receptors.
    pub fn calculate_region_sensitivity(
        &self,
        region: BrainRegion,
        neurotransmitter: Neurotransmitter,
    ) -> f64 {
        self.get_receptor_profile(region, neurotransmitter)
            .map(|p| p.sensitivity)
            .unwrap_or(0.0)
    }

    /// Net effect and confidence of a neurotransmitter level on a region.
    ///
    /// Returns `(0.0, 0.0)` without a matching profile. The confidence is a
    /// heuristic, `clamp(sensitivity × 0.8, 0.2, 1.0)`, not a statistical
    /// interval.
    pub fn calculate_region_response(
        &self,
        region: BrainRegion,
        neurotransmitter: Neurotransmitter,
        neurotransmitter_level: f64,
    ) -> (f64, f64) {
        match self.get_receptor_profile(region, neurotransmitter) {
            Some(profile) => (
                profile.calculate_response(neurotransmitter_level),
                response_confidence(profile),
            ),
            None => (0.0, 0.0),
        }
    }

    /// One-hop effects of changing `neurotransmitter` by `level_change` from
    /// the 0.5 baseline, for every region with a matching profile.
    ///
    /// Non-finite changes are treated as no change.
    pub fn get_neurotransmitter_effects(
        &self,
        neurotransmitter: Neurotransmitter,
        level_change: f64,
    ) -> BTreeMap<BrainRegion, NeurotransmitterEffect> {
        let level_change = if level_change.is_finite() {
            level_change
        } else {
            tracing::warn!(%neurotransmitter, level_change, "Ignoring non-finite level change");
            0.0
        };
        let new_level = (BASELINE_LEVEL + level_change).clamp(0.0, 1.0);

        self.get_receptor_profiles_for_neurotransmitter(neurotransmitter)
            .into_iter()
            .map(|profile| {
                let effect = profile.calculate_response(new_level);
                let baseline = profile.calculate_response(BASELINE_LEVEL);
                (
                    profile.brain_region,
                    NeurotransmitterEffect {
                        effect,
                        confidence: response_confidence(profile),
                        change_from_baseline: effect - baseline,
                    },
                )
            })
            .collect()
    }

    /// Receptor summary of every neurotransmitter acting on `region`
    pub fn get_brain_region_neurotransmitter_profile(
        &self,
        region: BrainRegion,
    ) -> BTreeMap<Neurotransmitter, RegionNeurotransmitterProfile> {
        let mut grouped: BTreeMap<Neurotransmitter, Vec<&ReceptorProfile>> = BTreeMap::new();
        for profile in self.get_receptor_profiles_for_region(region) {
            grouped.entry(profile.neurotransmitter).or_default().push(profile);
        }

        grouped
            .into_iter()
            .map(|(nt, profiles)| {
                let count = profiles.len() as f64;
                let sensitivity = profiles.iter().map(|p| p.sensitivity).sum::<f64>() / count;
                let receptor_density = profiles.iter().map(|p| p.density).sum();
                let mut receptor_types = Vec::new();
                for p in &profiles {
                    if !receptor_types.contains(&p.receptor_type) {
                        receptor_types.push(p.receptor_type);
                    }
                }
                (
                    nt,
                    RegionNeurotransmitterProfile {
                        sensitivity,
                        receptor_density,
                        receptor_types,
                    },
                )
            })
            .collect()
    }

    // ==================== SERIALIZATION ====================

    /// Check every stored value against its documented range
    pub fn validate(&self) -> Result<(), ValidationError> {
        for profile in self.receptor_profiles.values() {
            profile.validate()?;
        }
        for targets in self.brain_region_connectivity.values() {
            for weight in targets.values() {
                ValidationError::check_range("connection weight", *weight, 0.0, 1.0)?;
            }
        }
        Ok(())
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> NeurotransmitterResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON and validate.
    ///
    /// Duplicate profiles in the input collapse to the last one; duplicate
    /// production sites are dropped.
    pub fn from_json(json: &str) -> NeurotransmitterResult<Self> {
        let mut mapping: NeurotransmitterMapping = serde_json::from_str(json)?;
        for sites in mapping.production_sites.values_mut() {
            let mut seen = Vec::with_capacity(sites.len());
            sites.retain(|region| {
                if seen.contains(region) {
                    false
                } else {
                    seen.push(*region);
                    true
                }
            });
        }
        mapping.validate()?;
        Ok(mapping)
    }
}

fn response_confidence(profile: &ReceptorProfile) -> f64 {
    (profile.sensitivity * RESPONSE_CONFIDENCE_FACTOR)
        .clamp(MIN_RESPONSE_CONFIDENCE, MAX_RESPONSE_CONFIDENCE)
}

/// Receptor profiles travel as a JSON list; the key is rebuilt on load.
mod profile_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::ProfileKey;
    use crate::receptor::ReceptorProfile;

    pub fn serialize<S>(
        profiles: &BTreeMap<ProfileKey, ReceptorProfile>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(profiles.values())
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<ProfileKey, ReceptorProfile>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<ReceptorProfile>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|p| (p.key(), p)).collect())
    }
}
