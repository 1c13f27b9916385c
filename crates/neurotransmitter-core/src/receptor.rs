//! Receptor Profiles
//!
//! A receptor profile describes how one brain region responds to one
//! neurotransmitter through one receptor subtype. The response is a pure
//! function of profile state and neurotransmitter level; sensitivity adapts
//! homeostatically under sustained exposure.
//!
//! # Response model
//!
//! | Receptor type | Base response |
//! |---|---|
//! | Excitatory | `density × level` |
//! | Inhibitory | `−density × level` |
//! | any other | `density × (level − 0.5) × 2` |
//!
//! The base response is scaled by sensitivity and clamped to [−1, 1].

use serde::{Deserialize, Serialize};

use crate::enums::{BrainRegion, ClinicalSignificance, Neurotransmitter, ReceptorSubtype, ReceptorType};
use crate::error::ValidationError;

/// Lowest sensitivity a receptor can regulate down to
pub const MIN_SENSITIVITY: f64 = 0.1;

/// Highest sensitivity a receptor can regulate up to
pub const MAX_SENSITIVITY: f64 = 2.0;

/// Sustained level above which receptors downregulate
pub const DOWNREGULATION_THRESHOLD: f64 = 0.7;

/// Sustained level below which receptors upregulate
pub const UPREGULATION_THRESHOLD: f64 = 0.3;

/// Default up/downregulation potential for new profiles
pub const DEFAULT_REGULATION_POTENTIAL: f64 = 0.1;

/// Response characteristics of one region to one neurotransmitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceptorProfile {
    pub brain_region: BrainRegion,
    pub neurotransmitter: Neurotransmitter,
    pub receptor_type: ReceptorType,
    pub receptor_subtype: ReceptorSubtype,
    /// Receptor density [0, 1]
    pub density: f64,
    /// Response gain [0.1, 2.0], adjusted by regulation
    pub sensitivity: f64,
    #[serde(default)]
    pub clinical_relevance: Option<ClinicalSignificance>,
    /// Sensitivity gained per unit of low exposure [0, 1]
    pub upregulation_potential: f64,
    /// Sensitivity lost per unit of high exposure [0, 1]
    pub downregulation_potential: f64,
}

impl ReceptorProfile {
    /// Create a validated profile with default regulation potentials.
    pub fn new(
        brain_region: BrainRegion,
        neurotransmitter: Neurotransmitter,
        receptor_type: ReceptorType,
        receptor_subtype: ReceptorSubtype,
        density: f64,
        sensitivity: f64,
    ) -> Result<Self, ValidationError> {
        let profile = ReceptorProfile {
            brain_region,
            neurotransmitter,
            receptor_type,
            receptor_subtype,
            density,
            sensitivity,
            clinical_relevance: None,
            upregulation_potential: DEFAULT_REGULATION_POTENTIAL,
            downregulation_potential: DEFAULT_REGULATION_POTENTIAL,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Attach a clinical relevance tag
    pub fn with_clinical_relevance(mut self, relevance: ClinicalSignificance) -> Self {
        self.clinical_relevance = Some(relevance);
        self
    }

    /// Set validated up/downregulation potentials
    pub fn with_regulation_potentials(
        mut self,
        upregulation: f64,
        downregulation: f64,
    ) -> Result<Self, ValidationError> {
        self.upregulation_potential =
            ValidationError::check_range("upregulation_potential", upregulation, 0.0, 1.0)?;
        self.downregulation_potential =
            ValidationError::check_range("downregulation_potential", downregulation, 0.0, 1.0)?;
        Ok(self)
    }

    /// Check every numeric field against its documented range.
    ///
    /// Profiles deserialized from external JSON should pass through this
    /// before they are added to a mapping.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("density", self.density, 0.0, 1.0)?;
        ValidationError::check_range(
            "sensitivity",
            self.sensitivity,
            MIN_SENSITIVITY,
            MAX_SENSITIVITY,
        )?;
        ValidationError::check_range(
            "upregulation_potential",
            self.upregulation_potential,
            0.0,
            1.0,
        )?;
        ValidationError::check_range(
            "downregulation_potential",
            self.downregulation_potential,
            0.0,
            1.0,
        )?;
        Ok(())
    }

    /// Identity key: at most one profile per key lives in a mapping
    #[inline]
    pub fn key(&self) -> (BrainRegion, Neurotransmitter) {
        (self.brain_region, self.neurotransmitter)
    }

    /// Response of this receptor population to a neurotransmitter level.
    ///
    /// Always in [−1, 1]; zero when density is zero or the level is not
    /// finite.
    pub fn calculate_response(&self, neurotransmitter_level: f64) -> f64 {
        if self.density == 0.0 || !neurotransmitter_level.is_finite() {
            return 0.0;
        }

        let base = match self.receptor_type {
            ReceptorType::Excitatory => self.density * neurotransmitter_level,
            ReceptorType::Inhibitory => -self.density * neurotransmitter_level,
            _ => self.density * (neurotransmitter_level - 0.5) * 2.0,
        };

        (base * self.sensitivity).clamp(-1.0, 1.0)
    }

    /// Homeostatic adaptation to a sustained neurotransmitter level.
    ///
    /// High exposure (> 0.7) lowers sensitivity by
    /// `downregulation_potential × duration_factor`; low exposure (< 0.3)
    /// raises it by `upregulation_potential × duration_factor`. Sensitivity
    /// stays in [0.1, 2.0].
    pub fn update_regulation(&mut self, sustained_level: f64, duration_factor: f64) {
        let before = self.sensitivity;

        if sustained_level > DOWNREGULATION_THRESHOLD {
            self.sensitivity -= self.downregulation_potential * duration_factor;
        } else if sustained_level < UPREGULATION_THRESHOLD {
            self.sensitivity += self.upregulation_potential * duration_factor;
        }

        // NaN duration factors leave the receptor where it was
        if !self.sensitivity.is_finite() {
            self.sensitivity = before;
        }
        self.sensitivity = self.sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);

        if self.sensitivity != before {
            tracing::trace!(
                region = %self.brain_region,
                neurotransmitter = %self.neurotransmitter,
                before,
                after = self.sensitivity,
                "Receptor sensitivity regulated"
            );
        }
    }

    /// `update_regulation` with a duration factor of 1.0
    pub fn update_regulation_default(&mut self, sustained_level: f64) {
        self.update_regulation(sustained_level, 1.0);
    }
}
