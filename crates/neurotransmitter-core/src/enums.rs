//! Closed domain vocabularies: brain regions, neurotransmitters, receptor
//! classes and clinical significance levels.
//!
//! Every enum exposes `ALL` in declaration order. Simulation state is indexed
//! by [`BrainRegion::index`], so the order of `BrainRegion::ALL` is also the
//! deterministic iteration order of the cascade.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Anatomical location used as a node of the connectivity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainRegion {
    PrefrontalCortex,
    OrbitofrontalCortex,
    DorsolateralPrefrontalCortex,
    VentromedialPrefrontalCortex,
    AnteriorCingulateCortex,
    Insula,
    Amygdala,
    Hippocampus,
    Thalamus,
    Hypothalamus,
    NucleusAccumbens,
    Striatum,
    VentralTegmentalArea,
    SubstantiaNigra,
    RapheNuclei,
    LocusCoeruleus,
    BasalForebrain,
    Cerebellum,
    Brainstem,
}

impl BrainRegion {
    /// Number of regions
    pub const COUNT: usize = 19;

    /// All regions in declaration order
    pub const ALL: [BrainRegion; Self::COUNT] = [
        BrainRegion::PrefrontalCortex,
        BrainRegion::OrbitofrontalCortex,
        BrainRegion::DorsolateralPrefrontalCortex,
        BrainRegion::VentromedialPrefrontalCortex,
        BrainRegion::AnteriorCingulateCortex,
        BrainRegion::Insula,
        BrainRegion::Amygdala,
        BrainRegion::Hippocampus,
        BrainRegion::Thalamus,
        BrainRegion::Hypothalamus,
        BrainRegion::NucleusAccumbens,
        BrainRegion::Striatum,
        BrainRegion::VentralTegmentalArea,
        BrainRegion::SubstantiaNigra,
        BrainRegion::RapheNuclei,
        BrainRegion::LocusCoeruleus,
        BrainRegion::BasalForebrain,
        BrainRegion::Cerebellum,
        BrainRegion::Brainstem,
    ];

    /// Dense array index of this region
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            BrainRegion::PrefrontalCortex => "prefrontal_cortex",
            BrainRegion::OrbitofrontalCortex => "orbitofrontal_cortex",
            BrainRegion::DorsolateralPrefrontalCortex => "dorsolateral_prefrontal_cortex",
            BrainRegion::VentromedialPrefrontalCortex => "ventromedial_prefrontal_cortex",
            BrainRegion::AnteriorCingulateCortex => "anterior_cingulate_cortex",
            BrainRegion::Insula => "insula",
            BrainRegion::Amygdala => "amygdala",
            BrainRegion::Hippocampus => "hippocampus",
            BrainRegion::Thalamus => "thalamus",
            BrainRegion::Hypothalamus => "hypothalamus",
            BrainRegion::NucleusAccumbens => "nucleus_accumbens",
            BrainRegion::Striatum => "striatum",
            BrainRegion::VentralTegmentalArea => "ventral_tegmental_area",
            BrainRegion::SubstantiaNigra => "substantia_nigra",
            BrainRegion::RapheNuclei => "raphe_nuclei",
            BrainRegion::LocusCoeruleus => "locus_coeruleus",
            BrainRegion::BasalForebrain => "basal_forebrain",
            BrainRegion::Cerebellum => "cerebellum",
            BrainRegion::Brainstem => "brainstem",
        }
    }
}

/// Signaling chemical whose level changes drive a cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neurotransmitter {
    Serotonin,
    Dopamine,
    Norepinephrine,
    Gaba,
    Glutamate,
    Acetylcholine,
    Endorphins,
    SubstanceP,
    Oxytocin,
    Histamine,
    Glycine,
}

impl Neurotransmitter {
    /// Number of neurotransmitters
    pub const COUNT: usize = 11;

    /// All neurotransmitters in declaration order
    pub const ALL: [Neurotransmitter; Self::COUNT] = [
        Neurotransmitter::Serotonin,
        Neurotransmitter::Dopamine,
        Neurotransmitter::Norepinephrine,
        Neurotransmitter::Gaba,
        Neurotransmitter::Glutamate,
        Neurotransmitter::Acetylcholine,
        Neurotransmitter::Endorphins,
        Neurotransmitter::SubstanceP,
        Neurotransmitter::Oxytocin,
        Neurotransmitter::Histamine,
        Neurotransmitter::Glycine,
    ];

    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Neurotransmitter::Serotonin => "serotonin",
            Neurotransmitter::Dopamine => "dopamine",
            Neurotransmitter::Norepinephrine => "norepinephrine",
            Neurotransmitter::Gaba => "gaba",
            Neurotransmitter::Glutamate => "glutamate",
            Neurotransmitter::Acetylcholine => "acetylcholine",
            Neurotransmitter::Endorphins => "endorphins",
            Neurotransmitter::SubstanceP => "substance_p",
            Neurotransmitter::Oxytocin => "oxytocin",
            Neurotransmitter::Histamine => "histamine",
            Neurotransmitter::Glycine => "glycine",
        }
    }
}

/// How a receptor class turns a neurotransmitter level into a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptorType {
    /// Response grows with level
    Excitatory,
    /// Response falls with level
    Inhibitory,
    Modulatory,
    Ionotropic,
    Metabotropic,
    FastActing,
    SlowActing,
}

impl ReceptorType {
    /// All receptor types in declaration order
    pub const ALL: [ReceptorType; 7] = [
        ReceptorType::Excitatory,
        ReceptorType::Inhibitory,
        ReceptorType::Modulatory,
        ReceptorType::Ionotropic,
        ReceptorType::Metabotropic,
        ReceptorType::FastActing,
        ReceptorType::SlowActing,
    ];

    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptorType::Excitatory => "excitatory",
            ReceptorType::Inhibitory => "inhibitory",
            ReceptorType::Modulatory => "modulatory",
            ReceptorType::Ionotropic => "ionotropic",
            ReceptorType::Metabotropic => "metabotropic",
            ReceptorType::FastActing => "fast_acting",
            ReceptorType::SlowActing => "slow_acting",
        }
    }
}

/// Named receptor subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptorSubtype {
    #[serde(rename = "serotonin_5ht1a")]
    Serotonin5ht1a,
    #[serde(rename = "serotonin_5ht1b")]
    Serotonin5ht1b,
    #[serde(rename = "serotonin_5ht2a")]
    Serotonin5ht2a,
    #[serde(rename = "serotonin_5ht2c")]
    Serotonin5ht2c,
    #[serde(rename = "serotonin_5ht3")]
    Serotonin5ht3,
    DopamineD1,
    DopamineD2,
    DopamineD3,
    DopamineD4,
    AdrenergicAlpha1,
    AdrenergicAlpha2,
    AdrenergicBeta1,
    AdrenergicBeta2,
    GabaA,
    GabaB,
    GlutamateNmda,
    GlutamateAmpa,
    GlutamateKainate,
    GlutamateMglur,
    AcetylcholineNicotinic,
    AcetylcholineMuscarinic,
    MuOpioid,
    #[serde(rename = "neurokinin_1")]
    Neurokinin1,
    OxytocinReceptor,
    HistamineH1,
    HistamineH3,
    GlycineReceptor,
    Other,
}

impl ReceptorSubtype {
    /// All subtypes in declaration order
    pub const ALL: [ReceptorSubtype; 28] = [
        ReceptorSubtype::Serotonin5ht1a,
        ReceptorSubtype::Serotonin5ht1b,
        ReceptorSubtype::Serotonin5ht2a,
        ReceptorSubtype::Serotonin5ht2c,
        ReceptorSubtype::Serotonin5ht3,
        ReceptorSubtype::DopamineD1,
        ReceptorSubtype::DopamineD2,
        ReceptorSubtype::DopamineD3,
        ReceptorSubtype::DopamineD4,
        ReceptorSubtype::AdrenergicAlpha1,
        ReceptorSubtype::AdrenergicAlpha2,
        ReceptorSubtype::AdrenergicBeta1,
        ReceptorSubtype::AdrenergicBeta2,
        ReceptorSubtype::GabaA,
        ReceptorSubtype::GabaB,
        ReceptorSubtype::GlutamateNmda,
        ReceptorSubtype::GlutamateAmpa,
        ReceptorSubtype::GlutamateKainate,
        ReceptorSubtype::GlutamateMglur,
        ReceptorSubtype::AcetylcholineNicotinic,
        ReceptorSubtype::AcetylcholineMuscarinic,
        ReceptorSubtype::MuOpioid,
        ReceptorSubtype::Neurokinin1,
        ReceptorSubtype::OxytocinReceptor,
        ReceptorSubtype::HistamineH1,
        ReceptorSubtype::HistamineH3,
        ReceptorSubtype::GlycineReceptor,
        ReceptorSubtype::Other,
    ];

    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptorSubtype::Serotonin5ht1a => "serotonin_5ht1a",
            ReceptorSubtype::Serotonin5ht1b => "serotonin_5ht1b",
            ReceptorSubtype::Serotonin5ht2a => "serotonin_5ht2a",
            ReceptorSubtype::Serotonin5ht2c => "serotonin_5ht2c",
            ReceptorSubtype::Serotonin5ht3 => "serotonin_5ht3",
            ReceptorSubtype::DopamineD1 => "dopamine_d1",
            ReceptorSubtype::DopamineD2 => "dopamine_d2",
            ReceptorSubtype::DopamineD3 => "dopamine_d3",
            ReceptorSubtype::DopamineD4 => "dopamine_d4",
            ReceptorSubtype::AdrenergicAlpha1 => "adrenergic_alpha1",
            ReceptorSubtype::AdrenergicAlpha2 => "adrenergic_alpha2",
            ReceptorSubtype::AdrenergicBeta1 => "adrenergic_beta1",
            ReceptorSubtype::AdrenergicBeta2 => "adrenergic_beta2",
            ReceptorSubtype::GabaA => "gaba_a",
            ReceptorSubtype::GabaB => "gaba_b",
            ReceptorSubtype::GlutamateNmda => "glutamate_nmda",
            ReceptorSubtype::GlutamateAmpa => "glutamate_ampa",
            ReceptorSubtype::GlutamateKainate => "glutamate_kainate",
            ReceptorSubtype::GlutamateMglur => "glutamate_mglur",
            ReceptorSubtype::AcetylcholineNicotinic => "acetylcholine_nicotinic",
            ReceptorSubtype::AcetylcholineMuscarinic => "acetylcholine_muscarinic",
            ReceptorSubtype::MuOpioid => "mu_opioid",
            ReceptorSubtype::Neurokinin1 => "neurokinin_1",
            ReceptorSubtype::OxytocinReceptor => "oxytocin_receptor",
            ReceptorSubtype::HistamineH1 => "histamine_h1",
            ReceptorSubtype::HistamineH3 => "histamine_h3",
            ReceptorSubtype::GlycineReceptor => "glycine_receptor",
            ReceptorSubtype::Other => "other",
        }
    }
}

/// Clinical weight attached to a receptor profile or an activation estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalSignificance {
    None,
    Minimal,
    Mild,
    Moderate,
    Significant,
    Severe,
    Critical,
}

impl ClinicalSignificance {
    /// All levels from least to most significant
    pub const ALL: [ClinicalSignificance; 7] = [
        ClinicalSignificance::None,
        ClinicalSignificance::Minimal,
        ClinicalSignificance::Mild,
        ClinicalSignificance::Moderate,
        ClinicalSignificance::Significant,
        ClinicalSignificance::Severe,
        ClinicalSignificance::Critical,
    ];

    /// Bucket an activation magnitude.
    ///
    /// Boundaries line up with the cascade thresholds: anything the cascade
    /// would filter out (|a| <= 0.05) is `None`, anything at the clamp is
    /// `Critical`.
    pub fn from_activation(activation: f64) -> Self {
        let magnitude = activation.abs();
        if !magnitude.is_finite() {
            return ClinicalSignificance::None;
        }
        if magnitude <= 0.05 {
            ClinicalSignificance::None
        } else if magnitude <= 0.1 {
            ClinicalSignificance::Minimal
        } else if magnitude <= 0.25 {
            ClinicalSignificance::Mild
        } else if magnitude <= 0.5 {
            ClinicalSignificance::Moderate
        } else if magnitude <= 0.75 {
            ClinicalSignificance::Significant
        } else if magnitude < 1.0 {
            ClinicalSignificance::Severe
        } else {
            ClinicalSignificance::Critical
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ClinicalSignificance::None => "No clinically relevant effect",
            ClinicalSignificance::Minimal => "Minimal effect - unlikely to be noticed",
            ClinicalSignificance::Mild => "Mild effect - monitor",
            ClinicalSignificance::Moderate => "Moderate effect - likely symptomatic",
            ClinicalSignificance::Significant => "Significant effect - review treatment",
            ClinicalSignificance::Severe => "Severe effect - clinical attention advised",
            ClinicalSignificance::Critical => "Critical effect - saturated response",
        }
    }

    /// Stable snake_case label
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalSignificance::None => "none",
            ClinicalSignificance::Minimal => "minimal",
            ClinicalSignificance::Mild => "mild",
            ClinicalSignificance::Moderate => "moderate",
            ClinicalSignificance::Significant => "significant",
            ClinicalSignificance::Severe => "severe",
            ClinicalSignificance::Critical => "critical",
        }
    }
}

// Labels are matched case-insensitively; '-' and ' ' are treated as '_'.
fn parse_label<T: Copy>(
    kind: &'static str,
    input: &str,
    all: &[T],
    label: fn(&T) -> &'static str,
) -> Result<T, ValidationError> {
    let normalized: String = input
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    all.iter()
        .copied()
        .find(|item| label(item) == normalized)
        .ok_or_else(|| ValidationError::UnknownVariant {
            kind,
            value: input.to_string(),
        })
}

macro_rules! label_traits {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_label($kind, s, &$ty::ALL, $ty::as_str)
            }
        }
    };
}

label_traits!(BrainRegion, "brain region");
label_traits!(Neurotransmitter, "neurotransmitter");
label_traits!(ReceptorType, "receptor type");
label_traits!(ReceptorSubtype, "receptor subtype");
label_traits!(ClinicalSignificance, "clinical significance");
