//! Default neurotransmitter mapping.
//!
//! Seeds a mapping with canonical production sites (raphe serotonin,
//! mesolimbic/nigrostriatal dopamine, coerulean norepinephrine, ...), a
//! curated set of receptor profiles for the regions most discussed in mood
//! and anxiety disorders, and a small hand-authored connectivity graph.
//!
//! The values are coarse literature-informed priors for a digital twin, not
//! measurements. Per-patient calibration replaces them via
//! `add_receptor_profile` and `set_connection`.

use uuid::Uuid;

use crate::enums::{
    BrainRegion as R, ClinicalSignificance as C, Neurotransmitter as N, ReceptorSubtype as S,
    ReceptorType as T,
};
use crate::mapping::NeurotransmitterMapping;
use crate::receptor::{ReceptorProfile, DEFAULT_REGULATION_POTENTIAL};

const PRODUCTION_SITES: &[(N, R)] = &[
    (N::Serotonin, R::RapheNuclei),
    (N::Dopamine, R::VentralTegmentalArea),
    (N::Dopamine, R::SubstantiaNigra),
    (N::Norepinephrine, R::LocusCoeruleus),
    (N::Acetylcholine, R::BasalForebrain),
    (N::Acetylcholine, R::Brainstem),
    (N::Gaba, R::Striatum),
    (N::Gaba, R::PrefrontalCortex),
    (N::Gaba, R::Hippocampus),
    (N::Gaba, R::Cerebellum),
    (N::Glutamate, R::PrefrontalCortex),
    (N::Glutamate, R::Hippocampus),
    (N::Glutamate, R::Thalamus),
    (N::Histamine, R::Hypothalamus),
    (N::Oxytocin, R::Hypothalamus),
    (N::Endorphins, R::Hypothalamus),
    (N::Glycine, R::Brainstem),
];

// (region, neurotransmitter, type, subtype, density, sensitivity, relevance)
const RECEPTOR_PROFILES: &[(R, N, T, S, f64, f64, C)] = &[
    // Serotonin
    (R::PrefrontalCortex, N::Serotonin, T::Inhibitory, S::Serotonin5ht1a, 0.7, 1.0, C::Significant),
    (R::AnteriorCingulateCortex, N::Serotonin, T::Modulatory, S::Serotonin5ht2a, 0.5, 1.0, C::Moderate),
    (R::Amygdala, N::Serotonin, T::Excitatory, S::Serotonin5ht2a, 0.6, 1.1, C::Significant),
    (R::Hippocampus, N::Serotonin, T::Inhibitory, S::Serotonin5ht1a, 0.8, 1.0, C::Moderate),
    (R::Hypothalamus, N::Serotonin, T::Modulatory, S::Serotonin5ht2c, 0.5, 1.0, C::Mild),
    // Dopamine
    (R::PrefrontalCortex, N::Dopamine, T::Excitatory, S::DopamineD1, 0.5, 1.0, C::Moderate),
    (R::NucleusAccumbens, N::Dopamine, T::Excitatory, S::DopamineD1, 0.9, 1.2, C::Significant),
    (R::Striatum, N::Dopamine, T::Inhibitory, S::DopamineD2, 0.9, 1.0, C::Significant),
    (R::Amygdala, N::Dopamine, T::Modulatory, S::DopamineD2, 0.4, 0.9, C::Mild),
    // Norepinephrine
    (R::PrefrontalCortex, N::Norepinephrine, T::Modulatory, S::AdrenergicAlpha2, 0.6, 1.0, C::Moderate),
    (R::Amygdala, N::Norepinephrine, T::Excitatory, S::AdrenergicBeta1, 0.7, 1.2, C::Significant),
    (R::Hippocampus, N::Norepinephrine, T::Excitatory, S::AdrenergicBeta2, 0.5, 1.0, C::Mild),
    // GABA
    (R::PrefrontalCortex, N::Gaba, T::Inhibitory, S::GabaA, 0.7, 1.0, C::Moderate),
    (R::Amygdala, N::Gaba, T::Inhibitory, S::GabaA, 0.8, 1.0, C::Significant),
    (R::Hippocampus, N::Gaba, T::Inhibitory, S::GabaA, 0.7, 1.0, C::Moderate),
    (R::Thalamus, N::Gaba, T::Inhibitory, S::GabaB, 0.6, 1.0, C::Mild),
    // Glutamate
    (R::PrefrontalCortex, N::Glutamate, T::Excitatory, S::GlutamateNmda, 0.8, 1.0, C::Significant),
    (R::Hippocampus, N::Glutamate, T::Excitatory, S::GlutamateNmda, 0.9, 1.1, C::Significant),
    (R::Amygdala, N::Glutamate, T::Excitatory, S::GlutamateAmpa, 0.7, 1.0, C::Moderate),
    (R::Thalamus, N::Glutamate, T::Excitatory, S::GlutamateAmpa, 0.7, 1.0, C::Mild),
    // Acetylcholine
    (R::PrefrontalCortex, N::Acetylcholine, T::Excitatory, S::AcetylcholineNicotinic, 0.5, 1.0, C::Mild),
    (R::Hippocampus, N::Acetylcholine, T::Modulatory, S::AcetylcholineMuscarinic, 0.6, 1.0, C::Moderate),
    // Neuropeptides and others
    (R::Hypothalamus, N::Histamine, T::Excitatory, S::HistamineH1, 0.6, 1.0, C::Mild),
    (R::Amygdala, N::Oxytocin, T::Inhibitory, S::OxytocinReceptor, 0.5, 1.0, C::Mild),
    (R::NucleusAccumbens, N::Endorphins, T::Modulatory, S::MuOpioid, 0.6, 1.0, C::Moderate),
];

// Receptors with marked adaptation under sustained exposure:
// (region, neurotransmitter, upregulation, downregulation)
const REGULATION_OVERRIDES: &[(R, N, f64, f64)] = &[
    (R::PrefrontalCortex, N::Serotonin, 0.1, 0.2),
    (R::Hippocampus, N::Serotonin, 0.1, 0.2),
    (R::NucleusAccumbens, N::Dopamine, 0.15, 0.25),
    (R::Striatum, N::Dopamine, 0.15, 0.2),
    (R::Amygdala, N::Gaba, 0.1, 0.3),
];

const CONNECTIVITY: &[(R, R, f64)] = &[
    // Monoamine projections
    (R::RapheNuclei, R::PrefrontalCortex, 0.6),
    (R::RapheNuclei, R::Amygdala, 0.5),
    (R::RapheNuclei, R::Hippocampus, 0.5),
    (R::RapheNuclei, R::Hypothalamus, 0.4),
    (R::VentralTegmentalArea, R::NucleusAccumbens, 0.8),
    (R::VentralTegmentalArea, R::PrefrontalCortex, 0.6),
    (R::VentralTegmentalArea, R::Amygdala, 0.4),
    (R::SubstantiaNigra, R::Striatum, 0.9),
    (R::LocusCoeruleus, R::PrefrontalCortex, 0.5),
    (R::LocusCoeruleus, R::Amygdala, 0.6),
    (R::LocusCoeruleus, R::Hippocampus, 0.4),
    (R::LocusCoeruleus, R::Thalamus, 0.4),
    (R::BasalForebrain, R::Hippocampus, 0.5),
    (R::BasalForebrain, R::PrefrontalCortex, 0.4),
    // Cortical and limbic circuitry
    (R::PrefrontalCortex, R::Amygdala, 0.6),
    (R::PrefrontalCortex, R::NucleusAccumbens, 0.5),
    (R::PrefrontalCortex, R::Striatum, 0.5),
    (R::PrefrontalCortex, R::AnteriorCingulateCortex, 0.5),
    (R::AnteriorCingulateCortex, R::Amygdala, 0.4),
    (R::AnteriorCingulateCortex, R::PrefrontalCortex, 0.4),
    (R::Amygdala, R::Hypothalamus, 0.7),
    (R::Amygdala, R::Hippocampus, 0.5),
    (R::Amygdala, R::PrefrontalCortex, 0.3),
    (R::Amygdala, R::LocusCoeruleus, 0.4),
    (R::Hippocampus, R::PrefrontalCortex, 0.5),
    (R::Hippocampus, R::Amygdala, 0.4),
    (R::Hippocampus, R::Hypothalamus, 0.3),
    (R::Thalamus, R::PrefrontalCortex, 0.6),
    (R::Thalamus, R::AnteriorCingulateCortex, 0.4),
    (R::NucleusAccumbens, R::VentralTegmentalArea, 0.3),
    (R::Striatum, R::Thalamus, 0.4),
    (R::Hypothalamus, R::Brainstem, 0.4),
];

/// Build the default mapping for a patient.
///
/// The seeded mapping starts at version 1, like an empty one.
pub fn create_default_neurotransmitter_mapping(patient_id: Uuid) -> NeurotransmitterMapping {
    let mut mapping = NeurotransmitterMapping::new(patient_id);

    for &(nt, region) in PRODUCTION_SITES {
        mapping.add_production_site(nt, region);
    }

    for &(region, nt, receptor_type, subtype, density, sensitivity, relevance) in RECEPTOR_PROFILES {
        let (upregulation, downregulation) = REGULATION_OVERRIDES
            .iter()
            .find(|(r, n, _, _)| *r == region && *n == nt)
            .map(|&(_, _, up, down)| (up, down))
            .unwrap_or((DEFAULT_REGULATION_POTENTIAL, DEFAULT_REGULATION_POTENTIAL));

        let profile = ReceptorProfile {
            brain_region: region,
            neurotransmitter: nt,
            receptor_type,
            receptor_subtype: subtype,
            density,
            sensitivity,
            clinical_relevance: Some(relevance),
            upregulation_potential: upregulation,
            downregulation_potential: downregulation,
        };
        mapping.receptor_profiles.insert(profile.key(), profile);
    }

    for &(source, target, weight) in CONNECTIVITY {
        mapping
            .brain_region_connectivity
            .entry(source)
            .or_default()
            .insert(target, weight);
    }

    mapping.version = 1;

    tracing::debug!(
        %patient_id,
        profiles = mapping.profile_count(),
        edges = CONNECTIVITY.len(),
        "Default neurotransmitter mapping created"
    );
    mapping
}

impl NeurotransmitterMapping {
    /// Shorthand for [`create_default_neurotransmitter_mapping`]
    pub fn with_defaults(patient_id: Uuid) -> Self {
        create_default_neurotransmitter_mapping(patient_id)
    }
}
