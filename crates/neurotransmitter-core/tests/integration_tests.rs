//! Integration tests for Neurotransmitter Core
//!
//! Tests combining multiple modules: receptor response + mapping queries,
//! default mapping + cascade, persistence + simulation.

use neurotransmitter_core::{
    create_default_neurotransmitter_mapping, BrainRegion, CascadeConfig, InMemoryMappingRepository,
    MappingRepository, MappingStore, Neurotransmitter, NeurotransmitterError,
    NeurotransmitterMapping, ReceptorProfile, ReceptorSubtype, ReceptorType, ValidationError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

fn changes(entries: &[(Neurotransmitter, f64)]) -> BTreeMap<Neurotransmitter, f64> {
    entries.iter().copied().collect()
}

fn profile(
    region: BrainRegion,
    nt: Neurotransmitter,
    receptor_type: ReceptorType,
    density: f64,
    sensitivity: f64,
) -> ReceptorProfile {
    ReceptorProfile::new(region, nt, receptor_type, ReceptorSubtype::Other, density, sensitivity)
        .unwrap()
}

/// Regions that may legitimately carry activation after a cascade: direct
/// targets of a produced, changed neurotransmitter, plus any edge target.
fn reachable_regions(
    mapping: &NeurotransmitterMapping,
    initial: &BTreeMap<Neurotransmitter, f64>,
) -> BTreeSet<BrainRegion> {
    let mut reachable = BTreeSet::new();
    for nt in initial.keys() {
        if mapping.get_producing_regions(*nt).is_empty() {
            continue;
        }
        for p in mapping.get_receptor_profiles_for_neurotransmitter(*nt) {
            reachable.insert(p.brain_region);
        }
    }
    for targets in mapping.brain_region_connectivity().values() {
        reachable.extend(targets.keys().copied());
    }
    reachable
}

// =============================================================================
// Reference Scenario
// =============================================================================

mod reference_scenario {
    use super::*;

    fn scenario_mapping() -> NeurotransmitterMapping {
        let mut mapping = NeurotransmitterMapping::new(Uuid::new_v4());
        mapping
            .add_receptor_profile(profile(
                BrainRegion::PrefrontalCortex,
                Neurotransmitter::Serotonin,
                ReceptorType::Excitatory,
                0.6,
                0.8,
            ))
            .unwrap();
        mapping.add_production_site(Neurotransmitter::Serotonin, BrainRegion::RapheNuclei);
        mapping
            .set_connection(BrainRegion::RapheNuclei, BrainRegion::PrefrontalCortex, 0.5)
            .unwrap();
        mapping
    }

    #[test]
    fn test_single_profile_cascade() {
        let mapping = scenario_mapping();
        let result = mapping
            .simulate_cascade(&changes(&[(Neurotransmitter::Serotonin, 0.3)]), 2)
            .unwrap();

        assert_eq!(result.len(), 1);
        let pfc = result[&BrainRegion::PrefrontalCortex];
        assert!((pfc.activation - 0.384).abs() < 1e-9);
        assert!((pfc.confidence - 0.7).abs() < 1e-12);
        assert!(!result.contains_key(&BrainRegion::RapheNuclei));

        println!("Reference scenario: {:?}", result);
    }

    #[test]
    fn test_unproduced_neurotransmitter_has_no_direct_effect() {
        let mut mapping = NeurotransmitterMapping::new(Uuid::new_v4());
        mapping
            .add_receptor_profile(profile(
                BrainRegion::Amygdala,
                Neurotransmitter::Oxytocin,
                ReceptorType::Excitatory,
                1.0,
                1.0,
            ))
            .unwrap();
        let result = mapping
            .simulate_cascade(&changes(&[(Neurotransmitter::Oxytocin, 0.5)]), 3)
            .unwrap();
        assert!(result.is_empty());

        // One-hop effects do not gate on production sites
        let effects = mapping.get_neurotransmitter_effects(Neurotransmitter::Oxytocin, 0.5);
        assert!((effects[&BrainRegion::Amygdala].effect - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs_are_not_errors() {
        let empty = NeurotransmitterMapping::new(Uuid::new_v4());
        assert!(empty.simulate_cascade(&BTreeMap::new(), 3).unwrap().is_empty());
        assert!(empty
            .simulate_cascade(&changes(&[(Neurotransmitter::Dopamine, 0.4)]), 0)
            .unwrap()
            .is_empty());
        assert!(empty
            .get_neurotransmitter_effects(Neurotransmitter::Dopamine, 0.4)
            .is_empty());
        assert_eq!(
            empty.calculate_region_response(BrainRegion::Insula, Neurotransmitter::Gaba, 0.9),
            (0.0, 0.0)
        );
        assert!(empty
            .get_brain_region_neurotransmitter_profile(BrainRegion::Insula)
            .is_empty());
    }
}

// =============================================================================
// Mapping Semantics
// =============================================================================

mod mapping_semantics {
    use super::*;

    #[test]
    fn test_profile_replacement_last_write_wins() {
        let mut mapping = NeurotransmitterMapping::new(Uuid::new_v4());
        let first = profile(
            BrainRegion::Hippocampus,
            Neurotransmitter::Glutamate,
            ReceptorType::Excitatory,
            0.4,
            1.0,
        );
        let second = profile(
            BrainRegion::Hippocampus,
            Neurotransmitter::Glutamate,
            ReceptorType::Modulatory,
            0.9,
            1.5,
        );

        assert!(mapping.add_receptor_profile(first.clone()).unwrap().is_none());
        assert_eq!(mapping.add_receptor_profile(second.clone()).unwrap(), Some(first));

        let stored =
            mapping.get_receptor_profiles(BrainRegion::Hippocampus, Neurotransmitter::Glutamate);
        assert_eq!(stored, vec![&second]);
        assert_eq!(mapping.profile_count(), 1);
    }

    #[test]
    fn test_region_profile_reports_stored_sensitivity() {
        let mut mapping = NeurotransmitterMapping::new(Uuid::new_v4());
        let settings = [
            (Neurotransmitter::Serotonin, 0.35),
            (Neurotransmitter::Dopamine, 1.25),
            (Neurotransmitter::Gaba, 1.9),
        ];
        for (nt, sensitivity) in settings {
            mapping
                .add_receptor_profile(profile(
                    BrainRegion::Striatum,
                    nt,
                    ReceptorType::Modulatory,
                    0.5,
                    sensitivity,
                ))
                .unwrap();
        }

        let summary = mapping.get_brain_region_neurotransmitter_profile(BrainRegion::Striatum);
        assert_eq!(summary.len(), settings.len());
        for (nt, sensitivity) in settings {
            assert_eq!(summary[&nt].sensitivity, sensitivity);
            assert_eq!(
                mapping.calculate_region_sensitivity(BrainRegion::Striatum, nt),
                sensitivity
            );
        }
    }

    #[test]
    fn test_sustained_exposure_changes_cascade() {
        let mut mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        let input = changes(&[(Neurotransmitter::Dopamine, 0.3)]);
        let before = mapping.simulate_cascade(&input, 1).unwrap();

        let version = mapping.version();
        let adjusted = mapping.apply_sustained_exposure(Neurotransmitter::Dopamine, 0.9, 2.0);
        assert!(adjusted > 0);
        assert!(mapping.version() > version);

        let after = mapping.simulate_cascade(&input, 1).unwrap();
        let nacc_before = before[&BrainRegion::NucleusAccumbens].activation.abs();
        let nacc_after = after
            .get(&BrainRegion::NucleusAccumbens)
            .map(|a| a.activation.abs())
            .unwrap_or(0.0);
        assert!(nacc_after < nacc_before, "{nacc_after} !< {nacc_before}");
    }

    #[test]
    fn test_connection_weight_validated() {
        let mut mapping = NeurotransmitterMapping::new(Uuid::new_v4());
        let err = mapping
            .set_connection(BrainRegion::Thalamus, BrainRegion::Insula, 1.5)
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert_eq!(mapping.version(), 1);
    }
}

// =============================================================================
// Default Mapping + Cascade
// =============================================================================

mod default_cascade {
    use super::*;

    #[test]
    fn test_all_changes_stay_bounded() {
        let mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        let input: BTreeMap<_, _> = Neurotransmitter::ALL.iter().map(|nt| (*nt, 0.5)).collect();

        for steps in [0, 1, 3, 10, 50] {
            let result = mapping.simulate_cascade(&input, steps).unwrap();
            for (region, a) in &result {
                assert!(a.activation.abs() <= 1.0, "{region}: {}", a.activation);
                assert!(a.activation.abs() > 0.05, "{region}: {}", a.activation);
                assert!((0.0..=1.0).contains(&a.confidence));
            }
            println!("steps={steps}: {} regions affected", result.len());
        }
    }

    #[test]
    fn test_trace_matches_result() {
        let mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        let input = changes(&[
            (Neurotransmitter::Serotonin, 0.2),
            (Neurotransmitter::Norepinephrine, 0.3),
        ]);
        let config = CascadeConfig::default();

        let trace = mapping.simulate_cascade_traced(&input, 4, &config).unwrap();
        let plain = mapping.simulate_cascade_with(&input, 4, &config).unwrap();

        assert_eq!(trace.result, plain);
        assert_eq!(
            trace.steps.iter().map(|s| s.step).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_step_ceiling() {
        let mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        let input = changes(&[(Neurotransmitter::Gaba, 0.2)]);
        let config = CascadeConfig::default().with_max_steps(8);

        assert!(mapping.simulate_cascade_with(&input, 8, &config).is_ok());
        let err = mapping.simulate_cascade_with(&input, 9, &config).unwrap_err();
        assert!(matches!(err, ValidationError::StepsOutOfRange { steps: 9, max: 8 }));
    }

    #[test]
    fn test_non_finite_profile_never_reaches_cascade() {
        let mut mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        let mut bad = profile(
            BrainRegion::Amygdala,
            Neurotransmitter::Dopamine,
            ReceptorType::Excitatory,
            0.5,
            1.0,
        );
        bad.sensitivity = f64::NAN;
        assert!(mapping.add_receptor_profile(bad).is_err());

        let input = changes(&[
            (Neurotransmitter::Serotonin, 0.3),
            (Neurotransmitter::Dopamine, 0.3),
        ]);
        assert!(mapping.simulate_cascade(&input, 3).is_ok());

        // Raw serde skips validation; the cascade must still refuse the mapping
        let mut value = serde_json::to_value(&mapping).unwrap();
        for p in value["receptor_profiles"].as_array_mut().unwrap() {
            if p["brain_region"] == "amygdala" && p["neurotransmitter"] == "dopamine" {
                p["density"] = serde_json::json!(3.0);
            }
        }
        let tampered: NeurotransmitterMapping = serde_json::from_value(value).unwrap();
        let err = tampered.simulate_cascade(&input, 3).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "density", .. }));
    }

    #[test]
    fn test_non_finite_change_rejected() {
        let mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        let err = mapping
            .simulate_cascade(&changes(&[(Neurotransmitter::Serotonin, f64::NAN)]), 3)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { .. }));
    }
}

// =============================================================================
// Persistence + Simulation
// =============================================================================

mod persistence {
    use super::*;

    #[test]
    fn test_json_round_trip_preserves_simulation() {
        let mut mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
        mapping.apply_sustained_exposure(Neurotransmitter::Serotonin, 0.1, 1.5);

        let json = mapping.to_json().unwrap();
        let restored = NeurotransmitterMapping::from_json(&json).unwrap();
        assert_eq!(restored, mapping);

        let input = changes(&[
            (Neurotransmitter::Serotonin, 0.3),
            (Neurotransmitter::Dopamine, -0.25),
        ]);
        assert_eq!(
            restored.simulate_cascade(&input, 5).unwrap(),
            mapping.simulate_cascade(&input, 5).unwrap()
        );
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = NeurotransmitterMapping::from_json("{\"patient_id\": 7}").unwrap_err();
        assert!(matches!(err, NeurotransmitterError::Serialization(_)));
    }

    #[test]
    fn test_patients_are_isolated() {
        let store = Arc::new(MappingStore::new(InMemoryMappingRepository::new()));
        let patients: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        let workers: Vec<_> = patients
            .iter()
            .enumerate()
            .map(|(i, &patient_id)| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .with_mapping_or_default(patient_id, |m| {
                            for _ in 0..=i {
                                m.apply_sustained_exposure(Neurotransmitter::Gaba, 0.9, 1.0);
                            }
                        })
                        .unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let repo = store.repository();
        for (i, patient_id) in patients.iter().enumerate() {
            let saved = repo.get(*patient_id).unwrap().unwrap();
            assert_eq!(saved.patient_id(), *patient_id);
            assert_eq!(saved.version(), 2 + i as u32);
        }
    }
}

// =============================================================================
// Property Tests
// =============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::sample::select;

    fn receptor_type() -> impl Strategy<Value = ReceptorType> {
        select(ReceptorType::ALL.to_vec())
    }

    fn region() -> impl Strategy<Value = BrainRegion> {
        select(BrainRegion::ALL.to_vec())
    }

    fn neurotransmitter() -> impl Strategy<Value = Neurotransmitter> {
        select(Neurotransmitter::ALL.to_vec())
    }

    fn receptor_profile() -> impl Strategy<Value = ReceptorProfile> {
        (
            region(),
            neurotransmitter(),
            receptor_type(),
            0.0..=1.0f64,
            0.1..=2.0f64,
        )
            .prop_map(|(r, nt, t, density, sensitivity)| profile(r, nt, t, density, sensitivity))
    }

    fn initial_changes() -> impl Strategy<Value = BTreeMap<Neurotransmitter, f64>> {
        proptest::collection::btree_map(neurotransmitter(), -1.0..=1.0f64, 0..5)
    }

    fn random_mapping() -> impl Strategy<Value = NeurotransmitterMapping> {
        (
            proptest::collection::vec(receptor_profile(), 0..30),
            proptest::collection::vec((neurotransmitter(), region()), 0..10),
            proptest::collection::vec((region(), region(), 0.0..=1.0f64), 0..40),
        )
            .prop_map(|(profiles, sites, edges)| {
                let mut mapping = NeurotransmitterMapping::new(Uuid::nil());
                for p in profiles {
                    mapping.add_receptor_profile(p).unwrap();
                }
                for (nt, r) in sites {
                    mapping.add_production_site(nt, r);
                }
                for (source, target, weight) in edges {
                    mapping.set_connection(source, target, weight).unwrap();
                }
                mapping
            })
    }

    proptest! {
        #[test]
        fn response_is_bounded(p in receptor_profile(), level in -1.0e6..1.0e6f64) {
            let response = p.calculate_response(level);
            prop_assert!((-1.0..=1.0).contains(&response));
        }

        #[test]
        fn zero_density_is_silent(mut p in receptor_profile(), level in proptest::num::f64::ANY) {
            p.density = 0.0;
            prop_assert_eq!(p.calculate_response(level), 0.0);
        }

        #[test]
        fn regulation_stays_clamped(
            mut p in receptor_profile(),
            updates in proptest::collection::vec((-1.0..2.0f64, 0.0..10.0f64), 1..50),
        ) {
            for (level, duration) in updates {
                p.update_regulation(level, duration);
                prop_assert!((0.1..=2.0).contains(&p.sensitivity), "{}", p.sensitivity);
            }
        }

        #[test]
        fn cascade_is_clamped_and_filtered(
            mapping in random_mapping(),
            input in initial_changes(),
            steps in 0usize..12,
        ) {
            let result = mapping.simulate_cascade(&input, steps).unwrap();
            for a in result.values() {
                prop_assert!(a.activation.abs() <= 1.0);
                prop_assert!(a.activation.abs() > 0.05);
                prop_assert!((0.0..=1.0).contains(&a.confidence));
            }
        }

        #[test]
        fn cascade_is_deterministic(
            mapping in random_mapping(),
            input in initial_changes(),
            steps in 0usize..8,
        ) {
            let first = mapping.simulate_cascade(&input, steps).unwrap();
            let second = mapping.clone().simulate_cascade(&input, steps).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn unconnected_regions_stay_isolated(
            mapping in random_mapping(),
            input in initial_changes(),
            steps in 0usize..8,
        ) {
            let reachable = reachable_regions(&mapping, &input);
            let result = mapping.simulate_cascade(&input, steps).unwrap();
            for region in result.keys() {
                prop_assert!(reachable.contains(region), "{} activated without a path", region);
            }
        }

        #[test]
        fn at_most_one_profile_per_key(profiles in proptest::collection::vec(receptor_profile(), 0..60)) {
            let mut mapping = NeurotransmitterMapping::new(Uuid::nil());
            let mut last = BTreeMap::new();
            for p in profiles {
                last.insert(p.key(), p.clone());
                mapping.add_receptor_profile(p).unwrap();
            }
            prop_assert_eq!(mapping.profile_count(), last.len());
            for (key, expected) in &last {
                prop_assert_eq!(mapping.get_receptor_profile(key.0, key.1), Some(expected));
            }
        }
    }
}
