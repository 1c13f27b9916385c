//! Mapping persistence seam and per-patient serialized access.
//!
//! [`MappingRepository`] is the interface a persistence layer implements to
//! load and save mappings by patient. [`InMemoryMappingRepository`] is the
//! in-process implementation used by tests and the CLI.
//!
//! [`MappingStore`] sits on top of a repository and hands out exclusive
//! access to one patient's mapping at a time: each patient gets its own
//! lock, so concurrent requests for different patients never contend while
//! requests for the same patient are serialized.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use crate::cascade::CascadeResult;
use crate::defaults::create_default_neurotransmitter_mapping;
use crate::enums::Neurotransmitter;
use crate::error::{NeurotransmitterError, NeurotransmitterResult};
use crate::mapping::NeurotransmitterMapping;

/// Load/save seam for patient mappings
pub trait MappingRepository: Send + Sync {
    /// Load a patient's mapping, `None` when absent
    fn get(&self, patient_id: Uuid) -> NeurotransmitterResult<Option<NeurotransmitterMapping>>;

    /// Store a mapping under its patient id, replacing any previous one
    fn save(&self, mapping: &NeurotransmitterMapping) -> NeurotransmitterResult<()>;

    /// Remove a patient's mapping; returns whether one existed
    fn delete(&self, patient_id: Uuid) -> NeurotransmitterResult<bool>;

    /// Load a mapping, seeding and saving the default one when absent
    fn get_or_create_default(&self, patient_id: Uuid) -> NeurotransmitterResult<NeurotransmitterMapping> {
        if let Some(mapping) = self.get(patient_id)? {
            return Ok(mapping);
        }
        let mapping = create_default_neurotransmitter_mapping(patient_id);
        self.save(&mapping)?;
        Ok(mapping)
    }
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemoryMappingRepository {
    mappings: RwLock<HashMap<Uuid, NeurotransmitterMapping>>,
}

impl InMemoryMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings
    pub fn len(&self) -> usize {
        self.mappings.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MappingRepository for InMemoryMappingRepository {
    fn get(&self, patient_id: Uuid) -> NeurotransmitterResult<Option<NeurotransmitterMapping>> {
        let mappings = self
            .mappings
            .read()
            .map_err(|_| NeurotransmitterError::LockPoisoned(patient_id))?;
        Ok(mappings.get(&patient_id).cloned())
    }

    fn save(&self, mapping: &NeurotransmitterMapping) -> NeurotransmitterResult<()> {
        let patient_id = mapping.patient_id();
        let mut mappings = self
            .mappings
            .write()
            .map_err(|_| NeurotransmitterError::LockPoisoned(patient_id))?;
        mappings.insert(patient_id, mapping.clone());
        tracing::debug!(%patient_id, version = mapping.version(), "Mapping saved");
        Ok(())
    }

    fn delete(&self, patient_id: Uuid) -> NeurotransmitterResult<bool> {
        let mut mappings = self
            .mappings
            .write()
            .map_err(|_| NeurotransmitterError::LockPoisoned(patient_id))?;
        Ok(mappings.remove(&patient_id).is_some())
    }
}

type MappingHandle = Arc<Mutex<NeurotransmitterMapping>>;

/// Per-patient serialized access to mappings backed by a repository.
///
/// A patient's handle lives only while some caller is inside
/// [`with_mapping`](Self::with_mapping) for that patient. The last caller
/// out drops it, so the handle map stays bounded by concurrent patients and
/// every new access starts from the repository's current copy.
pub struct MappingStore<R: MappingRepository> {
    repository: R,
    handles: Mutex<HashMap<Uuid, MappingHandle>>,
}

impl<R: MappingRepository> MappingStore<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Handle for a patient, loading from the repository on first use.
    ///
    /// With `seed_default`, a missing mapping is created from the defaults;
    /// otherwise a missing mapping is `PatientNotFound`.
    fn handle(&self, patient_id: Uuid, seed_default: bool) -> NeurotransmitterResult<MappingHandle> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| NeurotransmitterError::LockPoisoned(patient_id))?;

        if let Some(handle) = handles.get(&patient_id) {
            return Ok(Arc::clone(handle));
        }

        let mapping = if seed_default {
            self.repository.get_or_create_default(patient_id)?
        } else {
            self.repository
                .get(patient_id)?
                .ok_or(NeurotransmitterError::PatientNotFound(patient_id))?
        };

        let handle = Arc::new(Mutex::new(mapping));
        handles.insert(patient_id, Arc::clone(&handle));
        tracing::debug!(%patient_id, "Mapping handle opened");
        Ok(handle)
    }

    fn run<T>(
        &self,
        patient_id: Uuid,
        seed_default: bool,
        f: impl FnOnce(&mut NeurotransmitterMapping) -> T,
    ) -> NeurotransmitterResult<T> {
        let handle = self.handle(patient_id, seed_default)?;
        let outcome = Self::apply(&self.repository, patient_id, &handle, f);
        self.release(patient_id, handle);
        outcome
    }

    fn apply<T>(
        repository: &R,
        patient_id: Uuid,
        handle: &MappingHandle,
        f: impl FnOnce(&mut NeurotransmitterMapping) -> T,
    ) -> NeurotransmitterResult<T> {
        let mut mapping = handle
            .lock()
            .map_err(|_| NeurotransmitterError::LockPoisoned(patient_id))?;

        let before = mapping.version();
        let output = f(&mut mapping);
        if mapping.version() != before {
            repository.save(&mapping)?;
        }
        Ok(output)
    }

    /// Drop the cached handle once no other caller holds it, so idle
    /// patients cost nothing and the next access reloads from the repository.
    fn release(&self, patient_id: Uuid, handle: MappingHandle) {
        let Ok(mut handles) = self.handles.lock() else {
            tracing::warn!(%patient_id, "Handle map poisoned, keeping handle");
            return;
        };
        let idle = handles
            .get(&patient_id)
            .is_some_and(|cached| Arc::ptr_eq(cached, &handle) && Arc::strong_count(&handle) == 2);
        if idle {
            handles.remove(&patient_id);
            tracing::trace!(%patient_id, "Mapping handle released");
        }
    }

    /// Number of patients currently holding a cached handle
    pub fn open_handles(&self) -> usize {
        self.handles.lock().map(|h| h.len()).unwrap_or(0)
    }

    /// Run `f` with exclusive access to a stored patient mapping.
    ///
    /// Changes are written back to the repository when the mapping version
    /// moved.
    pub fn with_mapping<T>(
        &self,
        patient_id: Uuid,
        f: impl FnOnce(&mut NeurotransmitterMapping) -> T,
    ) -> NeurotransmitterResult<T> {
        self.run(patient_id, false, f)
    }

    /// Like [`with_mapping`](Self::with_mapping), seeding the default
    /// mapping for unknown patients
    pub fn with_mapping_or_default<T>(
        &self,
        patient_id: Uuid,
        f: impl FnOnce(&mut NeurotransmitterMapping) -> T,
    ) -> NeurotransmitterResult<T> {
        self.run(patient_id, true, f)
    }

    /// Simulate a cascade on a patient's mapping under its lock
    pub fn simulate_cascade(
        &self,
        patient_id: Uuid,
        initial_changes: &BTreeMap<Neurotransmitter, f64>,
        steps: usize,
    ) -> NeurotransmitterResult<CascadeResult> {
        let result = self.with_mapping(patient_id, |mapping| {
            mapping.simulate_cascade(initial_changes, steps)
        })??;
        Ok(result)
    }

    /// Drop a cached handle even while it is in use; the repository copy
    /// stays
    pub fn evict(&self, patient_id: Uuid) -> NeurotransmitterResult<bool> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| NeurotransmitterError::LockPoisoned(patient_id))?;
        Ok(handles.remove(&patient_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::BrainRegion;
    use std::thread;

    #[test]
    fn test_repository_round_trip() {
        let repo = InMemoryMappingRepository::new();
        let patient_id = Uuid::new_v4();
        assert!(repo.get(patient_id).unwrap().is_none());

        let mapping = create_default_neurotransmitter_mapping(patient_id);
        repo.save(&mapping).unwrap();
        assert_eq!(repo.get(patient_id).unwrap(), Some(mapping));
        assert_eq!(repo.len(), 1);

        assert!(repo.delete(patient_id).unwrap());
        assert!(!repo.delete(patient_id).unwrap());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_get_or_create_default_saves() {
        let repo = InMemoryMappingRepository::new();
        let patient_id = Uuid::new_v4();
        let created = repo.get_or_create_default(patient_id).unwrap();
        assert!(created.profile_count() > 0);
        assert_eq!(repo.get(patient_id).unwrap(), Some(created));
    }

    #[test]
    fn test_unknown_patient_not_found() {
        let store = MappingStore::new(InMemoryMappingRepository::new());
        let patient_id = Uuid::new_v4();
        let err = store.with_mapping(patient_id, |m| m.version()).unwrap_err();
        assert!(matches!(err, NeurotransmitterError::PatientNotFound(id) if id == patient_id));
    }

    #[test]
    fn test_mutations_written_back() {
        let store = MappingStore::new(InMemoryMappingRepository::new());
        let patient_id = Uuid::new_v4();

        store
            .with_mapping_or_default(patient_id, |m| {
                m.set_connection(BrainRegion::Insula, BrainRegion::Amygdala, 0.3)
            })
            .unwrap()
            .unwrap();

        let saved = store.repository().get(patient_id).unwrap().unwrap();
        assert_eq!(saved.version(), 2);
        assert_eq!(
            saved.connections_from(BrainRegion::Insula).collect::<Vec<_>>(),
            vec![(BrainRegion::Amygdala, 0.3)]
        );
    }

    #[test]
    fn test_concurrent_mutations_are_serialized() {
        let store = Arc::new(MappingStore::new(InMemoryMappingRepository::new()));
        let patient_id = Uuid::new_v4();
        store
            .repository()
            .save(&NeurotransmitterMapping::new(patient_id))
            .unwrap();

        let workers: Vec<_> = BrainRegion::ALL
            .iter()
            .map(|&region| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .with_mapping(patient_id, |m| {
                            m.add_production_site(Neurotransmitter::Glutamate, region)
                        })
                        .unwrap()
                })
            })
            .collect();
        for worker in workers {
            assert!(worker.join().unwrap());
        }

        let version = store.with_mapping(patient_id, |m| m.version()).unwrap();
        assert_eq!(version, 1 + BrainRegion::COUNT as u32);
        let saved = store.repository().get(patient_id).unwrap().unwrap();
        assert_eq!(
            saved.get_producing_regions(Neurotransmitter::Glutamate).len(),
            BrainRegion::COUNT
        );
    }

    #[test]
    fn test_store_simulation() {
        let store = MappingStore::new(InMemoryMappingRepository::new());
        let patient_id = Uuid::new_v4();
        store.with_mapping_or_default(patient_id, |_| ()).unwrap();

        let changes: BTreeMap<_, _> = [(Neurotransmitter::Dopamine, 0.4)].into_iter().collect();
        let result = store.simulate_cascade(patient_id, &changes, 3).unwrap();
        assert!(result.contains_key(&BrainRegion::NucleusAccumbens));

        let changes: BTreeMap<_, _> = [(Neurotransmitter::Dopamine, f64::INFINITY)].into_iter().collect();
        let err = store.simulate_cascade(patient_id, &changes, 3).unwrap_err();
        assert!(matches!(err, NeurotransmitterError::Validation(_)));

        assert_eq!(store.open_handles(), 0);
        assert!(!store.evict(patient_id).unwrap());
    }

    #[test]
    fn test_idle_handles_released_and_reloaded() {
        let store = MappingStore::new(InMemoryMappingRepository::new());
        let patients: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
        for &patient_id in &patients {
            store.with_mapping_or_default(patient_id, |_| ()).unwrap();
        }
        assert_eq!(store.open_handles(), 0);
        assert_eq!(store.repository().len(), patients.len());

        // Writes made behind the store are seen on the next access
        let patient_id = patients[0];
        let mut external = store.repository().get(patient_id).unwrap().unwrap();
        assert!(external.add_production_site(Neurotransmitter::Histamine, BrainRegion::Thalamus));
        store.repository().save(&external).unwrap();

        let sites = store
            .with_mapping(patient_id, |m| m.get_producing_regions(Neurotransmitter::Histamine).to_vec())
            .unwrap();
        assert!(sites.contains(&BrainRegion::Thalamus));
    }
}
