//! Neurotransmitter Core - Mental Health Digital Twin Library
//!
//! Per-patient model of where neurotransmitters are produced, how brain
//! regions respond to them through receptor populations, and how a change
//! in neurotransmitter levels cascades across region connectivity.
//!
//! # Features
//!
//! - Receptor profiles with type-dependent response and homeostatic regulation
//! - Region-level response, sensitivity and receptor summaries
//! - Multi-step cascade simulation with decaying confidence
//! - Literature-derived default mapping
//! - JSON persistence and a repository seam with per-patient locking
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use neurotransmitter_core::{create_default_neurotransmitter_mapping, Neurotransmitter};
//! use uuid::Uuid;
//!
//! let mapping = create_default_neurotransmitter_mapping(Uuid::new_v4());
//!
//! let changes: BTreeMap<_, _> = [(Neurotransmitter::Serotonin, 0.3)].into_iter().collect();
//! let result = mapping.simulate_cascade(&changes, 3).unwrap();
//!
//! for (region, activation) in &result {
//!     println!(
//!         "{}: {:.3} ({})",
//!         region,
//!         activation.activation,
//!         activation.clinical_significance().description()
//!     );
//! }
//! ```

pub mod cascade;
pub mod config;
pub mod defaults;
pub mod enums;
pub mod error;
pub mod mapping;
pub mod receptor;
pub mod repository;

// Re-export commonly used types for convenience
pub use cascade::{CascadeResult, CascadeStep, CascadeTrace, RegionActivation};
pub use config::CascadeConfig;
pub use defaults::create_default_neurotransmitter_mapping;
pub use enums::{BrainRegion, ClinicalSignificance, Neurotransmitter, ReceptorSubtype, ReceptorType};
pub use error::{NeurotransmitterError, NeurotransmitterResult, ValidationError};
pub use mapping::{NeurotransmitterEffect, NeurotransmitterMapping, RegionNeurotransmitterProfile};
pub use receptor::ReceptorProfile;
pub use repository::{InMemoryMappingRepository, MappingRepository, MappingStore};
