//! Dataset registry — loads all dataset definitions from embedded TOML.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a dataset means
//! creating a new TOML file and adding it to the list below.

use hazard_map_hazard_models::HazardDataset;

use crate::dataset_def::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    (
        "liquefaction",
        include_str!("../datasets/liquefaction.toml"),
    ),
    ("tsunami", include_str!("../datasets/tsunami.toml")),
    ("soft_story", include_str!("../datasets/soft_story.toml")),
];

/// Returns all configured dataset definitions.
///
/// # Panics
///
/// Panics if an embedded TOML config is invalid; these are compiled into
/// the binary and validated by tests, so a panic here is a build defect.
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(id, raw)| {
            parse_dataset_toml(raw)
                .unwrap_or_else(|e| panic!("embedded dataset config {id:?} is invalid: {e}"))
        })
        .collect()
}

/// Returns the definition feeding a specific dataset, if configured.
#[must_use]
pub fn find_dataset(dataset: HazardDataset) -> Option<DatasetDefinition> {
    all_datasets().into_iter().find(|d| d.dataset == dataset)
}
