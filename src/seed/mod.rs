//! Generator seeds: selection, registration, validation and generation

pub mod generator;
pub mod loader;
pub mod params;
pub mod registry;
pub mod selected_repo;

pub use generator::{resolve_parameters, Generated, NoPrompt, ParameterPrompt, UniversalGenerator, UNIVERSAL_GENERATOR};
pub use loader::{DirectoryLoader, GitCloneLoader, ProjectLoader};
pub use params::{
    drop_down_seed_options, is_valid_sha1, shorten, DropDownOption, SeedDrivenCommandParams, SeedError,
};
pub use registry::{select_seed, selected_repo_attachments, validate_seed, PreferencesSeedSource, SeedRegistry};
pub use selected_repo::{default_seeds, GitUrl, SelectedRepo, SelectedRepoSource, StaticSeedSource};
