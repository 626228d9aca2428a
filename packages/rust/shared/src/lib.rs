//! Shared types, errors, config, and rule tables for serpforge.
//!
//! Every other crate in the workspace depends on this one; it holds the
//! data model that flows through the research pipeline (SERP items, page
//! artifacts, corpus synthesis, blueprints, batch tasks) plus the
//! configuration and error plumbing.

pub mod config;
pub mod error;
pub mod rules;
pub mod types;

pub use config::{
    AppConfig, AssistantConfig, DefaultsConfig, FetchConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_db_path,
};
pub use error::{Result, SerpforgeError};
pub use rules::{DisagreementRule, RuleSet};
pub use types::{
    CalculatorForm, ConsensusFact, CorpusSynthesis, EeatCheck, Entities, EvidenceFact, FactSource,
    FaqEntry, GroupId, GroupStatus, InternalLink, LegalAnchor, PageArtifact,
    RESEARCH_SCHEMA_VERSION, ResearchRecord, SeoBlueprint, SerpItem, Task, TaskStatus,
    reading_time_min,
};
