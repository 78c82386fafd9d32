pub mod common_types;
pub mod history;

// Registry
pub mod group_individuals;
pub mod groups;
pub mod individual_data_source_uploads;
pub mod individual_data_sources;
pub mod individuals;

// Mutation tracking
pub mod mutation_logs;
pub mod record_mutations;

// Security
pub mod user_rights;
pub mod user_sessions;
pub mod users;

pub use common_types::{EntityKind, GroupRole, MutationStatus, RecipientType, UploadStatus};
pub use history::HistoryEntity;
