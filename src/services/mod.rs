pub mod authorization;
pub mod data_source_service;
pub mod export_service;
pub mod group_individual_service;
pub mod group_service;
pub mod individual_service;
pub mod mutation_log_service;
pub mod query;

pub use authorization::AuthorizationService;
pub use data_source_service::{DataSourceQueryArgs, DataSourceService, UploadQueryArgs};
pub use export_service::{ExportOptions, ExportService};
pub use group_individual_service::{
    AddIndividualToGroup, EditGroupIndividual, GroupIndividualQueryArgs, GroupIndividualService,
    NewMembership,
};
pub use group_service::{
    CreateGroup, CreateGroupWithIndividuals, GroupQueryArgs, GroupService, UpdateGroup,
};
pub use individual_service::{
    CreateIndividual, IndividualQueryArgs, IndividualService, UpdateIndividual,
};
pub use mutation_log_service::{MutationLogService, MutationMeta, MutationOutcome, TouchedRecord};
pub use query::{CommonQueryArgs, Page, PageResult};

use crate::errors::{CoreError, CoreResult};

/// Trimmed `value`, or a validation error naming `field` when it is blank.
pub(crate) fn require_text(field: &str, value: &str) -> CoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::invalid_field(field, "must not be empty"));
    }
    Ok(value.to_string())
}
