use async_graphql::*;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::check_permissions;
use crate::database::entities::{GroupRole, UploadStatus};
use crate::filters::ValidityArgs;
use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::{core_error_to_graphql_error, StructuredError};
use crate::graphql::types::{
    paginate, CustomFilterDefinition, Group, GroupIndividual, Individual, IndividualDataSource,
    IndividualDataSourceUpload, MutationLog, RegistryConnection,
};
use crate::services::{
    CommonQueryArgs, DataSourceQueryArgs, ExportOptions, GroupIndividualQueryArgs,
    GroupQueryArgs, IndividualQueryArgs, UploadQueryArgs,
};

pub struct Query;

fn common_args(
    order_by: Option<Vec<String>>,
    apply_default_validity_filter: Option<bool>,
    date_valid_from_gte: Option<DateTime<Utc>>,
    date_valid_to_lte: Option<DateTime<Utc>>,
    client_mutation_id: Option<String>,
) -> CommonQueryArgs {
    CommonQueryArgs {
        validity: ValidityArgs {
            apply_default_validity_filter: apply_default_validity_filter.unwrap_or(false),
            date_valid_from_gte,
            date_valid_to_lte,
        },
        client_mutation_id: client_mutation_id.filter(|id| !id.is_empty()),
        order_by: order_by.unwrap_or_default(),
    }
}

fn parse_uuid(field: &str, value: Option<String>) -> Result<Option<Uuid>> {
    match value {
        Some(value) if !value.is_empty() => Uuid::parse_str(&value)
            .map(Some)
            .map_err(|_| StructuredError::validation(field, format!("'{}' is not a UUID", value))),
        _ => Ok(None),
    }
}

fn export_options(fields: Option<Vec<String>>, fields_columns: Option<String>) -> ExportOptions {
    ExportOptions {
        fields: fields.unwrap_or_default(),
        fields_columns,
    }
}

#[Object]
impl Query {
    /// Individuals, newest first unless `orderBy` says otherwise.
    #[allow(clippy::too_many_arguments)]
    async fn individual(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "groupId")] group_id: Option<String>,
        #[graphql(name = "customFilters")] custom_filters: Option<Vec<String>>,
        #[graphql(name = "firstName_Icontains")] first_name_icontains: Option<String>,
        #[graphql(name = "lastName_Icontains")] last_name_icontains: Option<String>,
        #[graphql(name = "dob_Gte")] dob_gte: Option<NaiveDate>,
        #[graphql(name = "dob_Lte")] dob_lte: Option<NaiveDate>,
        #[graphql(name = "isDeleted")] is_deleted: Option<bool>,
    ) -> Result<RegistryConnection<Individual>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = IndividualQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            group_id: parse_uuid("groupId", group_id)?,
            custom_filters: custom_filters.unwrap_or_default(),
            first_name_icontains,
            last_name_icontains,
            dob_gte,
            dob_lte,
            is_deleted,
        };

        paginate(after, before, first, last, |page| {
            context.individuals.query(&actor, &args, page)
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn individual_data_source(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "upload_Id")] upload_id: Option<Uuid>,
        #[graphql(name = "individual_Id")] individual_id: Option<Uuid>,
    ) -> Result<RegistryConnection<IndividualDataSource>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = DataSourceQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            upload_id,
            individual_id,
        };

        paginate(after, before, first, last, |page| {
            context.data_sources.query_sources(&actor, &args, page)
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn individual_data_source_upload(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        status: Option<UploadStatus>,
        #[graphql(name = "sourceName_Icontains")] source_name_icontains: Option<String>,
    ) -> Result<RegistryConnection<IndividualDataSourceUpload>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = UploadQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            status,
            source_name_icontains,
        };

        paginate(after, before, first, last, |page| {
            context.data_sources.query_uploads(&actor, &args, page)
        })
        .await
    }

    /// Groups; `first_name` and `last_name` match any active member.
    #[allow(clippy::too_many_arguments)]
    async fn group(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "first_name")] first_name: Option<String>,
        #[graphql(name = "last_name")] last_name: Option<String>,
        #[graphql(name = "code_Icontains")] code_icontains: Option<String>,
        #[graphql(name = "isDeleted")] is_deleted: Option<bool>,
        #[graphql(name = "customFilters")] custom_filters: Option<Vec<String>>,
    ) -> Result<RegistryConnection<Group>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = GroupQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            first_name,
            last_name,
            code_icontains,
            is_deleted,
            custom_filters: custom_filters.unwrap_or_default(),
        };

        paginate(after, before, first, last, |page| {
            context.groups.query(&actor, &args, page)
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn group_individual(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "group_Id")] group_id: Option<Uuid>,
        #[graphql(name = "individual_Id")] individual_id: Option<Uuid>,
        role: Option<GroupRole>,
        #[graphql(name = "isDeleted")] is_deleted: Option<bool>,
    ) -> Result<RegistryConnection<GroupIndividual>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = GroupIndividualQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            group_id,
            individual_id,
            role,
            is_deleted,
        };

        paginate(after, before, first, last, |page| {
            context.memberships.query(&actor, &args, page)
        })
        .await
    }

    /// CSV export of the `individual` query.
    #[allow(clippy::too_many_arguments)]
    async fn individual_export(
        &self,
        ctx: &Context<'_>,
        fields: Option<Vec<String>>,
        #[graphql(name = "fieldsColumns")] fields_columns: Option<String>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "groupId")] group_id: Option<String>,
        #[graphql(name = "customFilters")] custom_filters: Option<Vec<String>>,
        #[graphql(name = "firstName_Icontains")] first_name_icontains: Option<String>,
        #[graphql(name = "lastName_Icontains")] last_name_icontains: Option<String>,
        #[graphql(name = "dob_Gte")] dob_gte: Option<NaiveDate>,
        #[graphql(name = "dob_Lte")] dob_lte: Option<NaiveDate>,
        #[graphql(name = "isDeleted")] is_deleted: Option<bool>,
    ) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = IndividualQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            group_id: parse_uuid("groupId", group_id)?,
            custom_filters: custom_filters.unwrap_or_default(),
            first_name_icontains,
            last_name_icontains,
            dob_gte,
            dob_lte,
            is_deleted,
        };

        context
            .exports
            .export_individuals(&actor, &args, &export_options(fields, fields_columns))
            .await
            .map_err(core_error_to_graphql_error)
    }

    /// CSV export of the `group` query.
    #[allow(clippy::too_many_arguments)]
    async fn group_export(
        &self,
        ctx: &Context<'_>,
        fields: Option<Vec<String>>,
        #[graphql(name = "fieldsColumns")] fields_columns: Option<String>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "first_name")] first_name: Option<String>,
        #[graphql(name = "last_name")] last_name: Option<String>,
        #[graphql(name = "code_Icontains")] code_icontains: Option<String>,
        #[graphql(name = "isDeleted")] is_deleted: Option<bool>,
        #[graphql(name = "customFilters")] custom_filters: Option<Vec<String>>,
    ) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = GroupQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            first_name,
            last_name,
            code_icontains,
            is_deleted,
            custom_filters: custom_filters.unwrap_or_default(),
        };

        context
            .exports
            .export_groups(&actor, &args, &export_options(fields, fields_columns))
            .await
            .map_err(core_error_to_graphql_error)
    }

    /// CSV export of the `groupIndividual` query.
    #[allow(clippy::too_many_arguments)]
    async fn group_individual_export(
        &self,
        ctx: &Context<'_>,
        fields: Option<Vec<String>>,
        #[graphql(name = "fieldsColumns")] fields_columns: Option<String>,
        #[graphql(name = "orderBy")] order_by: Option<Vec<String>>,
        #[graphql(name = "applyDefaultValidityFilter")] apply_default_validity_filter: Option<
            bool,
        >,
        #[graphql(name = "dateValidFrom__Gte")] date_valid_from_gte: Option<DateTime<Utc>>,
        #[graphql(name = "dateValidTo__Lte")] date_valid_to_lte: Option<DateTime<Utc>>,
        #[graphql(name = "client_mutation_id")] client_mutation_id: Option<String>,
        #[graphql(name = "group_Id")] group_id: Option<Uuid>,
        #[graphql(name = "individual_Id")] individual_id: Option<Uuid>,
        role: Option<GroupRole>,
        #[graphql(name = "isDeleted")] is_deleted: Option<bool>,
    ) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;

        let args = GroupIndividualQueryArgs {
            common: common_args(
                order_by,
                apply_default_validity_filter,
                date_valid_from_gte,
                date_valid_to_lte,
                client_mutation_id,
            ),
            group_id,
            individual_id,
            role,
            is_deleted,
        };

        context
            .exports
            .export_group_individuals(&actor, &args, &export_options(fields, fields_columns))
            .await
            .map_err(core_error_to_graphql_error)
    }

    /// Fields a custom filter can target for a module object.
    async fn custom_filter_definitions(
        &self,
        ctx: &Context<'_>,
        module_name: String,
        object_type: String,
    ) -> Result<Vec<CustomFilterDefinition>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        check_permissions(&actor, &[]).map_err(core_error_to_graphql_error)?;

        Ok(context
            .custom_filters
            .definitions(&module_name, &object_type)
            .into_iter()
            .map(CustomFilterDefinition::from)
            .collect())
    }

    /// Logged mutations submitted with `clientMutationId`, most recent first.
    async fn mutation_logs(
        &self,
        ctx: &Context<'_>,
        client_mutation_id: String,
    ) -> Result<Vec<MutationLog>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        check_permissions(&actor, &[]).map_err(core_error_to_graphql_error)?;

        let logs = context
            .mutation_logs
            .find_by_client_mutation_id(&client_mutation_id)
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(logs.into_iter().map(MutationLog::from).collect())
    }
}
