use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{
    CreateGroupIndividualsInput, CreateGroupInput, DeleteInput, MutationResult, UpdateGroupInput,
};
use crate::services::{CreateGroup, CreateGroupWithIndividuals, NewMembership, UpdateGroup};

#[derive(Default)]
pub struct GroupMutation;

#[Object]
impl GroupMutation {
    #[graphql(name = "createGroup")]
    async fn create_group(
        &self,
        ctx: &Context<'_>,
        input: CreateGroupInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .groups
            .create(
                &actor,
                &meta,
                CreateGroup {
                    code: input.code,
                    json_ext: input.json_ext,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    #[graphql(name = "updateGroup")]
    async fn update_group(
        &self,
        ctx: &Context<'_>,
        input: UpdateGroupInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .groups
            .update(
                &actor,
                &meta,
                UpdateGroup {
                    id: input.id,
                    code: input.code,
                    json_ext: input.json_ext,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    /// Soft-deletes groups and their memberships.
    #[graphql(name = "deleteGroup")]
    async fn delete_group(&self, ctx: &Context<'_>, input: DeleteInput) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .groups
            .delete(&actor, &meta, input.ids)
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    /// Creates a group and its memberships in one transaction.
    #[graphql(name = "createGroupIndividuals")]
    async fn create_group_individuals(
        &self,
        ctx: &Context<'_>,
        input: CreateGroupIndividualsInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .groups
            .create_with_individuals(
                &actor,
                &meta,
                CreateGroupWithIndividuals {
                    code: input.code,
                    json_ext: input.json_ext,
                    individuals: input
                        .individuals_data
                        .into_iter()
                        .map(NewMembership::from)
                        .collect(),
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }
}
