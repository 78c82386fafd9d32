use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{
    AddIndividualToGroupInput, DeleteInput, EditIndividualInGroupInput, MutationResult,
};
use crate::services::{AddIndividualToGroup, EditGroupIndividual, NewMembership};

#[derive(Default)]
pub struct GroupIndividualMutation;

#[Object]
impl GroupIndividualMutation {
    #[graphql(name = "addIndividualToGroup")]
    async fn add_individual_to_group(
        &self,
        ctx: &Context<'_>,
        input: AddIndividualToGroupInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .memberships
            .add(
                &actor,
                &meta,
                AddIndividualToGroup {
                    group_id: input.group_id,
                    member: NewMembership {
                        individual_id: input.individual_id,
                        role: input.role,
                        recipient_type: input.recipient_type,
                    },
                    json_ext: input.json_ext,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    #[graphql(name = "editIndividualInGroup")]
    async fn edit_individual_in_group(
        &self,
        ctx: &Context<'_>,
        input: EditIndividualInGroupInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .memberships
            .edit(
                &actor,
                &meta,
                EditGroupIndividual {
                    id: input.id,
                    role: input.role,
                    recipient_type: input.recipient_type,
                    json_ext: input.json_ext,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    /// Soft-deletes memberships by id.
    #[graphql(name = "removeIndividualFromGroup")]
    async fn remove_individual_from_group(
        &self,
        ctx: &Context<'_>,
        input: DeleteInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .memberships
            .remove(&actor, &meta, input.ids)
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }
}
