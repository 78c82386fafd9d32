use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{
    CreateIndividualInput, DeleteInput, MutationResult, UpdateIndividualInput,
};
use crate::services::{CreateIndividual, UpdateIndividual};

#[derive(Default)]
pub struct IndividualMutation;

#[Object]
impl IndividualMutation {
    #[graphql(name = "createIndividual")]
    async fn create_individual(
        &self,
        ctx: &Context<'_>,
        input: CreateIndividualInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .individuals
            .create(
                &actor,
                &meta,
                CreateIndividual {
                    first_name: input.first_name,
                    last_name: input.last_name,
                    dob: input.dob,
                    json_ext: input.json_ext,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    #[graphql(name = "updateIndividual")]
    async fn update_individual(
        &self,
        ctx: &Context<'_>,
        input: UpdateIndividualInput,
    ) -> Result<MutationResult> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context
            .actor_for_request(ctx)
            .await
            .map_err(core_error_to_graphql_error)?;
        let meta = input.meta();

        let outcome = context
            .individuals
            .update(
                &actor,
                &meta,
                UpdateIndividual {
                    id: input.id,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    dob: input.dob,
                    json_ext: input.json_ext,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }

    /// Soft-deletes individuals together with their group memberships.
    #[graphql(name = "deleteIndividual")]
    async fn delete_individual(
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
            .individuals
            .delete(&actor, &meta, input.ids)
            .await
            .map_err(core_error_to_graphql_error)?;

        Ok(MutationResult::from(outcome))
    }
}
