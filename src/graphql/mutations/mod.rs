mod group;
mod group_individual;
mod individual;

use async_graphql::*;

/// Mutation root combining the registry mutation groups.
#[derive(Default, MergedObject)]
pub struct Mutation(
    pub individual::IndividualMutation,
    pub group::GroupMutation,
    pub group_individual::GroupIndividualMutation,
);
