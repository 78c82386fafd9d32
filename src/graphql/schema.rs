use async_graphql::dataloader::DataLoader;
use async_graphql::{EmptySubscription, Schema};

use crate::graphql::context::GraphQLContext;
use crate::graphql::loaders::{GroupLoader, IndividualLoader, MembershipLoader, UploadLoader};
use crate::graphql::mutations::Mutation;
use crate::graphql::queries::Query;

pub type GraphQLSchema = Schema<Query, Mutation, EmptySubscription>;

/// Schema with the shared context and one batching loader per relation.
pub fn build_schema(context: GraphQLContext) -> GraphQLSchema {
    let individual_loader = DataLoader::new(IndividualLoader::new(context.db.clone()), tokio::spawn);
    let group_loader = DataLoader::new(GroupLoader::new(context.db.clone()), tokio::spawn);
    let upload_loader = DataLoader::new(UploadLoader::new(context.db.clone()), tokio::spawn);
    let membership_loader =
        DataLoader::new(MembershipLoader::new(context.db.clone()), tokio::spawn);

    Schema::build(Query, Mutation::default(), EmptySubscription)
        .data(context)
        .data(individual_loader)
        .data(group_loader)
        .data(upload_loader)
        .data(membership_loader)
        .finish()
}
