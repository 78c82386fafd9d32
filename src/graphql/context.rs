use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::Actor;
use crate::config::RegistryConfig;
use crate::errors::CoreResult;
use crate::filters::CustomFilterRegistry;
use crate::services::{
    AuthorizationService, DataSourceService, ExportService, GroupIndividualService, GroupService,
    IndividualService, MutationLogService,
};

/// Shared state handed to every resolver.
#[derive(Clone)]
pub struct GraphQLContext {
    pub db: DatabaseConnection,
    pub config: Arc<RegistryConfig>,
    pub custom_filters: Arc<CustomFilterRegistry>,
    pub authorization: AuthorizationService,
    pub individuals: IndividualService,
    pub groups: GroupService,
    pub memberships: GroupIndividualService,
    pub data_sources: DataSourceService,
    pub exports: ExportService,
    pub mutation_logs: MutationLogService,
}

/// Session id of the current HTTP request (`x-session-id` header).
#[derive(Clone, Debug)]
pub struct RequestSession(pub String);

impl RequestSession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl GraphQLContext {
    pub fn new(db: DatabaseConnection, config: RegistryConfig) -> CoreResult<Self> {
        let custom_filters = Arc::new(CustomFilterRegistry::from_config(&config.custom_filters)?);
        let perms = config.perms.clone();

        let individuals =
            IndividualService::new(db.clone(), perms.clone(), Arc::clone(&custom_filters));
        let groups = GroupService::new(db.clone(), perms.clone(), Arc::clone(&custom_filters));
        let memberships = GroupIndividualService::new(db.clone(), perms.clone());
        let exports = ExportService::new(individuals.clone(), groups.clone(), memberships.clone());

        Ok(Self {
            authorization: AuthorizationService::new(db.clone()),
            data_sources: DataSourceService::new(db.clone(), perms),
            mutation_logs: MutationLogService::new(db.clone()),
            individuals,
            groups,
            memberships,
            exports,
            custom_filters,
            config: Arc::new(config),
            db,
        })
    }

    /// Actor behind the request's session; anonymous without one.
    pub async fn actor_for_request(&self, ctx: &async_graphql::Context<'_>) -> CoreResult<Actor> {
        let session = ctx.data_opt::<RequestSession>();
        self.authorization
            .actor_for_session(session.map(RequestSession::as_str))
            .await
    }
}
