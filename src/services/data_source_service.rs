use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use uuid::Uuid;

use super::query::{fetch_page, CommonQueryArgs, Page, PageResult};
use crate::auth::{Actor, Operation};
use crate::config::PermissionConfig;
use crate::database::entities::{individual_data_source_uploads, individual_data_sources, UploadStatus};
use crate::errors::CoreResult;
use crate::filters::lookups::icontains;

#[derive(Clone, Debug, Default)]
pub struct DataSourceQueryArgs {
    pub common: CommonQueryArgs,
    pub upload_id: Option<Uuid>,
    pub individual_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default)]
pub struct UploadQueryArgs {
    pub common: CommonQueryArgs,
    pub status: Option<UploadStatus>,
    pub source_name_icontains: Option<String>,
}

/// Read access to imported individual data and the uploads it came from.
/// Both are guarded by the individual search right.
#[derive(Clone, Debug)]
pub struct DataSourceService {
    db: DatabaseConnection,
    perms: PermissionConfig,
}

impl DataSourceService {
    pub fn new(db: DatabaseConnection, perms: PermissionConfig) -> Self {
        Self { db, perms }
    }

    pub async fn query_sources(
        &self,
        actor: &Actor,
        args: &DataSourceQueryArgs,
        page: Page,
    ) -> CoreResult<PageResult<individual_data_sources::Model>> {
        self.perms.check(actor, Operation::IndividualSearch)?;

        let mut filters = args.common.conditions::<individual_data_sources::Entity>();
        if let Some(upload_id) = args.upload_id {
            filters.push(
                Condition::all().add(individual_data_sources::Column::UploadId.eq(upload_id)),
            );
        }
        if let Some(individual_id) = args.individual_id {
            filters.push(
                Condition::all()
                    .add(individual_data_sources::Column::IndividualId.eq(individual_id)),
            );
        }

        fetch_page::<individual_data_sources::Entity, _>(
            &self.db,
            filters,
            &args.common.order_by,
            page,
        )
        .await
    }

    pub async fn query_uploads(
        &self,
        actor: &Actor,
        args: &UploadQueryArgs,
        page: Page,
    ) -> CoreResult<PageResult<individual_data_source_uploads::Model>> {
        self.perms.check(actor, Operation::IndividualSearch)?;

        let mut filters = args.common.conditions::<individual_data_source_uploads::Entity>();
        if let Some(status) = args.status {
            filters.push(
                Condition::all()
                    .add(individual_data_source_uploads::Column::Status.eq(status.as_str())),
            );
        }
        if let Some(name) = &args.source_name_icontains {
            let column = Expr::col((
                individual_data_source_uploads::Entity,
                individual_data_source_uploads::Column::SourceName,
            ));
            filters.push(Condition::all().add(icontains(column, name)));
        }

        fetch_page::<individual_data_source_uploads::Entity, _>(
            &self.db,
            filters,
            &args.common.order_by,
            page,
        )
        .await
    }
}
