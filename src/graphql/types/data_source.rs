use async_graphql::dataloader::DataLoader;
use async_graphql::*;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::entities::{individual_data_source_uploads, individual_data_sources, UploadStatus};
use crate::graphql::errors::StructuredError;
use crate::graphql::loaders::{IndividualLoader, UploadLoader};
use crate::graphql::types::Individual;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex)]
pub struct IndividualDataSource {
    pub id: Uuid,
    pub individual_id: Option<Uuid>,
    pub upload_id: Option<Uuid>,
    pub validations: Option<serde_json::Value>,
    pub json_ext: Option<serde_json::Value>,
    pub version: i32,
    pub is_deleted: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub date_valid_from: DateTime<Utc>,
    pub date_valid_to: Option<DateTime<Utc>>,
}

impl From<individual_data_sources::Model> for IndividualDataSource {
    fn from(model: individual_data_sources::Model) -> Self {
        Self {
            id: model.id,
            individual_id: model.individual_id,
            upload_id: model.upload_id,
            validations: model.validations,
            json_ext: model.json_ext,
            version: model.version,
            is_deleted: model.is_deleted,
            date_created: model.date_created,
            date_updated: model.date_updated,
            date_valid_from: model.date_valid_from,
            date_valid_to: model.date_valid_to,
        }
    }
}

#[ComplexObject]
impl IndividualDataSource {
    async fn individual(&self, ctx: &Context<'_>) -> Result<Option<Individual>> {
        let Some(individual_id) = self.individual_id else {
            return Ok(None);
        };
        let individual = ctx
            .data::<DataLoader<IndividualLoader>>()?
            .load_one(individual_id)
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load individual: {}", e)))?;
        Ok(individual.map(Individual::from))
    }

    async fn upload(&self, ctx: &Context<'_>) -> Result<Option<IndividualDataSourceUpload>> {
        let Some(upload_id) = self.upload_id else {
            return Ok(None);
        };
        let upload = ctx
            .data::<DataLoader<UploadLoader>>()?
            .load_one(upload_id)
            .await
            .map_err(|e| StructuredError::internal(format!("Failed to load upload: {}", e)))?;
        Ok(upload.map(IndividualDataSourceUpload::from))
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct IndividualDataSourceUpload {
    pub id: Uuid,
    pub source_name: String,
    pub source_type: String,
    pub status: Option<UploadStatus>,
    pub error: Option<serde_json::Value>,
    pub json_ext: Option<serde_json::Value>,
    pub version: i32,
    pub is_deleted: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub date_valid_from: DateTime<Utc>,
    pub date_valid_to: Option<DateTime<Utc>>,
}

impl From<individual_data_source_uploads::Model> for IndividualDataSourceUpload {
    fn from(model: individual_data_source_uploads::Model) -> Self {
        Self {
            status: model.get_status(),
            id: model.id,
            source_name: model.source_name,
            source_type: model.source_type,
            error: model.error,
            json_ext: model.json_ext,
            version: model.version,
            is_deleted: model.is_deleted,
            date_created: model.date_created,
            date_updated: model.date_updated,
            date_valid_from: model.date_valid_from,
            date_valid_to: model.date_valid_to,
        }
    }
}
