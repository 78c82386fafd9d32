use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Registry tables a mutation can touch, as stored in `record_mutations`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Individual,
    Group,
    GroupIndividual,
    IndividualDataSource,
    IndividualDataSourceUpload,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Individual => "individual",
            EntityKind::Group => "group",
            EntityKind::GroupIndividual => "group_individual",
            EntityKind::IndividualDataSource => "individual_data_source",
            EntityKind::IndividualDataSourceUpload => "individual_data_source_upload",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship of a member to the rest of its group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
    Head,
    Spouse,
    Son,
    Daughter,
    Grandfather,
    Grandmother,
    Mother,
    Father,
    Grandson,
    Granddaughter,
    Sister,
    Brother,
    Other,
    NotRelated,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Head => "HEAD",
            GroupRole::Spouse => "SPOUSE",
            GroupRole::Son => "SON",
            GroupRole::Daughter => "DAUGHTER",
            GroupRole::Grandfather => "GRANDFATHER",
            GroupRole::Grandmother => "GRANDMOTHER",
            GroupRole::Mother => "MOTHER",
            GroupRole::Father => "FATHER",
            GroupRole::Grandson => "GRANDSON",
            GroupRole::Granddaughter => "GRANDDAUGHTER",
            GroupRole::Sister => "SISTER",
            GroupRole::Brother => "BROTHER",
            GroupRole::Other => "OTHER",
            GroupRole::NotRelated => "NOT_RELATED",
        }
    }
}

impl FromStr for GroupRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HEAD" => Ok(GroupRole::Head),
            "SPOUSE" => Ok(GroupRole::Spouse),
            "SON" => Ok(GroupRole::Son),
            "DAUGHTER" => Ok(GroupRole::Daughter),
            "GRANDFATHER" => Ok(GroupRole::Grandfather),
            "GRANDMOTHER" => Ok(GroupRole::Grandmother),
            "MOTHER" => Ok(GroupRole::Mother),
            "FATHER" => Ok(GroupRole::Father),
            "GRANDSON" => Ok(GroupRole::Grandson),
            "GRANDDAUGHTER" => Ok(GroupRole::Granddaughter),
            "SISTER" => Ok(GroupRole::Sister),
            "BROTHER" => Ok(GroupRole::Brother),
            "OTHER" => Ok(GroupRole::Other),
            "NOT_RELATED" => Ok(GroupRole::NotRelated),
            _ => Err(format!("Invalid group role: {}", s)),
        }
    }
}

/// Which member receives benefits on behalf of the group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    Primary,
    Secondary,
}

impl RecipientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientType::Primary => "PRIMARY",
            RecipientType::Secondary => "SECONDARY",
        }
    }
}

impl FromStr for RecipientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRIMARY" => Ok(RecipientType::Primary),
            "SECONDARY" => Ok(RecipientType::Secondary),
            _ => Err(format!("Invalid recipient type: {}", s)),
        }
    }
}

/// Processing state of a data-source upload.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Pending,
    Triggered,
    InProgress,
    Success,
    PartialSuccess,
    WaitingForVerification,
    Fail,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "PENDING",
            UploadStatus::Triggered => "TRIGGERED",
            UploadStatus::InProgress => "IN_PROGRESS",
            UploadStatus::Success => "SUCCESS",
            UploadStatus::PartialSuccess => "PARTIAL_SUCCESS",
            UploadStatus::WaitingForVerification => "WAITING_FOR_VERIFICATION",
            UploadStatus::Fail => "FAIL",
        }
    }
}

impl FromStr for UploadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(UploadStatus::Pending),
            "TRIGGERED" => Ok(UploadStatus::Triggered),
            "IN_PROGRESS" => Ok(UploadStatus::InProgress),
            "SUCCESS" => Ok(UploadStatus::Success),
            "PARTIAL_SUCCESS" => Ok(UploadStatus::PartialSuccess),
            "WAITING_FOR_VERIFICATION" => Ok(UploadStatus::WaitingForVerification),
            "FAIL" => Ok(UploadStatus::Fail),
            _ => Err(format!("Invalid upload status: {}", s)),
        }
    }
}

/// Lifecycle of a logged mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationStatus {
    Received,
    Error,
    Success,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationStatus::Received => "RECEIVED",
            MutationStatus::Error => "ERROR",
            MutationStatus::Success => "SUCCESS",
        }
    }
}

impl FromStr for MutationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RECEIVED" => Ok(MutationStatus::Received),
            "ERROR" => Ok(MutationStatus::Error),
            "SUCCESS" => Ok(MutationStatus::Success),
            _ => Err(format!("Invalid mutation status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_role_parsing_is_case_insensitive() {
        assert_eq!("head".parse::<GroupRole>().unwrap(), GroupRole::Head);
        assert_eq!(
            "NOT_RELATED".parse::<GroupRole>().unwrap(),
            GroupRole::NotRelated
        );
        assert!("cousin".parse::<GroupRole>().is_err());
    }

    #[test]
    fn test_upload_status_round_trips_through_str() {
        for status in [
            UploadStatus::Pending,
            UploadStatus::InProgress,
            UploadStatus::WaitingForVerification,
            UploadStatus::Fail,
        ] {
            assert_eq!(status.as_str().parse::<UploadStatus>().unwrap(), status);
        }
    }
}
