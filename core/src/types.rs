//! Request and response payloads of the DataManager API.
//!
//! # Design
//! The protocol layer never looks inside these; they are the shapes the
//! server expects on the endpoints in [`Endpoint`](crate::Endpoint). Field
//! names follow the server's wire format, which is why several of them are
//! renamed.

use serde::{Deserialize, Serialize};

/// Body of `/ping`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PingRequest {
    #[serde(rename = "Payload")]
    pub payload: String,
}

/// Username/password pair for login and registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsRequest {
    #[serde(rename = "mid", default, skip_serializing_if = "String::is_empty")]
    pub machine_id: String,
    pub username: String,
    #[serde(rename = "pass")]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

/// Generic single-string response, returned by `/ping`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StringResponse {
    #[serde(rename = "String")]
    pub string: String,
}

/// Tags, groups and namespace a file belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAttributes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(rename = "ns")]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionalRequestParameter {
    #[serde(rename = "verb")]
    pub verbose: u8,
}

/// Body of `/files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileListRequest {
    #[serde(rename = "fid")]
    pub file_id: u64,
    pub name: String,
    #[serde(rename = "allns")]
    pub all_namespaces: bool,
    #[serde(rename = "opt")]
    pub optional_params: OptionalRequestParameter,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub order: String,
    pub attributes: FileAttributes,
}

/// Changes applied by `/file/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileUpdateItem {
    #[serde(rename = "ispub", default, skip_serializing_if = "String::is_empty")]
    pub is_public: String,
    #[serde(rename = "name", default, skip_serializing_if = "String::is_empty")]
    pub new_name: String,
    #[serde(rename = "namespace", default, skip_serializing_if = "String::is_empty")]
    pub new_namespace: String,
    #[serde(rename = "rem_tags", default, skip_serializing_if = "Vec::is_empty")]
    pub remove_tags: Vec<String>,
    #[serde(rename = "rem_groups", default, skip_serializing_if = "Vec::is_empty")]
    pub remove_groups: Vec<String>,
    #[serde(rename = "add_tags", default, skip_serializing_if = "Vec::is_empty")]
    pub add_tags: Vec<String>,
    #[serde(rename = "add_groups", default, skip_serializing_if = "Vec::is_empty")]
    pub add_groups: Vec<String>,
}

/// Body of the single-file endpoints (`/file/*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRequest {
    #[serde(rename = "fid")]
    pub file_id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "pubname", default, skip_serializing_if = "String::is_empty")]
    pub public_name: String,
    #[serde(default)]
    pub updates: FileUpdateItem,
    pub all: bool,
    pub attributes: FileAttributes,
}

/// Body of the tag and group update/delete endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateAttributeRequest {
    pub name: String,
    #[serde(rename = "newname")]
    pub new_name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum NamespaceType {
    #[default]
    User,
    Custom,
}

impl From<NamespaceType> for u8 {
    fn from(value: NamespaceType) -> Self {
        match value {
            NamespaceType::User => 0,
            NamespaceType::Custom => 1,
        }
    }
}

impl TryFrom<u8> for NamespaceType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NamespaceType::User),
            1 => Ok(NamespaceType::Custom),
            other => Err(format!("unknown namespace type {other}")),
        }
    }
}

/// Body of the namespace endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceRequest {
    #[serde(rename = "ns")]
    pub namespace: String,
    #[serde(rename = "newName", default, skip_serializing_if = "String::is_empty")]
    pub new_name: String,
    #[serde(rename = "nstype")]
    pub namespace_type: NamespaceType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum UploadType {
    #[default]
    File,
    Url,
}

impl From<UploadType> for u8 {
    fn from(value: UploadType) -> Self {
        match value {
            UploadType::File => 0,
            UploadType::Url => 1,
        }
    }
}

impl TryFrom<u8> for UploadType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UploadType::File),
            1 => Ok(UploadType::Url),
            other => Err(format!("unknown upload type {other}")),
        }
    }
}

/// Metadata sent alongside an upload to `/upload/file`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadRequest {
    #[serde(rename = "type")]
    pub upload_type: UploadType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub name: String,
    #[serde(rename = "pb", default, skip_serializing_if = "std::ops::Not::not")]
    pub public: bool,
    #[serde(rename = "pbname", default, skip_serializing_if = "String::is_empty")]
    pub public_name: String,
    #[serde(rename = "attr", default)]
    pub attributes: FileAttributes,
    #[serde(rename = "e", default, skip_serializing_if = "String::is_empty")]
    pub encryption: String,
    #[serde(rename = "r", default, skip_serializing_if = "is_zero")]
    pub replace_file: u64,
    #[serde(rename = "s")]
    pub size: i64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}
