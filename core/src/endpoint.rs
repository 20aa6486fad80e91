//! Remote URL paths and how they are joined onto the configured base URL.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::error::RequestError;

/// A relative path on the server identifying one remote operation.
///
/// The core never interprets the path; the constants below are the catalogue
/// the DataManager server exposes, but any string converts into an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(Cow<'static, str>);

impl Endpoint {
    pub const PING: Endpoint = Endpoint::from_static("/ping");

    pub const USER: Endpoint = Endpoint::from_static("/user");
    pub const LOGIN: Endpoint = Endpoint::from_static("/user/login");
    pub const REGISTER: Endpoint = Endpoint::from_static("/user/register");

    pub const FILE: Endpoint = Endpoint::from_static("/file");
    pub const FILE_LIST: Endpoint = Endpoint::from_static("/files");
    pub const FILE_UPDATE: Endpoint = Endpoint::from_static("/file/update");
    pub const FILE_DELETE: Endpoint = Endpoint::from_static("/file/delete");
    pub const FILE_GET: Endpoint = Endpoint::from_static("/file/get");
    pub const FILE_PUBLISH: Endpoint = Endpoint::from_static("/file/publish");
    pub const FILE_UPLOAD: Endpoint = Endpoint::from_static("/upload/file");

    pub const ATTRIBUTE: Endpoint = Endpoint::from_static("/attribute");
    pub const TAG: Endpoint = Endpoint::from_static("/attribute/tag");
    pub const TAG_UPDATE: Endpoint = Endpoint::from_static("/attribute/tag/update");
    pub const TAG_DELETE: Endpoint = Endpoint::from_static("/attribute/tag/delete");
    pub const GROUP: Endpoint = Endpoint::from_static("/attribute/group");
    pub const GROUP_UPDATE: Endpoint = Endpoint::from_static("/attribute/group/update");
    pub const GROUP_DELETE: Endpoint = Endpoint::from_static("/attribute/group/delete");

    pub const NAMESPACE: Endpoint = Endpoint::from_static("/namespace");
    pub const NAMESPACE_CREATE: Endpoint = Endpoint::from_static("/namespace/create");
    pub const NAMESPACE_UPDATE: Endpoint = Endpoint::from_static("/namespace/update");
    pub const NAMESPACE_DELETE: Endpoint = Endpoint::from_static("/namespace/delete");
    pub const NAMESPACE_LIST: Endpoint = Endpoint::from_static("/namespaces");

    pub const fn from_static(path: &'static str) -> Self {
        Endpoint(Cow::Borrowed(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Endpoint {
    fn from(path: &'static str) -> Self {
        Endpoint(Cow::Borrowed(path))
    }
}

impl From<String> for Endpoint {
    fn from(path: String) -> Self {
        Endpoint(Cow::Owned(path))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lexically join two URL paths.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment,
/// never climbing above the root. The result is always absolute.
pub fn join_path(base: &str, endpoint: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(endpoint.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Resolve `endpoint` against the configured base URL.
///
/// Only the path of the base changes; its scheme, authority, query and
/// fragment are kept as configured.
pub fn build_url(base: &str, endpoint: &Endpoint) -> Result<Url, RequestError> {
    let mut url = Url::parse(base).map_err(|source| RequestError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(RequestError::UnsupportedBaseUrl(base.to_string()));
    }
    let path = join_path(url.path(), endpoint.as_str());
    url.set_path(&path);
    Ok(url)
}
