use autoschematic_core::{
    connector::{Resource, ResourceAddress},
    util::{PrettyConfig, RON},
};
use serde::{Deserialize, Serialize};

use super::addr::CloudFrontResourceAddress;

pub const MAX_LAMBDA_FUNCTION_ASSOCIATIONS: usize = 4;

fn default_ttl() -> i64 {
    86400
}

fn default_max_ttl() -> i64 {
    31536000
}

fn default_keepalive_timeout() -> i32 {
    5
}

fn default_read_timeout() -> i32 {
    30
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("at most 4 lambda function associations are allowed, got {0}")]
    TooManyLambdaAssociations(usize),
    #[error("custom_origin_config and s3_origin_config cannot both be set")]
    ConflictingOriginConfig,
}

/// An ordered cache behavior. The path pattern it applies to is part of the address.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct CacheBehavior {
    pub target_origin_id: String,
    pub viewer_protocol_policy: String,
    pub allowed_methods: Vec<String>,
    pub cached_methods: Vec<String>,
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_ttl")]
    pub default_ttl: i64,
    #[serde(default = "default_max_ttl")]
    pub max_ttl: i64,
    #[serde(default)]
    pub min_ttl: i64,
    #[serde(default)]
    pub field_level_encryption_id: Option<String>,
    pub forwarded_values: ForwardedValues,
    #[serde(default)]
    pub lambda_function_associations: Vec<LambdaFunctionAssociation>,
    #[serde(default)]
    pub smooth_streaming: Option<bool>,
    #[serde(default)]
    pub trusted_signers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ForwardedValues {
    pub query_string: bool,
    #[serde(default)]
    pub query_string_cache_keys: Vec<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    pub cookies: CookiePreference,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct CookiePreference {
    /// One of `none`, `whitelist` or `all`.
    pub forward: String,
    #[serde(default)]
    pub whitelisted_names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone)]
#[serde(deny_unknown_fields)]
pub struct LambdaFunctionAssociation {
    pub event_type: String,
    pub lambda_arn: String,
}

/// An origin of a distribution. The origin ID is part of the address.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Origin {
    pub domain_name: String,
    #[serde(default)]
    pub origin_path: Option<String>,
    #[serde(default)]
    pub custom_headers: Vec<CustomHeader>,
    #[serde(default)]
    pub custom_origin_config: Option<CustomOriginConfig>,
    #[serde(default)]
    pub s3_origin_config: Option<S3OriginConfig>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone)]
#[serde(deny_unknown_fields)]
pub struct CustomHeader {
    pub name:  String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct CustomOriginConfig {
    pub http_port: i32,
    pub https_port: i32,
    pub origin_protocol_policy: String,
    pub origin_ssl_protocols: Vec<String>,
    #[serde(default = "default_keepalive_timeout")]
    pub origin_keepalive_timeout: i32,
    #[serde(default = "default_read_timeout")]
    pub origin_read_timeout: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct S3OriginConfig {
    pub origin_access_identity: String,
}

impl CacheBehavior {
    /// Allowed/cached methods and lambda associations are unordered on the AWS side.
    pub fn normalized(mut self) -> Self {
        self.allowed_methods.sort();
        self.allowed_methods.dedup();
        self.cached_methods.sort();
        self.cached_methods.dedup();
        self.lambda_function_associations.sort();
        if self.field_level_encryption_id.as_deref() == Some("") {
            self.field_level_encryption_id = None;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_origin_id.is_empty() {
            return Err(ValidationError::Empty("target_origin_id"));
        }
        if self.lambda_function_associations.len() > MAX_LAMBDA_FUNCTION_ASSOCIATIONS {
            return Err(ValidationError::TooManyLambdaAssociations(
                self.lambda_function_associations.len(),
            ));
        }
        Ok(())
    }
}

impl Origin {
    pub fn normalized(mut self) -> Self {
        self.custom_headers.sort();
        if self.origin_path.as_deref() == Some("") {
            self.origin_path = None;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.domain_name.is_empty() {
            return Err(ValidationError::Empty("domain_name"));
        }
        if self.custom_origin_config.is_some() && self.s3_origin_config.is_some() {
            return Err(ValidationError::ConflictingOriginConfig);
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum CloudFrontResource {
    CacheBehavior(CacheBehavior),
    Origin(Origin),
}

impl CloudFrontResource {
    pub fn normalized(self) -> Self {
        match self {
            CloudFrontResource::CacheBehavior(b) => CloudFrontResource::CacheBehavior(b.normalized()),
            CloudFrontResource::Origin(o) => CloudFrontResource::Origin(o.normalized()),
        }
    }
}

impl Resource for CloudFrontResource {
    fn to_bytes(&self) -> Result<Vec<u8>, anyhow::Error> {
        let pretty_config = PrettyConfig::default().struct_names(true);
        match self {
            CloudFrontResource::CacheBehavior(behavior) => match RON.to_string_pretty(&behavior, pretty_config) {
                Ok(s) => Ok(s.into()),
                Err(e) => Err(e.into()),
            },
            CloudFrontResource::Origin(origin) => match RON.to_string_pretty(&origin, pretty_config) {
                Ok(s) => Ok(s.into()),
                Err(e) => Err(e.into()),
            },
        }
    }

    fn from_bytes(addr: &impl ResourceAddress, s: &[u8]) -> Result<Self, anyhow::Error>
    where
        Self: Sized,
    {
        let addr = CloudFrontResourceAddress::from_path(&addr.to_path_buf())?;

        let s = str::from_utf8(s)?;
        match addr {
            CloudFrontResourceAddress::CacheBehavior { .. } => Ok(CloudFrontResource::CacheBehavior(RON.from_str(s)?)),
            CloudFrontResourceAddress::Origin { .. } => Ok(CloudFrontResource::Origin(RON.from_str(s)?)),
        }
    }
}
