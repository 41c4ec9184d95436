use std::path::{Path, PathBuf};

use autoschematic_core::{connector::ResourceAddress, error_util::invalid_addr_path};

use crate::util::{decode_key, encode_key};

/// Addresses a single keyed item inside a distribution's config.
/// Path patterns and origin IDs are URL-encoded into the file stem.
#[derive(Debug, Clone, PartialEq)]
pub enum CloudFrontResourceAddress {
    CacheBehavior { distribution_id: String, path_pattern: String },
    Origin { distribution_id: String, origin_id: String },
}

/// Decodes the key from a `{key}.ron` file name. Empty keys are not addresses.
fn decode_stem(name: &str) -> anyhow::Result<Option<String>> {
    let Some(stem) = name.strip_suffix(".ron") else {
        return Ok(None);
    };
    let key = decode_key(stem)?;
    if key.is_empty() { Ok(None) } else { Ok(Some(key)) }
}

impl CloudFrontResourceAddress {
    pub fn distribution_id(&self) -> &str {
        match self {
            CloudFrontResourceAddress::CacheBehavior { distribution_id, .. } => distribution_id,
            CloudFrontResourceAddress::Origin { distribution_id, .. } => distribution_id,
        }
    }
}

impl ResourceAddress for CloudFrontResourceAddress {
    fn to_path_buf(&self) -> PathBuf {
        match &self {
            CloudFrontResourceAddress::CacheBehavior {
                distribution_id,
                path_pattern,
            } => PathBuf::from(format!(
                "aws/cloudfront/distributions/{}/cache_behaviors/{}.ron",
                distribution_id,
                encode_key(path_pattern)
            )),
            CloudFrontResourceAddress::Origin {
                distribution_id,
                origin_id,
            } => PathBuf::from(format!(
                "aws/cloudfront/distributions/{}/origins/{}.ron",
                distribution_id,
                encode_key(origin_id)
            )),
        }
    }

    fn from_path(path: &Path) -> Result<Self, anyhow::Error> {
        let Some(path_components) = path.components().map(|s| s.as_os_str().to_str()).collect::<Option<Vec<&str>>>() else {
            return Err(invalid_addr_path(path));
        };

        match &path_components[..] {
            ["aws", "cloudfront", "distributions", distribution_id, "cache_behaviors", name] => {
                let Some(path_pattern) = decode_stem(name)? else {
                    return Err(invalid_addr_path(path));
                };
                Ok(CloudFrontResourceAddress::CacheBehavior {
                    distribution_id: distribution_id.to_string(),
                    path_pattern,
                })
            }
            ["aws", "cloudfront", "distributions", distribution_id, "origins", name] => {
                let Some(origin_id) = decode_stem(name)? else {
                    return Err(invalid_addr_path(path));
                };
                Ok(CloudFrontResourceAddress::Origin {
                    distribution_id: distribution_id.to_string(),
                    origin_id,
                })
            }
            _ => Err(invalid_addr_path(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_behavior_path_round_trips_wildcards() {
        let addr = CloudFrontResourceAddress::CacheBehavior {
            distribution_id: String::from("E2QWRUHAPOMQZL"),
            path_pattern:    String::from("/images/*.jpg"),
        };
        let path = addr.to_path_buf();
        assert_eq!(
            path,
            PathBuf::from("aws/cloudfront/distributions/E2QWRUHAPOMQZL/cache_behaviors/%2Fimages%2F%2A.jpg.ron")
        );
        assert_eq!(CloudFrontResourceAddress::from_path(&path).unwrap(), addr);
    }

    #[test]
    fn origin_path_parses() {
        let addr = CloudFrontResourceAddress::from_path(Path::new(
            "aws/cloudfront/distributions/E2QWRUHAPOMQZL/origins/my-bucket.ron",
        ))
        .unwrap();
        assert_eq!(
            addr,
            CloudFrontResourceAddress::Origin {
                distribution_id: String::from("E2QWRUHAPOMQZL"),
                origin_id:       String::from("my-bucket"),
            }
        );
        assert_eq!(addr.distribution_id(), "E2QWRUHAPOMQZL");
    }

    #[test]
    fn rejects_foreign_paths() {
        for p in [
            "aws/cloudfront/distributions/E2QWRUHAPOMQZL/origins/my-bucket.json",
            "aws/cloudfront/distributions/E2QWRUHAPOMQZL/config.ron",
            "aws/cloudfront/distributions/E2QWRUHAPOMQZL/origins/.ron",
            "aws/cloudfront/distributions/E2QWRUHAPOMQZL/cache_behaviors/.ron",
            "aws/route53/hosted_zones/example.com/config.ron",
        ] {
            assert!(CloudFrontResourceAddress::from_path(Path::new(p)).is_err(), "{p}");
        }
    }
}
