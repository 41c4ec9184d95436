use std::path::Path;

use autoschematic_core::{
    connector::{ConnectorOp, OpPlanOutput, ResourceAddress},
    connector_op,
    util::{RON, diff_ron_values},
};

use super::CloudFrontConnector;
use crate::{
    addr::CloudFrontResourceAddress,
    op::CloudFrontConnectorOp,
    resource::{CacheBehavior, Origin},
};

/// Decides the single op needed to move a cache behavior from `current` to `desired`.
pub fn plan_cache_behavior(
    current: Option<CacheBehavior>,
    desired: Option<CacheBehavior>,
) -> anyhow::Result<Option<CloudFrontConnectorOp>> {
    if let Some(desired) = &desired {
        desired.validate()?;
    }

    match (current, desired) {
        (None, None) => Ok(None),
        (None, Some(new)) => Ok(Some(CloudFrontConnectorOp::AddCacheBehavior(new))),
        (Some(_), None) => Ok(Some(CloudFrontConnectorOp::RemoveCacheBehavior)),
        (Some(old), Some(new)) if old.clone().normalized() == new.clone().normalized() => Ok(None),
        (Some(_), Some(new)) => Ok(Some(CloudFrontConnectorOp::UpdateCacheBehavior(new))),
    }
}

pub fn plan_origin(current: Option<Origin>, desired: Option<Origin>) -> anyhow::Result<Option<CloudFrontConnectorOp>> {
    if let Some(desired) = &desired {
        desired.validate()?;
    }

    match (current, desired) {
        (None, None) => Ok(None),
        (None, Some(new)) => Ok(Some(CloudFrontConnectorOp::AddOrigin(new))),
        (Some(_), None) => Ok(Some(CloudFrontConnectorOp::RemoveOrigin)),
        (Some(old), Some(new)) if old.clone().normalized() == new.clone().normalized() => Ok(None),
        (Some(_), Some(new)) => Ok(Some(CloudFrontConnectorOp::UpdateOrigin(new))),
    }
}

fn parse<T: serde::de::DeserializeOwned>(s: Option<String>) -> anyhow::Result<Option<T>> {
    match s {
        Some(s) => Ok(Some(RON.from_str(&s)?)),
        None => Ok(None),
    }
}

impl CloudFrontConnector {
    pub async fn do_plan(
        &self,
        addr: &Path,
        current: Option<String>,
        desired: Option<String>,
    ) -> Result<Vec<OpPlanOutput>, anyhow::Error> {
        let addr = CloudFrontResourceAddress::from_path(addr)?;

        match addr {
            CloudFrontResourceAddress::CacheBehavior {
                distribution_id,
                path_pattern,
            } => {
                let current: Option<CacheBehavior> = parse(current)?;
                let desired: Option<CacheBehavior> = parse(desired)?;
                let diff = match (&current, &desired) {
                    (Some(old), Some(new)) => diff_ron_values(old, new).unwrap_or_default(),
                    _ => String::new(),
                };

                let Some(op) = plan_cache_behavior(current, desired)? else {
                    return Ok(vec![]);
                };

                let message = match op {
                    CloudFrontConnectorOp::AddCacheBehavior(_) => {
                        format!("Add cache behavior `{}` to distribution {}", path_pattern, distribution_id)
                    }
                    CloudFrontConnectorOp::UpdateCacheBehavior(_) => format!(
                        "Modify cache behavior `{}` on distribution {}\n{}",
                        path_pattern, distribution_id, diff
                    ),
                    _ => format!(
                        "DELETE cache behavior `{}` from distribution {}",
                        path_pattern, distribution_id
                    ),
                };
                Ok(vec![connector_op!(op, message)])
            }
            CloudFrontResourceAddress::Origin {
                distribution_id,
                origin_id,
            } => {
                let current: Option<Origin> = parse(current)?;
                let desired: Option<Origin> = parse(desired)?;
                let diff = match (&current, &desired) {
                    (Some(old), Some(new)) => diff_ron_values(old, new).unwrap_or_default(),
                    _ => String::new(),
                };

                let Some(op) = plan_origin(current, desired)? else {
                    return Ok(vec![]);
                };

                let message = match op {
                    CloudFrontConnectorOp::AddOrigin(_) => {
                        format!("Add origin `{}` to distribution {}", origin_id, distribution_id)
                    }
                    CloudFrontConnectorOp::UpdateOrigin(_) => format!(
                        "Modify origin `{}` on distribution {}\n{}",
                        origin_id, distribution_id, diff
                    ),
                    _ => format!("DELETE origin `{}` from distribution {}", origin_id, distribution_id),
                };
                Ok(vec![connector_op!(op, message)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ValidationError;

    fn behavior(target: &str) -> CacheBehavior {
        RON.from_str(&format!(
            r#"CacheBehavior(
                target_origin_id: "{target}",
                viewer_protocol_policy: "allow-all",
                allowed_methods: ["GET", "HEAD"],
                cached_methods: ["GET", "HEAD"],
                forwarded_values: (query_string: false, cookies: (forward: "none")),
            )"#
        ))
        .unwrap()
    }

    fn origin(domain_name: &str) -> Origin {
        RON.from_str(&format!(r#"Origin(domain_name: "{domain_name}")"#)).unwrap()
    }

    #[test]
    fn cache_behavior_lifecycle() {
        assert_eq!(plan_cache_behavior(None, None).unwrap(), None);
        assert_eq!(
            plan_cache_behavior(None, Some(behavior("a"))).unwrap(),
            Some(CloudFrontConnectorOp::AddCacheBehavior(behavior("a")))
        );
        assert_eq!(
            plan_cache_behavior(Some(behavior("a")), Some(behavior("b"))).unwrap(),
            Some(CloudFrontConnectorOp::UpdateCacheBehavior(behavior("b")))
        );
        assert_eq!(
            plan_cache_behavior(Some(behavior("a")), None).unwrap(),
            Some(CloudFrontConnectorOp::RemoveCacheBehavior)
        );
    }

    #[test]
    fn reordered_methods_plan_nothing() {
        let mut reordered = behavior("a");
        reordered.allowed_methods.reverse();
        assert_eq!(plan_cache_behavior(Some(behavior("a")), Some(reordered)).unwrap(), None);
    }

    #[test]
    fn invalid_desired_state_fails_planning() {
        let err = plan_cache_behavior(None, Some(behavior(""))).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::Empty("target_origin_id"))
        );
    }

    #[test]
    fn origin_lifecycle() {
        assert_eq!(
            plan_origin(None, Some(origin("a.example.com"))).unwrap(),
            Some(CloudFrontConnectorOp::AddOrigin(origin("a.example.com")))
        );
        assert_eq!(plan_origin(Some(origin("a.example.com")), Some(origin("a.example.com"))).unwrap(), None);
        assert_eq!(
            plan_origin(Some(origin("a.example.com")), Some(origin("b.example.com"))).unwrap(),
            Some(CloudFrontConnectorOp::UpdateOrigin(origin("b.example.com")))
        );
        assert_eq!(
            plan_origin(Some(origin("a.example.com")), None).unwrap(),
            Some(CloudFrontConnectorOp::RemoveOrigin)
        );
    }

    #[tokio::test]
    async fn plan_emits_one_op_per_change() {
        let connector = CloudFrontConnector::default();
        let addr = Path::new("aws/cloudfront/distributions/E2QWRUHAPOMQZL/origins/assets.ron");

        let ops = connector
            .do_plan(addr, None, Some(String::from(r#"Origin(domain_name: "assets.example.com")"#)))
            .await
            .unwrap();
        assert_eq!(ops.len(), 1);

        let ops = connector.do_plan(addr, None, None).await.unwrap();
        assert!(ops.is_empty());
    }

    #[tokio::test]
    async fn empty_origin_id_is_not_planned() {
        let connector = CloudFrontConnector::default();
        let addr = Path::new("aws/cloudfront/distributions/E2QWRUHAPOMQZL/origins/.ron");

        let res = connector
            .do_plan(addr, None, Some(String::from(r#"Origin(domain_name: "a.example.com")"#)))
            .await;
        assert!(res.is_err());
    }
}
