use std::time::Duration;

use anyhow::anyhow;
use autoschematic_connector_aws_core::{
    merge::{Keyed, add_items, quantity, remove_items, update_items},
    retry::{RetryError, retry_for},
};
use autoschematic_core::{connector::OpExecOutput, op_exec_output};
use aws_sdk_cloudfront::{
    error::{DisplayErrorContext, SdkError},
    operation::update_distribution::UpdateDistributionError,
    types::{self as cf, CacheBehaviors, DistributionConfig, Origins},
};

use crate::{
    convert::{cache_behavior_to_sdk, origin_to_sdk},
    resource::{CacheBehavior, Origin},
    util::{get_distribution_config, is_invalid_viewer_certificate},
};

pub const UPDATE_RETRY_BUDGET: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WritePolicy {
    Once,
    /// Retry for up to a minute while CloudFront rejects the viewer certificate.
    RetryOnInvalidCertificate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Edit<T> {
    Add(T),
    Update(T),
    Remove(String),
}

fn apply_edit<T: Keyed>(items: &mut Vec<T>, edit: Edit<T>) {
    match edit {
        Edit::Add(item) => add_items(items, [item]),
        Edit::Update(item) => update_items(items, [item]),
        Edit::Remove(key) => {
            let removed = remove_items(items, &[key.as_str()]);
            if removed == 0 {
                tracing::warn!("{} is not present in the distribution config", key);
            }
        }
    }
}

pub fn edit_cache_behaviors(config: &mut DistributionConfig, edit: Edit<cf::CacheBehavior>) -> anyhow::Result<()> {
    let mut items = config.cache_behaviors().map(|cb| cb.items().to_vec()).unwrap_or_default();
    apply_edit(&mut items, edit);

    config.cache_behaviors = Some(
        CacheBehaviors::builder()
            .quantity(quantity(&items)?)
            .set_items(if items.is_empty() { None } else { Some(items) })
            .build()?,
    );
    Ok(())
}

pub fn edit_origins(config: &mut DistributionConfig, edit: Edit<cf::Origin>) -> anyhow::Result<()> {
    let mut items = config.origins().map(|o| o.items().to_vec()).unwrap_or_default();
    apply_edit(&mut items, edit);

    config.origins = Some(Origins::builder().quantity(quantity(&items)?).set_items(Some(items)).build()?);
    Ok(())
}

impl<T> Edit<T> {
    /// Additions are written once. Updates and removals wait out freshly issued certificates.
    pub fn write_policy(&self) -> WritePolicy {
        match self {
            Edit::Add(_) => WritePolicy::Once,
            Edit::Update(_) | Edit::Remove(_) => WritePolicy::RetryOnInvalidCertificate,
        }
    }
}

pub fn classify_update_error<R>(
    policy: WritePolicy,
    err: SdkError<UpdateDistributionError, R>,
) -> RetryError<SdkError<UpdateDistributionError, R>> {
    match policy {
        WritePolicy::RetryOnInvalidCertificate if is_invalid_viewer_certificate(&err) => RetryError::Retryable(err),
        _ => RetryError::NonRetryable(err),
    }
}

async fn write_distribution_config(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    etag: &str,
    config: &DistributionConfig,
    policy: WritePolicy,
) -> anyhow::Result<()> {
    retry_for(UPDATE_RETRY_BUDGET, || async move {
        client
            .update_distribution()
            .id(distribution_id)
            .distribution_config(config.clone())
            .if_match(etag)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| classify_update_error(policy, e))
    })
    .await
    .map_err(|e| {
        anyhow!(
            "CloudFront Distribution {} cannot be updated: {}",
            distribution_id,
            DisplayErrorContext(&e)
        )
    })
}

/// Fetches the distribution config, applies `edit` through `apply` and writes it back
/// guarded by the fetched ETag. Returns `false` without writing if the distribution does not exist.
pub async fn reconcile_distribution<T>(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    edit: Edit<T>,
    apply: fn(&mut DistributionConfig, Edit<T>) -> anyhow::Result<()>,
) -> anyhow::Result<bool> {
    let policy = edit.write_policy();

    let Some((etag, mut config)) = get_distribution_config(distribution_id, client).await? else {
        return Ok(false);
    };

    apply(&mut config, edit)?;

    write_distribution_config(client, distribution_id, &etag, &config, policy).await?;
    Ok(true)
}

pub async fn add_cache_behavior(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    path_pattern: &str,
    behavior: &CacheBehavior,
) -> Result<OpExecOutput, anyhow::Error> {
    let item = cache_behavior_to_sdk(path_pattern, behavior)?;

    let found = reconcile_distribution(client, distribution_id, Edit::Add(item), edit_cache_behaviors)
    .await?;

    if !found {
        return op_exec_output!(format!(
            "Distribution {} not found, cache behavior {} was not added",
            distribution_id, path_pattern
        ));
    }

    op_exec_output!(format!(
        "Added cache behavior {} to distribution {}",
        path_pattern, distribution_id
    ))
}

pub async fn update_cache_behavior(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    path_pattern: &str,
    behavior: &CacheBehavior,
) -> Result<OpExecOutput, anyhow::Error> {
    let item = cache_behavior_to_sdk(path_pattern, behavior)?;

    let found = reconcile_distribution(client, distribution_id, Edit::Update(item), edit_cache_behaviors)
    .await?;

    if !found {
        return op_exec_output!(format!(
            "Distribution {} not found, cache behavior {} was not updated",
            distribution_id, path_pattern
        ));
    }

    op_exec_output!(format!(
        "Updated cache behavior {} on distribution {}",
        path_pattern, distribution_id
    ))
}

pub async fn remove_cache_behavior(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    path_pattern: &str,
) -> Result<OpExecOutput, anyhow::Error> {
    let found = reconcile_distribution(client, distribution_id, Edit::Remove(path_pattern.to_string()), edit_cache_behaviors)
    .await?;

    if !found {
        return op_exec_output!(format!(
            "Distribution {} not found, nothing to remove for cache behavior {}",
            distribution_id, path_pattern
        ));
    }

    op_exec_output!(format!(
        "Removed cache behavior {} from distribution {}",
        path_pattern, distribution_id
    ))
}

pub async fn add_origin(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    origin_id: &str,
    origin: &Origin,
) -> Result<OpExecOutput, anyhow::Error> {
    let item = origin_to_sdk(origin_id, origin)?;

    let found = reconcile_distribution(client, distribution_id, Edit::Add(item), edit_origins)
    .await?;

    if !found {
        return op_exec_output!(format!(
            "Distribution {} not found, origin {} was not added",
            distribution_id, origin_id
        ));
    }

    op_exec_output!(format!("Added origin {} to distribution {}", origin_id, distribution_id))
}

pub async fn update_origin(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    origin_id: &str,
    origin: &Origin,
) -> Result<OpExecOutput, anyhow::Error> {
    let item = origin_to_sdk(origin_id, origin)?;

    let found = reconcile_distribution(client, distribution_id, Edit::Update(item), edit_origins)
    .await?;

    if !found {
        return op_exec_output!(format!(
            "Distribution {} not found, origin {} was not updated",
            distribution_id, origin_id
        ));
    }

    op_exec_output!(format!("Updated origin {} on distribution {}", origin_id, distribution_id))
}

pub async fn remove_origin(
    client: &aws_sdk_cloudfront::Client,
    distribution_id: &str,
    origin_id: &str,
) -> Result<OpExecOutput, anyhow::Error> {
    let found = reconcile_distribution(client, distribution_id, Edit::Remove(origin_id.to_string()), edit_origins)
    .await?;

    if !found {
        return op_exec_output!(format!(
            "Distribution {} not found, nothing to remove for origin {}",
            distribution_id, origin_id
        ));
    }

    op_exec_output!(format!("Removed origin {} from distribution {}", origin_id, distribution_id))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use aws_sdk_cloudfront::types::error::{InvalidViewerCertificate, PreconditionFailed};

    use super::*;

    fn invalid_certificate() -> SdkError<UpdateDistributionError, ()> {
        SdkError::service_error(
            UpdateDistributionError::InvalidViewerCertificate(
                InvalidViewerCertificate::builder()
                    .message("The specified SSL certificate doesn't exist")
                    .build(),
            ),
            (),
        )
    }

    fn precondition_failed() -> SdkError<UpdateDistributionError, ()> {
        SdkError::service_error(
            UpdateDistributionError::PreconditionFailed(PreconditionFailed::builder().message("stale ETag").build()),
            (),
        )
    }

    async fn write_attempts(policy: WritePolicy, err: fn() -> SdkError<UpdateDistributionError, ()>) -> u32 {
        let calls = &AtomicU32::new(0);
        let res: Result<(), _> = retry_for(UPDATE_RETRY_BUDGET, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(classify_update_error(policy, err()))
        })
        .await;
        assert!(res.is_err());
        calls.load(Ordering::SeqCst)
    }

    #[test]
    fn only_additions_are_written_once() {
        assert_eq!(Edit::Add(()).write_policy(), WritePolicy::Once);
        assert_eq!(Edit::Update(()).write_policy(), WritePolicy::RetryOnInvalidCertificate);
        assert_eq!(
            Edit::<()>::Remove(String::from("/a/*")).write_policy(),
            WritePolicy::RetryOnInvalidCertificate
        );
    }

    #[test]
    fn invalid_certificate_is_retryable_only_when_allowed() {
        assert!(matches!(
            classify_update_error(WritePolicy::RetryOnInvalidCertificate, invalid_certificate()),
            RetryError::Retryable(_)
        ));
        assert!(matches!(
            classify_update_error(WritePolicy::Once, invalid_certificate()),
            RetryError::NonRetryable(_)
        ));
        assert!(matches!(
            classify_update_error(WritePolicy::RetryOnInvalidCertificate, precondition_failed()),
            RetryError::NonRetryable(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn updates_wait_out_invalid_certificates() {
        assert!(write_attempts(WritePolicy::RetryOnInvalidCertificate, invalid_certificate).await > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn creates_and_other_errors_fail_fast() {
        assert_eq!(write_attempts(WritePolicy::Once, invalid_certificate).await, 1);
        assert_eq!(write_attempts(WritePolicy::RetryOnInvalidCertificate, precondition_failed).await, 1);
    }

    fn sdk_behavior(path_pattern: &str, target: &str) -> cf::CacheBehavior {
        cf::CacheBehavior::builder()
            .path_pattern(path_pattern)
            .target_origin_id(target)
            .viewer_protocol_policy(cf::ViewerProtocolPolicy::AllowAll)
            .build()
            .unwrap()
    }

    fn sdk_origin(id: &str, domain_name: &str) -> cf::Origin {
        cf::Origin::builder().id(id).domain_name(domain_name).build().unwrap()
    }

    fn distribution_config() -> DistributionConfig {
        DistributionConfig::builder()
            .caller_reference("test")
            .comment("")
            .enabled(true)
            .origins(
                Origins::builder()
                    .quantity(1)
                    .items(sdk_origin("default", "default.example.com"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    fn behavior_keys(config: &DistributionConfig) -> Vec<(String, String)> {
        config
            .cache_behaviors()
            .map(|cb| {
                cb.items()
                    .iter()
                    .map(|b| (b.path_pattern().to_string(), b.target_origin_id().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn cache_behaviors_are_added_to_an_empty_config() {
        let mut config = distribution_config();
        assert!(config.cache_behaviors().is_none());

        edit_cache_behaviors(&mut config, Edit::Add(sdk_behavior("/api/*", "api"))).unwrap();
        edit_cache_behaviors(&mut config, Edit::Add(sdk_behavior("/img/*", "assets"))).unwrap();

        assert_eq!(config.cache_behaviors().unwrap().quantity(), 2);
        assert_eq!(
            behavior_keys(&config),
            vec![
                (String::from("/api/*"), String::from("api")),
                (String::from("/img/*"), String::from("assets")),
            ]
        );
    }

    #[test]
    fn cache_behavior_update_keeps_position_and_quantity() {
        let mut config = distribution_config();
        for (p, t) in [("/a/*", "o1"), ("/b/*", "o1"), ("/c/*", "o1")] {
            edit_cache_behaviors(&mut config, Edit::Add(sdk_behavior(p, t))).unwrap();
        }

        edit_cache_behaviors(&mut config, Edit::Update(sdk_behavior("/b/*", "o2"))).unwrap();

        assert_eq!(config.cache_behaviors().unwrap().quantity(), 3);
        assert_eq!(behavior_keys(&config)[1], (String::from("/b/*"), String::from("o2")));
    }

    #[test]
    fn removing_the_last_cache_behavior_clears_items() {
        let mut config = distribution_config();
        edit_cache_behaviors(&mut config, Edit::Add(sdk_behavior("/a/*", "o1"))).unwrap();
        edit_cache_behaviors(&mut config, Edit::Remove(String::from("/a/*"))).unwrap();

        let cb = config.cache_behaviors().unwrap();
        assert_eq!(cb.quantity(), 0);
        assert!(cb.items().is_empty());
    }

    #[test]
    fn origins_are_edited_by_id() {
        let mut config = distribution_config();

        edit_origins(&mut config, Edit::Add(sdk_origin("api", "api.example.com"))).unwrap();
        edit_origins(&mut config, Edit::Update(sdk_origin("default", "new.example.com"))).unwrap();

        let origins = config.origins().unwrap();
        assert_eq!(origins.quantity(), 2);
        assert_eq!(origins.items()[0].domain_name(), "new.example.com");
        assert_eq!(origins.items()[1].id(), "api");

        edit_origins(&mut config, Edit::Remove(String::from("default"))).unwrap();
        let origins = config.origins().unwrap();
        assert_eq!(origins.quantity(), 1);
        assert_eq!(origins.items()[0].id(), "api");
    }
}
