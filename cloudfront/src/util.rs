use anyhow::Context;
use aws_sdk_cloudfront::{
    error::SdkError,
    operation::{get_distribution_config::GetDistributionConfigError, update_distribution::UpdateDistributionError},
    types::{DistributionConfig, DistributionSummary},
};

pub fn encode_key(key: &str) -> String {
    urlencoding::encode(key).to_string()
}

pub fn decode_key(encoded: &str) -> anyhow::Result<String> {
    Ok(urlencoding::decode(encoded)?.to_string())
}

pub fn is_no_such_distribution<R>(err: &SdkError<GetDistributionConfigError, R>) -> bool {
    err.as_service_error().is_some_and(|e| e.is_no_such_distribution())
}

/// ACM and IAM certificates are eventually consistent: a freshly issued certificate can
/// be rejected for a short while after it was created.
pub fn is_invalid_viewer_certificate<R>(err: &SdkError<UpdateDistributionError, R>) -> bool {
    err.as_service_error().is_some_and(|e| e.is_invalid_viewer_certificate())
}

/// Fetches a distribution's config together with its ETag.
/// Returns `None` if the distribution does not exist.
pub async fn get_distribution_config(
    distribution_id: &str,
    client: &aws_sdk_cloudfront::Client,
) -> anyhow::Result<Option<(String, DistributionConfig)>> {
    let get_response = match client.get_distribution_config().id(distribution_id).send().await {
        Ok(resp) => resp,
        Err(e) if is_no_such_distribution(&e) => {
            tracing::warn!("No Distribution found: {}", distribution_id);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let config = get_response.distribution_config().context("No distribution config")?.clone();
    let etag = get_response.e_tag().context("No ETag in response")?;
    Ok(Some((etag.to_string(), config)))
}

pub async fn list_distributions(client: &aws_sdk_cloudfront::Client) -> anyhow::Result<Vec<DistributionSummary>> {
    let mut results = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let list_result = client.list_distributions().set_marker(marker.take()).send().await?;

        let Some(distribution_list) = list_result.distribution_list() else {
            break;
        };

        results.extend(distribution_list.items().iter().cloned());

        match distribution_list.next_marker() {
            Some(next) if distribution_list.is_truncated() => marker = Some(next.to_string()),
            _ => break,
        }
    }

    Ok(results)
}
