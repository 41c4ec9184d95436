//! Mapping between the RON resource definitions and the CloudFront SDK types.

use autoschematic_connector_aws_core::merge::{Keyed, quantity};
use aws_sdk_cloudfront::types as cf;

use crate::resource::{
    CacheBehavior, CookiePreference, CustomHeader, CustomOriginConfig, ForwardedValues, LambdaFunctionAssociation, Origin,
    S3OriginConfig,
};

impl Keyed for cf::CacheBehavior {
    fn key(&self) -> &str {
        self.path_pattern()
    }
}

impl Keyed for cf::Origin {
    fn key(&self) -> &str {
        self.id()
    }
}

fn strings(items: &[String]) -> Option<Vec<String>> {
    if items.is_empty() { None } else { Some(items.to_vec()) }
}

fn methods(items: &[String]) -> Vec<cf::Method> {
    items.iter().map(|m| cf::Method::from(m.as_str())).collect()
}

fn method_names(items: &[cf::Method]) -> Vec<String> {
    items.iter().map(|m| m.as_str().to_string()).collect()
}

pub fn cache_behavior_to_sdk(path_pattern: &str, behavior: &CacheBehavior) -> anyhow::Result<cf::CacheBehavior> {
    let cached_methods = cf::CachedMethods::builder()
        .quantity(quantity(&behavior.cached_methods)?)
        .set_items(Some(methods(&behavior.cached_methods)))
        .build()?;

    let allowed_methods = cf::AllowedMethods::builder()
        .quantity(quantity(&behavior.allowed_methods)?)
        .set_items(Some(methods(&behavior.allowed_methods)))
        .cached_methods(cached_methods)
        .build()?;

    let lambda_function_associations = cf::LambdaFunctionAssociations::builder()
        .quantity(quantity(&behavior.lambda_function_associations)?)
        .set_items(if behavior.lambda_function_associations.is_empty() {
            None
        } else {
            Some(
                behavior
                    .lambda_function_associations
                    .iter()
                    .map(|lfa| {
                        cf::LambdaFunctionAssociation::builder()
                            .event_type(cf::EventType::from(lfa.event_type.as_str()))
                            .lambda_function_arn(&lfa.lambda_arn)
                            .build()
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            )
        })
        .build()?;

    let trusted_signers = cf::TrustedSigners::builder()
        .enabled(!behavior.trusted_signers.is_empty())
        .quantity(quantity(&behavior.trusted_signers)?)
        .set_items(strings(&behavior.trusted_signers))
        .build()?;

    Ok(cf::CacheBehavior::builder()
        .path_pattern(path_pattern)
        .target_origin_id(&behavior.target_origin_id)
        .viewer_protocol_policy(cf::ViewerProtocolPolicy::from(behavior.viewer_protocol_policy.as_str()))
        .allowed_methods(allowed_methods)
        .compress(behavior.compress)
        .default_ttl(behavior.default_ttl)
        .max_ttl(behavior.max_ttl)
        .min_ttl(behavior.min_ttl)
        .set_field_level_encryption_id(behavior.field_level_encryption_id.clone())
        .forwarded_values(forwarded_values_to_sdk(&behavior.forwarded_values)?)
        .lambda_function_associations(lambda_function_associations)
        .set_smooth_streaming(behavior.smooth_streaming)
        .trusted_signers(trusted_signers)
        .build()?)
}

fn forwarded_values_to_sdk(fv: &ForwardedValues) -> anyhow::Result<cf::ForwardedValues> {
    let mut cookies = cf::CookiePreference::builder().forward(cf::ItemSelection::from(fv.cookies.forward.as_str()));
    if !fv.cookies.whitelisted_names.is_empty() {
        cookies = cookies.whitelisted_names(
            cf::CookieNames::builder()
                .quantity(quantity(&fv.cookies.whitelisted_names)?)
                .set_items(strings(&fv.cookies.whitelisted_names))
                .build()?,
        );
    }

    Ok(cf::ForwardedValues::builder()
        .query_string(fv.query_string)
        .cookies(cookies.build()?)
        .headers(
            cf::Headers::builder()
                .quantity(quantity(&fv.headers)?)
                .set_items(strings(&fv.headers))
                .build()?,
        )
        .query_string_cache_keys(
            cf::QueryStringCacheKeys::builder()
                .quantity(quantity(&fv.query_string_cache_keys)?)
                .set_items(strings(&fv.query_string_cache_keys))
                .build()?,
        )
        .build()?)
}

pub fn cache_behavior_from_sdk(cb: &cf::CacheBehavior) -> CacheBehavior {
    let (allowed_methods, cached_methods) = match cb.allowed_methods() {
        Some(am) => (
            method_names(am.items()),
            am.cached_methods().map(|cm| method_names(cm.items())).unwrap_or_default(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let forwarded_values = match cb.forwarded_values() {
        Some(fv) => ForwardedValues {
            query_string: fv.query_string(),
            query_string_cache_keys: fv.query_string_cache_keys().map(|k| k.items().to_vec()).unwrap_or_default(),
            headers: fv.headers().map(|h| h.items().to_vec()).unwrap_or_default(),
            cookies: CookiePreference {
                forward: fv
                    .cookies()
                    .map(|c| c.forward().as_str().to_string())
                    .unwrap_or_else(|| String::from("none")),
                whitelisted_names: fv
                    .cookies()
                    .and_then(|c| c.whitelisted_names())
                    .map(|n| n.items().to_vec())
                    .unwrap_or_default(),
            },
        },
        None => ForwardedValues {
            query_string: false,
            query_string_cache_keys: Vec::new(),
            headers: Vec::new(),
            cookies: CookiePreference {
                forward: String::from("none"),
                whitelisted_names: Vec::new(),
            },
        },
    };

    CacheBehavior {
        target_origin_id: cb.target_origin_id().to_string(),
        viewer_protocol_policy: cb.viewer_protocol_policy().as_str().to_string(),
        allowed_methods,
        cached_methods,
        compress: cb.compress().unwrap_or(false),
        default_ttl: cb.default_ttl().unwrap_or(86400),
        max_ttl: cb.max_ttl().unwrap_or(31536000),
        min_ttl: cb.min_ttl().unwrap_or(0),
        field_level_encryption_id: cb.field_level_encryption_id().map(String::from),
        forwarded_values,
        lambda_function_associations: cb
            .lambda_function_associations()
            .map(|lfas| {
                lfas.items()
                    .iter()
                    .map(|lfa| LambdaFunctionAssociation {
                        event_type: lfa.event_type().as_str().to_string(),
                        lambda_arn: lfa.lambda_function_arn().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        smooth_streaming: cb.smooth_streaming(),
        trusted_signers: cb.trusted_signers().map(|ts| ts.items().to_vec()).unwrap_or_default(),
    }
    .normalized()
}

pub fn origin_to_sdk(origin_id: &str, origin: &Origin) -> anyhow::Result<cf::Origin> {
    let custom_headers = cf::CustomHeaders::builder()
        .quantity(quantity(&origin.custom_headers)?)
        .set_items(if origin.custom_headers.is_empty() {
            None
        } else {
            Some(
                origin
                    .custom_headers
                    .iter()
                    .map(|h| {
                        cf::OriginCustomHeader::builder()
                            .header_name(&h.name)
                            .header_value(&h.value)
                            .build()
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            )
        })
        .build()?;

    let mut builder = cf::Origin::builder()
        .id(origin_id)
        .domain_name(&origin.domain_name)
        .origin_path(origin.origin_path.clone().unwrap_or_default())
        .custom_headers(custom_headers);

    if let Some(s3) = &origin.s3_origin_config {
        builder = builder.s3_origin_config(
            cf::S3OriginConfig::builder()
                .origin_access_identity(&s3.origin_access_identity)
                .build()?,
        );
    }

    if let Some(custom) = &origin.custom_origin_config {
        builder = builder.custom_origin_config(
            cf::CustomOriginConfig::builder()
                .http_port(custom.http_port)
                .https_port(custom.https_port)
                .origin_protocol_policy(cf::OriginProtocolPolicy::from(custom.origin_protocol_policy.as_str()))
                .origin_ssl_protocols(
                    cf::OriginSslProtocols::builder()
                        .quantity(quantity(&custom.origin_ssl_protocols)?)
                        .set_items(Some(
                            custom
                                .origin_ssl_protocols
                                .iter()
                                .map(|p| cf::SslProtocol::from(p.as_str()))
                                .collect(),
                        ))
                        .build()?,
                )
                .origin_keepalive_timeout(custom.origin_keepalive_timeout)
                .origin_read_timeout(custom.origin_read_timeout)
                .build()?,
        );
    }

    Ok(builder.build()?)
}

pub fn origin_from_sdk(o: &cf::Origin) -> Origin {
    Origin {
        domain_name: o.domain_name().to_string(),
        origin_path: o.origin_path().map(String::from),
        custom_headers: o
            .custom_headers()
            .map(|ch| {
                ch.items()
                    .iter()
                    .map(|h| CustomHeader {
                        name:  h.header_name().to_string(),
                        value: h.header_value().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        custom_origin_config: o.custom_origin_config().map(|c| CustomOriginConfig {
            http_port: c.http_port(),
            https_port: c.https_port(),
            origin_protocol_policy: c.origin_protocol_policy().as_str().to_string(),
            origin_ssl_protocols: c
                .origin_ssl_protocols()
                .map(|p| p.items().iter().map(|p| p.as_str().to_string()).collect())
                .unwrap_or_default(),
            origin_keepalive_timeout: c.origin_keepalive_timeout().unwrap_or(5),
            origin_read_timeout: c.origin_read_timeout().unwrap_or(30),
        }),
        s3_origin_config: o.s3_origin_config().map(|s3| S3OriginConfig {
            origin_access_identity: s3.origin_access_identity().to_string(),
        }),
    }
    .normalized()
}
