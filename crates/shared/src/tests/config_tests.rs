use super::*;
use serde_json::json;

#[test]
fn method_parses_case_insensitively_and_defaults_to_get() {
    assert_eq!("patch".parse::<Method>().expect("patch"), Method::Patch);
    assert_eq!(" Delete ".parse::<Method>().expect("delete"), Method::Delete);
    assert_eq!(RequestConfig::new().method().expect("default"), Method::Get);
}

#[test]
fn unknown_method_is_a_configuration_error() {
    let config = RequestConfig::new().set(keys::METHOD, "FETCH");
    let err = config.method().expect_err("unknown method");
    assert_eq!(err.kind(), crate::FailureKind::InvalidConfig);
}

#[test]
fn header_and_param_builders_accumulate_into_nested_objects() {
    let config = RequestConfig::new()
        .with_header("x-trace", "abc")
        .with_header("accept", "application/json")
        .with_param("page", 2)
        .with_param("q", "rust");

    let mut headers = config.headers();
    headers.sort();
    assert_eq!(
        headers,
        vec![
            ("accept".to_string(), "application/json".to_string()),
            ("x-trace".to_string(), "abc".to_string()),
        ]
    );

    let mut params = config.params();
    params.sort();
    assert_eq!(
        params,
        vec![
            ("page".to_string(), "2".to_string()),
            ("q".to_string(), "rust".to_string()),
        ]
    );
}

#[test]
fn header_builder_replaces_non_object_headers_value() {
    let config = RequestConfig::new()
        .set(keys::HEADERS, "broken")
        .with_header("x-a", "1");
    assert_eq!(config.headers(), vec![("x-a".to_string(), "1".to_string())]);
}

#[test]
fn null_body_reads_as_absent() {
    let config = RequestConfig::new().with_body(json!(null));
    assert!(config.body().is_none());
    let config = RequestConfig::new().with_body(json!({"name": "next"}));
    assert_eq!(config.body(), Some(&json!({"name": "next"})));
}

#[test]
fn overlay_prefers_the_incoming_keys() {
    let mut base: RequestConfig = [("a", json!(1)), ("b", json!(2))].into_iter().collect();
    let incoming: RequestConfig = [("b", json!(3))].into_iter().collect();
    base.overlay(&incoming);
    let expected: RequestConfig = [("a", json!(1)), ("b", json!(3))].into_iter().collect();
    assert_eq!(base, expected);
}

#[test]
fn try_from_value_accepts_objects_and_null_only() {
    let config = RequestConfig::try_from(json!({"endpoint": "/items"})).expect("object");
    assert_eq!(config.endpoint(), Some("/items"));
    assert!(RequestConfig::try_from(json!(null)).expect("null").is_empty());
    assert!(RequestConfig::try_from(json!([1, 2])).is_err());
}

#[test]
fn duration_from_millis_rejects_non_finite_and_negative_values() {
    assert_eq!(duration_from_millis(1500.0), Some(Duration::from_millis(1500)));
    assert_eq!(duration_from_millis(0.0), Some(Duration::ZERO));
    assert_eq!(duration_from_millis(f64::INFINITY), None);
    assert_eq!(duration_from_millis(f64::NAN), None);
    assert_eq!(duration_from_millis(-1.0), None);
}

#[test]
fn timeout_reads_numeric_milliseconds() {
    let config = RequestConfig::new().with_timeout(Duration::from_millis(250));
    assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    let config = RequestConfig::new().set(keys::TIMEOUT_MS, "soon");
    assert_eq!(config.timeout(), None);
}

#[test]
fn huge_finite_millis_saturate_instead_of_failing() {
    assert_eq!(duration_from_millis(1e300), Some(Duration::MAX));
    assert_eq!(duration_from_millis(f64::MAX), Some(Duration::MAX));
    assert_eq!(duration_from_millis(-0.0), Some(Duration::ZERO));

    let config = RequestConfig::new().set(keys::TIMEOUT_MS, 1e300);
    assert_eq!(config.timeout(), Some(Duration::MAX));
}

#[test]
fn timeout_builder_saturates_oversized_durations() {
    let config = RequestConfig::new().with_timeout(Duration::MAX);
    assert_eq!(config.get(keys::TIMEOUT_MS), Some(&json!(u64::MAX)));
}
