//! Integration tests for RPC Register Core
//!
//! This test suite covers:
//! - Request bodies as posted by registering services
//! - Normalization for every dialect
//! - Error taxonomy surfaced to the front door

use rpc_register_core::{
    DubboNormalizer, GrpcNormalizer, MetaDataRegisterRequest, Normalizer, RegisterError,
    RegisterPayload, RpcType, SofaNormalizer, SpringCloudNormalizer, SpringMvcNormalizer,
    TarsNormalizer,
};
use serde_json::json;

fn normalize_json<N: Normalizer>(body: serde_json::Value) -> Result<RegisterPayload, RegisterError> {
    let request: N::Request = serde_json::from_value(body).expect("request body should deserialize");
    N::normalize(request)
}

fn rpc_body() -> serde_json::Value {
    json!({
        "appName": "order-service",
        "contextPath": "/order",
        "path": "/order/getOrder",
        "serviceName": "OrderService",
        "methodName": "GetOrder",
        "parameterTypes": "java.lang.Long",
        "host": "192.168.1.20",
        "port": 20880
    })
}

mod normalize_tests {
    use super::*;

    #[test]
    fn test_every_dialect_tags_its_payload() {
        let http = normalize_json::<SpringMvcNormalizer>(json!({
            "appName": "order-service",
            "context": "/order",
            "path": "/order/list",
            "host": "192.168.1.20",
            "port": 8080
        }))
        .unwrap();
        let cloud = normalize_json::<SpringCloudNormalizer>(json!({
            "appName": "order-service",
            "path": "/order/list"
        }))
        .unwrap();
        let dubbo = normalize_json::<DubboNormalizer>(rpc_body()).unwrap();
        let sofa = normalize_json::<SofaNormalizer>(rpc_body()).unwrap();
        let tars = normalize_json::<TarsNormalizer>(rpc_body()).unwrap();
        let grpc = normalize_json::<GrpcNormalizer>(rpc_body()).unwrap();

        assert_eq!(http.rpc_type(), RpcType::Http);
        assert_eq!(cloud.rpc_type(), RpcType::SpringCloud);
        assert_eq!(dubbo.rpc_type(), RpcType::Dubbo);
        assert_eq!(sofa.rpc_type(), RpcType::Sofa);
        assert_eq!(tars.rpc_type(), RpcType::Tars);
        assert_eq!(grpc.rpc_type(), RpcType::Grpc);
    }

    #[test]
    fn test_grpc_record_fields() {
        let payload = normalize_json::<GrpcNormalizer>(rpc_body()).unwrap();
        let RegisterPayload::MetaData(record) = payload else {
            panic!("expected metadata payload");
        };

        assert_eq!(record.service_name, "OrderService");
        assert_eq!(record.method_name, "GetOrder");
        assert_eq!(record.parameter_types.as_deref(), Some("java.lang.Long"));
        assert_eq!(record.upstream_url().as_deref(), Some("192.168.1.20:20880"));
        assert_eq!(record.rule_name, "/order/getOrder");
    }

    #[test]
    fn test_empty_body_is_a_validation_error() {
        let err = normalize_json::<DubboNormalizer>(json!({})).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_default_request_is_rejected() {
        let err = SofaNormalizer::normalize(MetaDataRegisterRequest::default()).unwrap_err();
        assert!(matches!(err, RegisterError::MissingField { .. }));
    }
}

mod payload_tests {
    use super::*;

    #[test]
    fn test_payload_round_trips_through_json() {
        let payload = normalize_json::<TarsNormalizer>(rpc_body()).unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["kind"], "metaData");
        assert_eq!(value["rpcType"], "tars");

        let back: RegisterPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_partition_key_is_selector_key() {
        let mut other_path = rpc_body();
        other_path["path"] = json!("/order/listOrders");

        // Paths of one context share the selector, so they share the key.
        let a = normalize_json::<DubboNormalizer>(rpc_body()).unwrap();
        let b = normalize_json::<DubboNormalizer>(other_path).unwrap();
        assert_eq!(a.partition_key(), b.partition_key());
        assert_eq!(a.partition_key(), "dubbo:/order");

        let grpc = normalize_json::<GrpcNormalizer>(rpc_body()).unwrap();
        assert_eq!(grpc.partition_key(), "grpc:/order");
    }
}
