use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde_json::json;

use crate::admission_review::AdmissionRequest;

pub(crate) fn deployment_object(name: &str, namespace: &str) -> serde_json::Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
        },
    })
}

pub(crate) fn admission_review_body(uid: &str, object: Option<serde_json::Value>) -> Vec<u8> {
    let mut request = json!({
        "uid": uid,
        "kind": {"group": "apps", "version": "v1", "kind": "Deployment"},
        "resource": {"group": "apps", "version": "v1", "resource": "deployments"},
        "operation": "CREATE",
        "userInfo": {"username": "admin"},
    });
    if let Some(object) = object {
        request["object"] = object;
    }

    serde_json::to_vec(&json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": request,
    }))
    .expect("serialization should work")
}

pub(crate) fn admission_request(uid: &str, object: Option<serde_json::Value>) -> AdmissionRequest {
    AdmissionRequest {
        uid: uid.to_owned(),
        kind: None,
        resource: None,
        sub_resource: None,
        request_kind: None,
        request_resource: None,
        request_sub_resource: None,
        name: None,
        namespace: None,
        operation: Some(String::from("CREATE")),
        user_info: None,
        object: object.map(RawExtension),
        old_object: None,
        dry_run: None,
        options: None,
    }
}
