use std::collections::BTreeMap;

use hyper::HeaderMap;
use swarm_capabilities::Policy;
use swarm_types::IngestError;

/// Input bound to the `auth` policy query, mirroring `original_source`'s `AuthPolicyInput`
/// (method/path/remote/query/header/body).
fn auth_input(
    method: &str,
    path: &str,
    remote: &str,
    query: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> serde_json::Value {
    let header_map: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();

    serde_json::json!({
        "method": method,
        "path": path,
        "remote": remote,
        "query": query,
        "header": header_map,
        "body": String::from_utf8_lossy(body),
    })
}

/// Calls the `auth` policy query with the request's shape and body (spec §10.6's Authorization
/// gate, "treated only as a gate calling the Policy capability" per spec §1). The decision is a
/// bare JSON bool: `true` allows, anything else (including a query error) denies.
pub async fn authorize(
    policy: &dyn Policy,
    method: &str,
    path: &str,
    remote: &str,
    query: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), IngestError> {
    let input = auth_input(method, path, remote, query, headers, body);
    // Any policy failure (including "no matching rule") denies, matching the original's
    // `if err := uc.Authorize(...); err != nil { 401 }`.
    let decision = policy.evaluate("auth", input).await.map_err(|_| IngestError::Unauthorized)?;
    if decision.as_bool().unwrap_or(false) {
        Ok(())
    } else {
        Err(IngestError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_capabilities::testing::StaticPolicy;

    #[tokio::test]
    async fn allows_when_policy_returns_true() {
        let policy = StaticPolicy::new();
        policy.set("auth", serde_json::json!(true));
        let headers = HeaderMap::new();
        assert!(authorize(&policy, "POST", "/event/pubsub/cs", "1.2.3.4", "", &headers, b"")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn denies_when_policy_returns_false() {
        let policy = StaticPolicy::new();
        policy.set("auth", serde_json::json!(false));
        let headers = HeaderMap::new();
        let err = authorize(&policy, "POST", "/event/pubsub/cs", "1.2.3.4", "", &headers, b"")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Unauthorized));
    }

    #[tokio::test]
    async fn denies_when_no_policy_registered() {
        let policy = StaticPolicy::new();
        let headers = HeaderMap::new();
        let err = authorize(&policy, "POST", "/event/pubsub/cs", "1.2.3.4", "", &headers, b"")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Unauthorized));
    }
}
