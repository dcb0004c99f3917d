use std::{fmt, marker::PhantomData};

use aic_core::ApiError;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{IdmError, IdmInstance};

/// CRUD access to one managed object type, e.g. `alpha_user`.
///
/// Every request is authenticated.
pub struct ManagedObject<T> {
    idm: IdmInstance,
    object_type: String,
    _object: PhantomData<fn() -> T>,
}

impl<T> Clone for ManagedObject<T> {
    fn clone(&self) -> Self {
        Self {
            idm: self.idm.clone(),
            object_type: self.object_type.clone(),
            _object: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ManagedObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedObject")
            .field("idm", &self.idm)
            .field("object_type", &self.object_type)
            .finish()
    }
}

impl<T: DeserializeOwned> ManagedObject<T> {
    #[allow(missing_docs)]
    pub fn new(idm: IdmInstance, object_type: impl Into<String>) -> Self {
        Self {
            idm,
            object_type: object_type.into(),
            _object: PhantomData,
        }
    }

    #[allow(missing_docs)]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    #[allow(missing_docs)]
    pub async fn read(&self, object_id: &str) -> Result<T, IdmError> {
        self.request(&format!("/{object_id}"), Method::GET, &[], None)
            .await
    }

    /// Create an object with a server-assigned id.
    pub async fn create(&self, attrs: &impl Serialize) -> Result<T, IdmError> {
        let body = to_body(attrs)?;
        self.request("", Method::POST, &[("_action", "create")], Some(&body))
            .await
    }

    /// Delete an object, returning its last state.
    pub async fn delete(&self, object_id: &str) -> Result<T, IdmError> {
        self.request(&format!("/{object_id}"), Method::DELETE, &[], None)
            .await
    }

    /// Replace an object, creating it under `object_id` if it does not exist.
    pub async fn put(&self, object_id: &str, attrs: &impl Serialize) -> Result<T, IdmError> {
        let body = to_body(attrs)?;
        self.request(&format!("/{object_id}"), Method::PUT, &[], Some(&body))
            .await
    }

    /// Apply patch operations (`[{ "operation": "replace", "field": ..., "value": ... }]`).
    pub async fn patch(&self, object_id: &str, operations: &impl Serialize) -> Result<T, IdmError> {
        let body = to_body(operations)?;
        self.request(&format!("/{object_id}"), Method::PATCH, &[], Some(&body))
            .await
    }

    async fn request(
        &self,
        path: &str,
        method: Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T, IdmError> {
        let endpoint = format!("/openidm/managed/{}{}", self.object_type, path);
        let value = self.idm.request(&endpoint, method, query, body, true).await?;
        Ok(serde_json::from_value(value).map_err(ApiError::from)?)
    }
}

fn to_body(attrs: &impl Serialize) -> Result<Value, IdmError> {
    Ok(serde_json::to_value(attrs).map_err(ApiError::from)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aic_core::AuthError;
    use aic_test::start_api_mock;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{IdmAuthStrategy, User};

    #[derive(Debug)]
    struct NoHeaders;

    #[async_trait::async_trait]
    impl IdmAuthStrategy for NoHeaders {
        async fn auth_header(&self) -> Result<HeaderMap, AuthError> {
            Ok(HeaderMap::new())
        }
    }

    fn users(server: &MockServer) -> ManagedObject<User> {
        let idm = IdmInstance::new(&server.uri(), Arc::new(NoHeaders)).unwrap();
        ManagedObject::new(idm, "alpha_user")
    }

    fn alice() -> Value {
        json!({ "_id": "u1", "_rev": "1", "userName": "alice", "mail": "alice@example.com" })
    }

    #[tokio::test]
    async fn read_targets_object_path() {
        let server = start_api_mock(vec![Mock::given(matchers::method("GET"))
            .and(matchers::path("/openidm/managed/alpha_user/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(alice()))])
        .await;

        let user = users(&server).read("u1").await.unwrap();
        assert_eq!(user.id.as_deref(), Some("u1"));
        assert_eq!(user.user_name.as_deref(), Some("alice"));
        assert_eq!(user.extra["_rev"], "1");
    }

    #[tokio::test]
    async fn create_uses_create_action() {
        let server = start_api_mock(vec![Mock::given(matchers::method("POST"))
            .and(matchers::path("/openidm/managed/alpha_user"))
            .and(matchers::query_param("_action", "create"))
            .and(matchers::body_json(json!({ "userName": "alice" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(alice()))
            .expect(1)])
        .await;

        let user = users(&server)
            .create(&json!({ "userName": "alice" }))
            .await
            .unwrap();
        assert_eq!(user.mail.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn put_patch_and_delete_send_bodies_to_object_path() {
        let server = start_api_mock(vec![
            Mock::given(matchers::method("PUT"))
                .and(matchers::path("/openidm/managed/alpha_user/u1"))
                .and(matchers::body_json(json!({ "userName": "alice", "sn": "Liddell" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
                .expect(1),
            Mock::given(matchers::method("PATCH"))
                .and(matchers::path("/openidm/managed/alpha_user/u1"))
                .and(matchers::body_json(json!([
                    { "operation": "replace", "field": "sn", "value": "L." }
                ])))
                .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
                .expect(1),
            Mock::given(matchers::method("DELETE"))
                .and(matchers::path("/openidm/managed/alpha_user/u1"))
                .and(matchers::query_param_is_missing("_action"))
                .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
                .expect(1),
        ])
        .await;

        let users = users(&server);
        users
            .put("u1", &json!({ "userName": "alice", "sn": "Liddell" }))
            .await
            .unwrap();
        users
            .patch(
                "u1",
                &json!([{ "operation": "replace", "field": "sn", "value": "L." }]),
            )
            .await
            .unwrap();
        users.delete("u1").await.unwrap();
    }

    #[tokio::test]
    async fn missing_object_is_an_error() {
        let server = start_api_mock(vec![Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "reason": "Not Found",
                "message": "Object u2 not found in managed/alpha_user"
            })))])
        .await;

        let err = users(&server).read("u2").await.unwrap_err();
        assert!(err.to_string().contains("Object u2 not found"));
    }
}
