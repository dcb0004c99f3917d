use aic_core::LibraryConfig;
use aic_idm::{create_managed_users_instance, delete_user, User};
use aic_test::start_api_mock;
use serde_json::json;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const SERVICE_ACCOUNT_KEY: &str = include_str!("../../aic-core/tests/fixtures/service_account.pem");

fn config(server: &MockServer, key_path: std::path::PathBuf) -> LibraryConfig {
    LibraryConfig {
        base_url: Some(server.uri()),
        service_account_id: Some("issuer".to_owned()),
        service_account_client_id: Some("service-account".to_owned()),
        service_account_scope: Some("fr:idm:*".to_owned()),
        service_account_jwk_path: Some(key_path),
        ..Default::default()
    }
}

fn managed_user(path: &str) -> wiremock::MockBuilder {
    Mock::given(matchers::path(format!("/openidm/managed/alpha_user{path}")))
        .and(matchers::header("authorization", "Bearer sa-token"))
}

#[tokio::test]
async fn user_lifecycle_with_service_account() {
    let server = start_api_mock(vec![
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/am/oauth2/access_token"))
            .and(matchers::body_string_contains("client_id=service-account"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "sa-token" })),
            ),
        managed_user("")
            .and(matchers::method("POST"))
            .and(matchers::query_param("_action", "create"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "_id": "new-id",
                "userName": "journey-user",
                "accountStatus": "active"
            })))
            .expect(1),
        managed_user("/new-id")
            .and(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "new-id",
                "userName": "journey-user",
                "accountStatus": "active"
            })))
            .expect(1),
        managed_user("/new-id")
            .and(matchers::method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "new-id" })))
            .expect(1),
        managed_user("/missing")
            .and(matchers::method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .expect(1),
    ])
    .await;

    let key_path = std::env::temp_dir().join(format!("aic-idm-sa-{}.pem", std::process::id()));
    std::fs::write(&key_path, SERVICE_ACCOUNT_KEY).unwrap();

    let managed = create_managed_users_instance(None, "alpha", &config(&server, key_path.clone()))
        .unwrap();

    let created = managed
        .users
        .create(&User {
            user_name: Some("journey-user".to_owned()),
            ..Default::default()
        })
        .await
        .unwrap();
    let id = created.id.clone().unwrap();

    let read = managed.users.read(&id).await.unwrap();
    assert_eq!(read, created);

    delete_user(&managed.users, &id).await;
    // Failures are logged, not returned.
    delete_user(&managed.users, "missing").await;

    std::fs::remove_file(&key_path).unwrap();
}
