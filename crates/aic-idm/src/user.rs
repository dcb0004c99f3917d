use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A managed user. Attributes not modelled here are kept in `extra`.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_platform_field_names() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "userName": "alice",
            "givenName": "Alice",
            "telephoneNumber": "+15555550100",
            "accountStatus": "active",
            "preferences": { "marketing": false }
        }))
        .unwrap();

        assert_eq!(user.given_name.as_deref(), Some("Alice"));
        assert_eq!(user.account_status.as_deref(), Some("active"));

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["_id"], "u1");
        assert_eq!(value["telephoneNumber"], "+15555550100");
        assert_eq!(value["preferences"], json!({ "marketing": false }));
        assert!(value.get("mail").is_none());
    }
}
