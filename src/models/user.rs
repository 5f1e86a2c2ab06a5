use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub role: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub point_of_contact: i32,
}

crate::record!(User {
    user_id: "UserId",
    name: "Name",
    role: "Role",
    city: "City",
    state: "State",
    pin: "Pin",
    phone: "Phone",
    email: "Email",
    password: "Password",
    point_of_contact: "PointOfContact",
});

impl User {
    /// Every attribute except `Password`.
    pub const PUBLIC_ATTRIBUTES: [&'static str; 8] =
        ["UserId", "Name", "Role", "City", "State", "Phone", "Pin", "Email"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::codec::{from_document, to_document};

    #[test]
    fn test_zero_point_of_contact_is_elided() {
        let user = User {
            user_id: "u1".to_string(),
            name: "Ann".to_string(),
            ..Default::default()
        };
        let document = to_document(&user);
        assert_eq!(document.keys().collect::<Vec<_>>(), vec!["Name", "UserId"]);
        assert_eq!(from_document::<User>(&document), user);
    }

    #[test]
    fn test_password_is_not_serialized() {
        let user = User {
            user_id: "u1".to_string(),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["UserId"], "u1");
        assert!(json.get("Password").is_none());
    }
}
