use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl User {
    pub fn roles_display(&self) -> String {
        if self.roles.is_empty() {
            return "-".to_string();
        }
        self.roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMeta {
    pub total_amount: u32,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub data: Vec<User>,
    #[serde(default)]
    pub meta: UserMeta,
}

/// Query filters for the admin user list.
#[derive(Debug, Clone)]
pub struct UserFilters {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub is_blocked: Option<bool>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for UserFilters {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            sort_order: None,
            is_blocked: None,
            limit: 20,
            offset: 0,
        }
    }
}

impl UserFilters {
    /// Query parameters with empty values omitted.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.to_string()));
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            query.push(("sortBy".to_string(), sort_by.to_string()));
        }
        if let Some(order) = self.sort_order {
            query.push(("sortOrder".to_string(), order.as_str().to_string()));
        }
        if let Some(blocked) = self.is_blocked {
            query.push(("isBlocked".to_string(), blocked.to_string()));
        }
        query.push(("limit".to_string(), self.limit.to_string()));
        query.push(("offset".to_string(), self.offset.to_string()));
        query
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl UserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.phone_number.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRolesRequest {
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_page() {
        let json = r#"{"data": [{"id": 3, "username": "carol", "email": "carol@example.com", "date": "2024-11-05T12:00:00Z", "isBlocked": true, "roles": ["MODERATOR"], "phoneNumber": "5551234567"}], "meta": {"totalAmount": 41, "sortBy": "username", "sortOrder": "asc"}}"#;

        let page: UserPage = serde_json::from_str(json).expect("Failed to parse user page JSON");
        assert_eq!(page.meta.total_amount, 41);
        assert_eq!(page.meta.sort_order, Some(SortOrder::Asc));

        let user = &page.data[0];
        assert!(user.is_blocked);
        assert_eq!(user.roles_display(), "MODERATOR");
    }

    #[test]
    fn test_filters_omit_empty_values() {
        let filters = UserFilters {
            search: Some(String::new()),
            is_blocked: Some(false),
            ..Default::default()
        };
        let query = filters.to_query();

        assert!(!query.iter().any(|(k, _)| k == "search"));
        assert!(query.contains(&("isBlocked".to_string(), "false".to_string())));
        assert!(query.contains(&("limit".to_string(), "20".to_string())));
    }
}
