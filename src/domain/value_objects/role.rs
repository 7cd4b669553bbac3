//! Profile roles and the authenticated actor.

use serde::{Deserialize, Serialize};

/// Role of a profile on the platform.
///
/// Stored as VARCHAR in `profiles.role` with a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileRole {
    #[default]
    Customer,
    SalonOwner,
    Staff,
    Admin,
}

impl ProfileRole {
    /// Parse from the database / API representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Some(Self::Customer),
            "SALON_OWNER" => Some(Self::SalonOwner),
            "STAFF" => Some(Self::Staff),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Database / API representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::SalonOwner => "SALON_OWNER",
            Self::Staff => "STAFF",
            Self::Admin => "ADMIN",
        }
    }

    /// A customer joining a salon's team or opening a salon gets promoted;
    /// owners and admins keep their role.
    pub fn promoted_to(self, target: ProfileRole) -> ProfileRole {
        match (self, target) {
            (Self::Customer, t) => t,
            (Self::Staff, Self::SalonOwner) => Self::SalonOwner,
            (current, _) => current,
        }
    }
}

impl std::fmt::Display for ProfileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The caller of an operation, as established by the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub profile_id: i64,
    pub role: ProfileRole,
}

impl Actor {
    pub fn new(profile_id: i64, role: ProfileRole) -> Self {
        Self { profile_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ProfileRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("CUSTOMER", Some(ProfileRole::Customer))]
    #[test_case("salon_owner", Some(ProfileRole::SalonOwner))]
    #[test_case("Staff", Some(ProfileRole::Staff))]
    #[test_case("ADMIN", Some(ProfileRole::Admin))]
    #[test_case("root", None)]
    fn test_parse(input: &str, expected: Option<ProfileRole>) {
        assert_eq!(ProfileRole::parse(input), expected);
    }

    #[test_case(ProfileRole::Customer, ProfileRole::Staff, ProfileRole::Staff)]
    #[test_case(ProfileRole::Customer, ProfileRole::SalonOwner, ProfileRole::SalonOwner)]
    #[test_case(ProfileRole::Staff, ProfileRole::SalonOwner, ProfileRole::SalonOwner)]
    #[test_case(ProfileRole::SalonOwner, ProfileRole::Staff, ProfileRole::SalonOwner)]
    #[test_case(ProfileRole::Admin, ProfileRole::SalonOwner, ProfileRole::Admin)]
    fn test_promotion(current: ProfileRole, target: ProfileRole, expected: ProfileRole) {
        assert_eq!(current.promoted_to(target), expected);
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&ProfileRole::SalonOwner).unwrap();
        assert_eq!(json, "\"SALON_OWNER\"");
    }
}
