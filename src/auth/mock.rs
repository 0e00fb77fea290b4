use serde::Serialize;

/// A fixed local account for `AUTH_MODE=mock`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockUser {
    pub id: &'static str,
    pub email: &'static str,
    pub name: &'static str,
    pub member_level: i64,
}

/// One user per membership tier
pub const MOCK_USERS: &[MockUser] = &[
    MockUser {
        id: "mock-free-user",
        email: "free@localhost",
        name: "Free Founder",
        member_level: 0,
    },
    MockUser {
        id: "mock-basic-user",
        email: "basic@localhost",
        name: "Basic Founder",
        member_level: 1,
    },
    MockUser {
        id: "mock-pro-user",
        email: "pro@localhost",
        name: "Pro Founder",
        member_level: 2,
    },
];

pub fn find_mock_user(id: &str) -> Option<&'static MockUser> {
    MOCK_USERS.iter().find(|user| user.id == id)
}
