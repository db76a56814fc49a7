//! Validation coverage for user value types.

use super::*;
use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
#[case("Sara@Example.COM ", "sara@example.com")]
#[case("  omar.k@corp.example", "omar.k@corp.example")]
fn email_is_normalised(#[case] raw: &str, #[case] expected: &str) {
    let email = Email::new(raw).expect("valid email");
    assert_eq!(email.as_ref(), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("   ", UserValidationError::EmptyEmail)]
#[case("no-at-sign", UserValidationError::InvalidEmail)]
#[case("@example.com", UserValidationError::InvalidEmail)]
#[case("sara@", UserValidationError::InvalidEmail)]
#[case("a@b@c", UserValidationError::InvalidEmail)]
#[case("sa ra@example.com", UserValidationError::InvalidEmail)]
fn malformed_emails_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Email::new(raw), Err(expected));
}

#[rstest]
fn names_are_trimmed_and_bounded() {
    assert_eq!(UserName::new("  ليلى  ").expect("name").as_ref(), "ليلى");
    assert_eq!(UserName::new(" "), Err(UserValidationError::EmptyName));
    assert_eq!(
        UserName::new("x".repeat(USER_NAME_MAX + 1)),
        Err(UserValidationError::NameTooLong {
            max: USER_NAME_MAX
        })
    );
}

#[rstest]
fn departments_round_trip_through_their_labels() {
    for department in Department::ALL {
        let parsed: Department = department.label().parse().expect("known label");
        assert_eq!(parsed, department);
        let encoded = serde_json::to_value(department).expect("serialise");
        assert_eq!(encoded, Value::String(department.label().to_owned()));
    }
    assert_eq!(
        "Engineering".parse::<Department>(),
        Err(UserValidationError::UnknownDepartment)
    );
}

#[rstest]
#[case("admin", Ok(Role::Admin))]
#[case("employee", Ok(Role::Employee))]
#[case("Admin", Err(UserValidationError::UnknownRole))]
fn roles_parse_strictly(#[case] raw: &str, #[case] expected: Result<Role, UserValidationError>) {
    assert_eq!(raw.parse::<Role>(), expected);
}

#[rstest]
fn user_ids_reject_padding_and_garbage() {
    assert_eq!(UserId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6"), Err(UserValidationError::InvalidId));
    assert_eq!(UserId::new("not-a-uuid"), Err(UserValidationError::InvalidId));
    assert!(UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").is_ok());
}

fn sample_user() -> User {
    User::new(
        UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("id"),
        UserName::new("سارة").expect("name"),
        Email::new("sara@example.com").expect("email"),
        Department::Finance,
        Role::Employee,
    )
}

#[rstest]
fn users_serialise_in_camel_case_without_credentials() {
    let value = serde_json::to_value(sample_user()).expect("serialise user");
    assert_eq!(
        value,
        json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "name": "سارة",
            "email": "sara@example.com",
            "department": "المالية",
            "role": "employee"
        })
    );
}

#[rstest]
fn apply_keeps_absent_fields() {
    let mut user = sample_user();
    user.apply(UserChanges {
        role: Some(Role::Admin),
        ..UserChanges::default()
    });
    assert!(user.is_admin());
    assert_eq!(user.department(), Department::Finance);
    assert_eq!(user.email().as_ref(), "sara@example.com");
}
