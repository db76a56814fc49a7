//! Tests for the account service.

use std::sync::Arc;

use chrono::TimeZone;
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockCredentialIssuer, MockPasswordHasher, MockUserRepository};
use crate::domain::{AuthToken, ErrorCode, PasswordHash, RegistrationParts};
use crate::test_support::MutableClock;

type Service = AccountService<MockUserRepository, MockCredentialIssuer, MockPasswordHasher>;

fn clock() -> Arc<dyn Clock> {
    Arc::new(MutableClock::new(
        chrono::Utc
            .with_ymd_and_hms(2025, 2, 1, 8, 0, 0)
            .single()
            .expect("valid instant"),
    ))
}

fn bootstrap(password: Option<&str>) -> BootstrapAdmin {
    BootstrapAdmin {
        email: Email::new("admin@example.com").expect("email"),
        password: password.map(|raw| Password::with_policy(raw).expect("password")),
    }
}

fn issuer() -> MockCredentialIssuer {
    let mut issuer = MockCredentialIssuer::new();
    issuer
        .expect_issue()
        .returning(|user, _| Ok(AuthToken::new(format!("token-{user}"))));
    issuer
}

fn service(users: MockUserRepository, hasher: MockPasswordHasher) -> Service {
    AccountService::new(
        Arc::new(users),
        Arc::new(issuer()),
        Arc::new(hasher),
        clock(),
        bootstrap(Some("admin123")),
    )
}

fn user(role: Role, email: &str) -> User {
    User::new(
        UserId::random(),
        UserName::new("ليلى").expect("name"),
        Email::new(email).expect("email"),
        Department::Marketing,
        role,
    )
}

fn account(user: User) -> UserAccount {
    UserAccount {
        user,
        password_hash: PasswordHash::new("hashed"),
    }
}

fn admin_requester() -> Requester {
    Requester::from(&user(Role::Admin, "boss@example.com"))
}

fn registration(role: Option<&str>) -> Registration {
    Registration::try_from_parts(RegistrationParts {
        name: "ليلى",
        email: "Layla@Example.com",
        password: "secret1",
        department: "التسويق",
        role,
    })
    .expect("valid registration")
}

fn hashing() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|_| Ok(PasswordHash::new("hashed")));
    hasher
}

#[tokio::test]
async fn register_stores_account_and_issues_token() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_account_by_email()
        .times(1)
        .returning(|_| Ok(None));
    users
        .expect_insert()
        .withf(|account| {
            account.user.email().as_ref() == "layla@example.com"
                && account.password_hash.as_str() == "hashed"
                && account.user.role() == Role::Employee
        })
        .times(1)
        .returning(|_| Ok(()));

    let session = service(users, hashing())
        .register(registration(None))
        .await
        .expect("registered");

    assert_eq!(session.token.as_str(), format!("token-{}", session.user.id()));
    assert_eq!(session.user.department(), Department::Marketing);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_account_by_email()
        .returning(|email| Ok(Some(account(user(Role::Employee, email.as_ref())))));
    users.expect_insert().never();

    let err = service(users, MockPasswordHasher::new())
        .register(registration(None))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn register_keeps_a_requested_admin_role() {
    let mut users = MockUserRepository::new();
    users.expect_find_account_by_email().returning(|_| Ok(None));
    users.expect_insert().returning(|_| Ok(()));

    let session = service(users, hashing())
        .register(registration(Some("admin")))
        .await
        .expect("registered");
    assert!(session.user.is_admin());
}

#[rstest]
#[case(None, false)]
#[case(Some(false), false)]
#[case(Some(true), true)]
#[tokio::test]
async fn login_requires_known_email_and_matching_password(
    #[case] password_matches: Option<bool>,
    #[case] succeeds: bool,
) {
    let mut users = MockUserRepository::new();
    users.expect_find_account_by_email().returning(move |email| {
        Ok(password_matches.map(|_| account(user(Role::Employee, email.as_ref()))))
    });
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .returning(move |_, _| Ok(password_matches.unwrap_or(false)));

    let credentials =
        LoginCredentials::try_from_parts("layla@example.com", "secret1").expect("credentials");
    let result = service(users, hasher).login(credentials).await;

    match (succeeds, result) {
        (true, Ok(session)) => assert_eq!(session.user.email().as_ref(), "layla@example.com"),
        (false, Err(err)) => {
            assert_eq!(err.code(), ErrorCode::Unauthorized);
            assert_eq!(err.message(), "invalid email or password");
        }
        (expected, other) => panic!("expected success={expected}, got {other:?}"),
    }
}

#[tokio::test]
async fn bootstrap_is_refused_once_an_admin_exists() {
    let mut users = MockUserRepository::new();
    users
        .expect_count_by_role()
        .with(eq(Role::Admin))
        .returning(|_| Ok(1));

    let err = service(users, MockPasswordHasher::new())
        .bootstrap_admin()
        .await
        .expect_err("admin exists");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn bootstrap_promotes_an_existing_account() {
    let existing = user(Role::Employee, "admin@example.com");
    let existing_id = *existing.id();
    let mut users = MockUserRepository::new();
    users.expect_count_by_role().returning(|_| Ok(0));
    users
        .expect_find_account_by_email()
        .returning(move |_| Ok(Some(account(existing.clone()))));
    users
        .expect_update()
        .withf(move |user| {
            *user.id() == existing_id
                && user.is_admin()
                && user.department() == Department::Administration
                && user.name().as_ref() == BOOTSTRAP_ADMIN_NAME
        })
        .times(1)
        .returning(|_| Ok(true));

    let outcome = service(users, MockPasswordHasher::new())
        .bootstrap_admin()
        .await
        .expect("promoted");
    assert!(matches!(outcome, BootstrapOutcome::Promoted(_)));
}

#[tokio::test]
async fn bootstrap_creates_an_admin_with_the_configured_password() {
    let mut users = MockUserRepository::new();
    users.expect_count_by_role().returning(|_| Ok(0));
    users.expect_find_account_by_email().returning(|_| Ok(None));
    users
        .expect_insert()
        .withf(|account| account.user.is_admin() && account.user.email().as_ref() == "admin@example.com")
        .times(1)
        .returning(|_| Ok(()));

    let outcome = service(users, hashing())
        .bootstrap_admin()
        .await
        .expect("created");
    assert!(matches!(outcome, BootstrapOutcome::Created(_)));
    assert_eq!(outcome.session().user.department(), Department::Administration);
}

#[tokio::test]
async fn bootstrap_without_a_password_cannot_create() {
    let mut users = MockUserRepository::new();
    users.expect_count_by_role().returning(|_| Ok(0));
    users.expect_find_account_by_email().returning(|_| Ok(None));
    let service = AccountService::new(
        Arc::new(users),
        Arc::new(issuer()),
        Arc::new(MockPasswordHasher::new()),
        clock(),
        bootstrap(None),
    );

    let err = service.bootstrap_admin().await.expect_err("no password");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[case(CredentialError::expired(), "token expired")]
#[case(CredentialError::invalid("bad signature"), "invalid token")]
#[tokio::test]
async fn authenticate_maps_credential_failures(
    #[case] failure: CredentialError,
    #[case] message: &str,
) {
    let mut issuer = MockCredentialIssuer::new();
    issuer
        .expect_verify()
        .return_once(move |_, _| Err(failure));
    let service = AccountService::new(
        Arc::new(MockUserRepository::new()),
        Arc::new(issuer),
        Arc::new(MockPasswordHasher::new()),
        clock(),
        bootstrap(None),
    );

    let err = service.authenticate("t").await.expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), message);
}

#[tokio::test]
async fn authenticate_rejects_tokens_for_deleted_users() {
    let mut issuer = MockCredentialIssuer::new();
    issuer.expect_verify().returning(|_, _| Ok(UserId::random()));
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().returning(|_| Ok(None));
    let service = AccountService::new(
        Arc::new(users),
        Arc::new(issuer),
        Arc::new(MockPasswordHasher::new()),
        clock(),
        bootstrap(None),
    );

    let err = service.authenticate("t").await.expect_err("gone");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn employees_cannot_list_users() {
    let employee = Requester::from(&user(Role::Employee, "e@example.com"));
    let err = service(MockUserRepository::new(), MockPasswordHasher::new())
        .list_users(&employee)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(1, Some(ErrorCode::InvariantViolation))]
#[case(2, None)]
#[tokio::test]
async fn deleting_an_admin_respects_the_last_admin_rule(
    #[case] admins: u64,
    #[case] expected: Option<ErrorCode>,
) {
    let target = user(Role::Admin, "other@example.com");
    let target_id = *target.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    users.expect_count_by_role().returning(move |_| Ok(admins));
    users
        .expect_delete()
        .times(usize::from(expected.is_none()))
        .returning(|_| Ok(true));

    let result = service(users, MockPasswordHasher::new())
        .delete_user(&admin_requester(), &target_id)
        .await;
    assert_eq!(result.err().map(|err| err.code()), expected);
}

#[tokio::test]
async fn deleting_an_unknown_user_is_not_found() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().returning(|_| Ok(None));

    let err = service(users, MockPasswordHasher::new())
        .delete_user(&admin_requester(), &UserId::random())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn demoting_the_last_admin_is_rejected() {
    let target = user(Role::Admin, "solo@example.com");
    let target_id = *target.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    users.expect_count_by_role().returning(|_| Ok(1));
    users.expect_update().never();

    let changes = UserChanges {
        role: Some(Role::Employee),
        ..UserChanges::default()
    };
    let err = service(users, MockPasswordHasher::new())
        .update_user(&admin_requester(), &target_id, changes)
        .await
        .expect_err("last admin");
    assert_eq!(err.code(), ErrorCode::InvariantViolation);
}

#[tokio::test]
async fn update_rejects_an_email_owned_by_someone_else() {
    let target = user(Role::Employee, "a@example.com");
    let target_id = *target.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    users
        .expect_find_account_by_email()
        .returning(|email| Ok(Some(account(user(Role::Employee, email.as_ref())))));
    users.expect_update().never();

    let changes = UserChanges {
        email: Some(Email::new("b@example.com").expect("email")),
        ..UserChanges::default()
    };
    let err = service(users, MockPasswordHasher::new())
        .update_user(&admin_requester(), &target_id, changes)
        .await
        .expect_err("clash");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn update_applies_partial_changes() {
    let target = user(Role::Employee, "a@example.com");
    let target_id = *target.id();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(target.clone())));
    users
        .expect_update()
        .withf(|user| user.department() == Department::Sales && user.email().as_ref() == "a@example.com")
        .returning(|_| Ok(true));

    let changes = UserChanges {
        department: Some(Department::Sales),
        ..UserChanges::default()
    };
    let updated = service(users, MockPasswordHasher::new())
        .update_user(&admin_requester(), &target_id, changes)
        .await
        .expect("updated");
    assert_eq!(updated.role(), Role::Employee);
}

#[tokio::test]
async fn connection_failures_surface_as_service_unavailable() {
    let mut users = MockUserRepository::new();
    users
        .expect_list()
        .returning(|| Err(UserPersistenceError::connection("refused")));

    let err = service(users, MockPasswordHasher::new())
        .list_users(&admin_requester())
        .await
        .expect_err("unavailable");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
