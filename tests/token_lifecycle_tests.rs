//! Token-pair lifecycle against the token service alone: issuance,
//! verification, the advertised lifetime, and revocation semantics.

use chrono::Utc;
use uuid::Uuid;

use nova_chat_server::security::jwt::TokenService;
use nova_chat_server::security::password;

fn service(access_minutes: i64) -> TokenService {
    TokenService::new(
        "lifecycle-test-secret-0123456789abcd",
        access_minutes,
        7,
    )
    .unwrap()
}

#[test]
fn advertised_lifetime_tracks_the_configuration() {
    assert_eq!(service(15).access_expiry_secs(), 900);
    assert_eq!(service(1).access_expiry_secs(), 60);
    assert_eq!(service(120).access_expiry_secs(), 7200);
}

#[test]
fn a_fresh_pair_verifies_with_matching_identity() {
    let svc = service(15);
    let user_id = Uuid::new_v4();

    let access = svc.issue_access_token(&user_id.to_string(), "alice").unwrap();
    let refresh = svc.issue_refresh_token(&user_id.to_string()).unwrap();

    let access_info = svc.verify_and_decode(&access).unwrap();
    assert_eq!(access_info.user_id, user_id);
    assert_eq!(access_info.login.as_deref(), Some("alice"));
    assert!(access_info.is_access_token());

    let refresh_info = svc.verify_and_decode(&refresh).unwrap();
    assert_eq!(refresh_info.user_id, user_id);
    assert!(refresh_info.is_refresh_token());

    // The refresh token outlives the access token.
    assert!(refresh_info.expires_at > access_info.expires_at);
}

#[test]
fn refresh_fingerprints_are_stable_and_distinct() {
    let svc = service(15);
    let first = svc.issue_refresh_token(&Uuid::new_v4().to_string()).unwrap();
    let second = svc.issue_refresh_token(&Uuid::new_v4().to_string()).unwrap();

    assert_eq!(password::fingerprint(&first), password::fingerprint(&first));
    assert_ne!(password::fingerprint(&first), password::fingerprint(&second));
    assert_eq!(password::fingerprint(&first).len(), 64);
}

#[test]
fn revocation_holds_until_the_embedded_expiry() {
    let svc = service(15);
    let token = svc
        .issue_access_token(&Uuid::new_v4().to_string(), "alice")
        .unwrap();

    svc.revoke(&token);
    assert!(svc.is_revoked(&token));
    assert!(svc.verify_and_decode(&token).is_err());

    // The recorded expiry comes from the token itself.
    let exp = svc.token_expiry(&token).unwrap();
    assert!(exp > Utc::now().timestamp());
}

#[test]
fn sweep_only_touches_expired_entries() {
    let svc = service(15);
    let live = svc
        .issue_access_token(&Uuid::new_v4().to_string(), "alice")
        .unwrap();
    svc.revoke(&live);

    svc.sweep();
    assert!(svc.is_revoked(&live));
}
