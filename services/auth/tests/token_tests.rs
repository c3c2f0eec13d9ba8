//! Session token issuance and verification tests
//!
//! Uses a throwaway RSA keypair checked in under `tests/keys`; it signs
//! nothing outside this test suite.

use chrono::Utc;
use uuid::Uuid;

use auth::jwt::{Claims, JwtConfig, JwtService};
use auth::models::{Role, User};

const TEST_PRIVATE_KEY: &str = include_str!("keys/test_private.pem");
const TEST_PUBLIC_KEY: &str = include_str!("keys/test_public.pem");

fn test_service(expiry: u64) -> JwtService {
    let config = JwtConfig {
        private_key: TEST_PRIVATE_KEY.to_string(),
        public_key: TEST_PUBLIC_KEY.to_string(),
        token_expiry: expiry,
    };
    JwtService::new(config).expect("JWT service should initialize with test keys")
}

fn test_user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: "unused".to_string(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn issued_token_round_trips_identity_and_role() {
    let service = test_service(3600);
    let user = test_user(Role::Owner);

    let token = service.generate_token(&user).unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, Role::Owner);
    assert!(claims.exp > claims.iat);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn validation_is_idempotent() {
    let service = test_service(3600);
    let user = test_user(Role::Tenant);
    let token = service.generate_token(&user).unwrap();

    let first = service.validate_token(&token).unwrap();
    let second = service.validate_token(&token).unwrap();

    assert_eq!(first.sub, second.sub);
    assert_eq!(first.role, second.role);
    assert_eq!(first.iat, second.iat);
    assert_eq!(first.exp, second.exp);
}

#[test]
fn tampered_token_is_rejected() {
    let service = test_service(3600);
    let user = test_user(Role::Tenant);
    let token = service.generate_token(&user).unwrap();

    // Flip a character in the payload segment
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    assert_eq!(parts.len(), 3);
    let payload = &mut parts[1];
    let flipped = if payload.ends_with('A') { "B" } else { "A" };
    payload.replace_range(payload.len() - 1.., flipped);
    let tampered = parts.join(".");

    assert!(service.validate_token(&tampered).is_err());
}

#[test]
fn truncated_token_is_rejected() {
    let service = test_service(3600);
    let user = test_user(Role::Tenant);
    let token = service.generate_token(&user).unwrap();

    assert!(service.validate_token(&token[..token.len() / 2]).is_err());
    assert!(service.validate_token("").is_err());
    assert!(service.validate_token("not.a.jwt").is_err());
}

#[test]
fn expired_token_is_rejected() {
    let service = test_service(3600);
    let user = test_user(Role::Tenant);

    // Craft a token whose expiry is comfortably past the default leeway
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user.id,
        role: user.role,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap();

    assert!(service.validate_token(&token).is_err());
}

#[test]
fn token_signed_with_wrong_algorithm_is_rejected() {
    let service = test_service(3600);
    let user = test_user(Role::Tenant);

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user.id,
        role: user.role,
        iat: now,
        exp: now + 3600,
    };

    // HS256 token keyed on the public key bytes, a classic confusion attack
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_PUBLIC_KEY.as_bytes()),
    )
    .unwrap();

    assert!(service.validate_token(&token).is_err());
}
