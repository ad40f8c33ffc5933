use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Bearer token claims. The subject is the account email; the role claim
/// mirrors the account role at issuance time.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // email
    pub role: String,
    pub exp: usize,
    pub jti: String,
}

pub fn create_jwt(email: &str, role: &str, ttl_secs: i64, secret: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::seconds(ttl_secs))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: email.to_owned(),
        role: role.to_owned(),
        exp: expiration as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_cycle() {
        let secret = "test_secret";
        let token = create_jwt("alice@x.io", "ROLE_USER", 3600, secret).unwrap();
        let claims = validate_jwt(&token, secret).unwrap();
        assert_eq!(claims.sub, "alice@x.io");
        assert_eq!(claims.role, "ROLE_USER");
    }

    #[test]
    fn test_jwt_wrong_secret_rejected() {
        let token = create_jwt("alice@x.io", "ROLE_USER", 3600, "secret_a").unwrap();
        assert!(validate_jwt(&token, "secret_b").is_err());
    }

    #[test]
    fn test_jwt_expired_rejected() {
        let token = create_jwt("alice@x.io", "ROLE_USER", -120, "secret").unwrap();
        assert!(validate_jwt(&token, "secret").is_err());
    }
}
