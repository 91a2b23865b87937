use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::account::Account;
use shared_models::auth::{JwtClaims, JwtHeader};

type HmacSha256 = Hmac<Sha256>;

fn sign(signing_input: &str, jwt_secret: &str) -> Result<Vec<u8>, String> {
    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issues an HS256 token whose subject is the account email.
pub fn issue_token(account: &Account, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    if ttl_hours <= 0 {
        return Err(format!("Token lifetime must be positive, got {} hours", ttl_hours));
    }

    let now = Utc::now();
    let exp = TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| format!("Token lifetime of {} hours is out of range", ttl_hours))?;

    let claims = JwtClaims {
        sub: account.email().to_string(),
        uid: account.id().to_string(),
        role: account.role(),
        iat: now.timestamp().max(0) as u64,
        exp: exp.timestamp().max(0) as u64,
    };

    encode_claims(&claims, jwt_secret)
}

pub fn encode_claims(claims: &JwtClaims, jwt_secret: &str) -> Result<String, String> {
    let header_json = serde_json::to_string(&JwtHeader::default())
        .map_err(|e| format!("Failed to encode header: {}", e))?;
    let claims_json = serde_json::to_string(claims)
        .map_err(|e| format!("Failed to encode claims: {}", e))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = sign(&signing_input, jwt_secret)?;

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Checks structure, signature and expiry. Does not look the account up.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<JwtClaims, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let header: JwtHeader = URL_SAFE_NO_PAD
        .decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| "Invalid header encoding".to_string())?;
    if header.alg != "HS256" {
        return Err(format!("Unsupported token algorithm: {}", header.alg));
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    let now = Utc::now().timestamp().max(0) as u64;
    if claims.exp <= now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err("Token expired".to_string());
    }

    debug!("Token validated successfully for subject: {}", claims.sub);
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestAccounts};
    use shared_models::account::Role;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_issued_token_round_trips_identity() {
        let account = TestAccounts::doctor("Maria", "maria@clinic.test");
        let token = issue_token(&account, SECRET, 1).unwrap();

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "maria@clinic.test");
        assert_eq!(claims.uid, account.id().to_string());
        assert_eq!(claims.role, Role::Doctor);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_expired_token() {
        let account = TestAccounts::patient("Pedro", "pedro@clinic.test");
        let token = JwtTestUtils::create_expired_token(&account, SECRET);

        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let account = TestAccounts::nurse("Nara", "nara@clinic.test");
        let token = JwtTestUtils::create_invalid_signature_token(&account);

        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Invalid token signature");
    }

    #[test]
    fn test_rejects_malformed_token_and_empty_secret() {
        assert!(validate_token(&JwtTestUtils::create_malformed_token(), SECRET).is_err());
        assert!(validate_token("only.two", SECRET).is_err());

        let account = TestAccounts::nurse("Nara", "nara@clinic.test");
        assert_eq!(issue_token(&account, "", 1).unwrap_err(), "JWT secret is not set");
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let account = TestAccounts::doctor("Maria", "maria@clinic.test");

        assert!(issue_token(&account, SECRET, 9_000_000_000_000).is_err());
        assert!(issue_token(&account, SECRET, 0).is_err());
        assert!(issue_token(&account, SECRET, -1).is_err());
    }
}
