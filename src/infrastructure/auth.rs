use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::env;

use axum::{
    async_trait,
    extract::{FromRequestParts, Json},
    http::{StatusCode, request::Parts},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::domain::site::{ModelAdmin, ModelPerms};
use crate::models::employee;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub uid: i32,
    pub staff: bool,
    pub superuser: bool,
    /// Permission codenames such as `change_book`
    pub perms: Vec<String>,
    pub exp: usize,
}

impl Claims {
    pub fn has_perm(&self, codename: &str) -> bool {
        self.superuser || self.perms.iter().any(|p| p == codename)
    }

    /// What this user may do with a model; change implies view.
    pub fn model_perms(&self, model: &ModelAdmin) -> ModelPerms {
        let change = self.has_perm(&model.codename("change"));
        ModelPerms {
            view: change || self.has_perm(&model.codename("view")),
            add: self.has_perm(&model.codename("add")),
            change,
            delete: self.has_perm(&model.codename("delete")),
        }
    }

    pub fn require(&self, model: &ModelAdmin, action: &str) -> Result<(), DomainError> {
        let perms = self.model_perms(model);
        let allowed = match action {
            "view" => perms.view,
            "add" => perms.add,
            "change" => perms.change,
            "delete" => perms.delete,
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            tracing::warn!("{} lacks {}", self.sub, model.codename(action));
            Err(DomainError::PermissionDenied)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Missing Authorization header" })),
            ))?;

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid Authorization header format" })),
            ));
        };

        let claims = decode_jwt(token).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid or expired token" })),
            )
        })?;

        if !claims.staff {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Staff access required" })),
            ));
        }
        Ok(claims)
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn get_jwt_secret() -> Result<String, String> {
    match env::var("JWT_SECRET") {
        Ok(secret) => Ok(secret),
        Err(_) if cfg!(debug_assertions) => Ok("secret".to_string()),
        Err(_) => Err("JWT_SECRET environment variable must be set in production".to_string()),
    }
}

pub fn create_jwt(user: &employee::Model) -> Result<String, String> {
    let secret = get_jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or("token expiry overflow")?
        .timestamp();

    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        staff: user.is_staff,
        superuser: user.is_superuser,
        perms: user.permission_list(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str) -> Result<Claims, String> {
    let secret = get_jwt_secret()?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::site;

    fn claims(perms: &[&str], superuser: bool) -> Claims {
        Claims {
            sub: "tester".into(),
            uid: 1,
            staff: true,
            superuser,
            perms: perms.iter().map(|p| p.to_string()).collect(),
            exp: 0,
        }
    }

    #[test]
    fn change_implies_view() {
        let perms = claims(&["change_book"], false).model_perms(&site::BOOK);
        assert!(perms.view);
        assert!(perms.change);
        assert!(!perms.add);
        assert!(!perms.delete);
    }

    #[test]
    fn superuser_has_everything() {
        let c = claims(&[], true);
        assert!(c.require(&site::PUBLISHER, "delete").is_ok());
    }

    #[test]
    fn missing_permission_is_denied() {
        let c = claims(&["view_book"], false);
        assert!(c.require(&site::BOOK, "view").is_ok());
        assert!(matches!(
            c.require(&site::BOOK, "add"),
            Err(DomainError::PermissionDenied)
        ));
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("pass12345").unwrap();
        assert!(verify_password("pass12345", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
