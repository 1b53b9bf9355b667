use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode as jwt_decode, encode as jwt_encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::application::JwtConfig;
use crate::error::{ApiError, ApiResult};

const ACCESS_TOKEN: &str = "access_token";

const REFRESH_TOKEN: &str = "refresh_token";

/// 用户角色
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    // 平台管理员
    Admin,
    // 商家(门店)
    Seller,
    // 顾客
    Customer,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Customer
    }
}

pub struct JWT {
    pub secret: String,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    pub id: i64,
    pub role: UserRole,
    //昵称
    pub username: String,
    // 商家所属门店
    pub store_id: Option<i64>,
    //过期时间
    pub exp: i64,
    //签发机构
    iss: String,
    //token的类型
    token_type: String,
}

impl Claims {
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// 管理员可以操作所有门店, 商家只能操作自己的门店
    pub fn can_manage_store(&self, store_id: i64) -> bool {
        match self.role {
            UserRole::Admin => true,
            UserRole::Seller => self.store_id == Some(store_id),
            UserRole::Customer => false,
        }
    }
}

impl From<&JwtConfig> for JWT {
    fn from(cfg: &JwtConfig) -> Self {
        JWT::new(cfg.secret.clone(), cfg.exp, cfg.iss.clone())
    }
}

impl JWT {
    pub fn new(secret: String, exp: i64, iss: String) -> Self {
        Self { secret, exp, iss }
    }

    pub fn new_claims(
        &self,
        id: i64,
        username: String,
        role: UserRole,
        store_id: Option<i64>,
    ) -> Claims {
        Claims {
            id,
            role,
            username,
            store_id,
            iss: self.iss.clone(),
            exp: self.calc_claim_exp(),
            token_type: "".to_string(),
        }
    }

    fn calc_claim_exp(&self) -> i64 {
        (Utc::now() + Duration::seconds(self.exp)).timestamp()
    }

    fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    /// 获取签名token
    pub fn token(&self, claims: &Claims) -> ApiResult<String> {
        jwt_encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret_bytes()),
        )
        .map_err(ApiError::from)
    }

    pub fn token_info(&self, claims: &mut Claims) -> ApiResult<(String, String)> {
        Ok((self.access_token(claims)?, self.refresh_token(claims)?))
    }

    pub fn access_token(&self, claims: &mut Claims) -> ApiResult<String> {
        claims.token_type = ACCESS_TOKEN.to_string();
        claims.exp = self.calc_claim_exp();

        self.token(claims)
    }

    /// refresh_token 有效期: 15天
    pub fn refresh_token(&self, claims: &mut Claims) -> ApiResult<String> {
        claims.token_type = REFRESH_TOKEN.to_string();
        claims.exp = (Utc::now() + Duration::days(15i64)).timestamp();

        self.token(claims)
    }

    /// 验证token, 并返回claims
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validate = Validation::new(jsonwebtoken::Algorithm::HS256);
        validate.set_issuer(&[self.iss.clone()]);

        Ok(jwt_decode(
            token,
            &DecodingKey::from_secret(self.secret_bytes()),
            &validate,
        )
        .map_err(ApiError::from)?
        .claims)
    }

    pub fn is_access_token(claims: &Claims) -> bool {
        claims.token_type == ACCESS_TOKEN
    }

    pub fn is_refresh_token(claims: &Claims) -> bool {
        claims.token_type == REFRESH_TOKEN
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn jwt() -> JWT {
        JWT::new("secret".to_string(), 600, "storefront".to_string())
    }

    #[test]
    fn token_roundtrip() {
        let jwt = jwt();
        let mut claims = jwt.new_claims(7, "minh".to_string(), UserRole::Seller, Some(3));
        let (access_token, refresh_token) = jwt.token_info(&mut claims).unwrap();

        let claims = jwt.verify(&access_token).unwrap();
        assert!(JWT::is_access_token(&claims));
        assert!(claims.can_manage_store(3));
        assert!(!claims.can_manage_store(4));

        let claims = jwt.verify(&refresh_token).unwrap();
        assert!(JWT::is_refresh_token(&claims));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let mut claims = jwt().new_claims(1, "admin".to_string(), UserRole::Admin, None);
        let token = jwt().access_token(&mut claims).unwrap();

        let other = JWT::new("secret".to_string(), 600, "other".to_string());
        assert!(matches!(other.verify(&token), Err(ApiError::Unauthorized(_))));
    }
}
