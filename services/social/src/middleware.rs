//! Session resolution: `token` cookie to authenticated identity

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::ops::Deref;
use tracing::{debug, info};

use crate::{
    AppState,
    error::{ApiError, ApiResult, AuthError},
    jwt::JwtService,
    models::Account,
    repositories::AccountStore,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Account resolved from a valid session token
///
/// Only the session resolver builds one. Handlers receive it through
/// `Extension<Identity>` and hand `&Identity` to the rules and services, so
/// nothing downstream acts on a client-supplied id.
#[derive(Debug, Clone)]
pub struct Identity(Account);

impl Identity {
    pub(crate) fn new(account: Account) -> Self {
        Self(account)
    }

    pub fn account(&self) -> &Account {
        &self.0
    }
}

impl Deref for Identity {
    type Target = Account;

    fn deref(&self) -> &Account {
        &self.0
    }
}

/// Resolve a raw token into an [`Identity`]
///
/// An absent or empty token is [`AuthError::MissingToken`], a token failing
/// verification is [`AuthError::InvalidToken`] and a token whose subject has
/// been deleted is [`AuthError::UnknownAccount`]. Store failures surface as
/// internal errors.
pub async fn resolve_identity(
    jwt_service: &JwtService,
    accounts: &dyn AccountStore,
    token: Option<&str>,
) -> ApiResult<Identity> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let account_id = jwt_service.verify(token)?;

    let account = accounts
        .find_account(account_id)
        .await?
        .ok_or(AuthError::UnknownAccount)?;

    debug!("Resolved session for account {}", account.id);
    Ok(Identity::new(account))
}

/// Reject requests without a valid session, otherwise attach the [`Identity`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value());

    let identity = resolve_identity(&state.jwt_service, state.accounts.as_ref(), token)
        .await
        .inspect_err(|e| {
            if let ApiError::Auth(reason) = e {
                info!("Rejected request to {}: {}", req.uri().path(), reason);
            }
        })?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Build the session cookie: HttpOnly, SameSite=Strict, `Secure` in
/// production, expiring with the token
pub fn session_cookie(token: String, max_age_secs: u64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(
            i64::try_from(max_age_secs).unwrap_or(i64::MAX),
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{Claims, JwtConfig};
    use crate::models::NewAccount;
    use crate::repositories::MemoryStore;
    use secrecy::SecretString;

    fn jwt() -> JwtService {
        JwtService::new(JwtConfig {
            secret: SecretString::from("resolver-test-secret"),
            token_expiry: 60,
        })
    }

    async fn store_with_alice() -> (MemoryStore, Account) {
        let store = MemoryStore::new();
        let alice = store
            .create_account(NewAccount {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "$argon2id$unused".to_string(),
            })
            .await
            .unwrap();
        (store, alice)
    }

    fn auth_error(result: ApiResult<Identity>) -> AuthError {
        match result {
            Err(ApiError::Auth(reason)) => reason,
            other => panic!("expected an authentication failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolves_valid_token() {
        let (store, alice) = store_with_alice().await;
        let jwt = jwt();
        let token = jwt.issue(alice.id).unwrap();

        let identity = resolve_identity(&jwt, &store, Some(&token)).await.unwrap();
        assert_eq!(identity.id, alice.id);
        assert_eq!(identity.account().username, "alice");
    }

    #[tokio::test]
    async fn test_missing_or_empty_token() {
        let (store, _) = store_with_alice().await;
        let jwt = jwt();

        assert_eq!(
            auth_error(resolve_identity(&jwt, &store, None).await),
            AuthError::MissingToken
        );
        assert_eq!(
            auth_error(resolve_identity(&jwt, &store, Some("")).await),
            AuthError::MissingToken
        );
    }

    #[tokio::test]
    async fn test_invalid_and_expired_tokens() {
        let (store, alice) = store_with_alice().await;
        let jwt = jwt();

        assert_eq!(
            auth_error(resolve_identity(&jwt, &store, Some("garbage")).await),
            AuthError::InvalidToken
        );

        let expired = jwt
            .sign(&Claims {
                sub: alice.id,
                iat: 1_000,
                exp: 2_000,
            })
            .unwrap();
        assert_eq!(
            auth_error(resolve_identity(&jwt, &store, Some(&expired)).await),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn test_deleted_account_is_unknown() {
        let (store, alice) = store_with_alice().await;
        let jwt = jwt();
        let token = jwt.issue(alice.id).unwrap();

        store.delete_account(alice.id).await.unwrap();

        assert_eq!(
            auth_error(resolve_identity(&jwt, &store, Some(&token)).await),
            AuthError::UnknownAccount
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), 604_800, true);

        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604_800)));
    }

    #[test]
    fn test_session_cookie_max_age_never_negative() {
        let cookie = session_cookie("abc".to_string(), u64::MAX, false);
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(i64::MAX)));
    }
}
