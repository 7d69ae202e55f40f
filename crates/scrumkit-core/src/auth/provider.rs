//! Identity providers.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use scrumkit_store::{Query, SharedStore, StoredDocument, to_document};

use super::model::{Identity, MIN_PASSWORD_LEN, OAuthIdentity, PASSWORD_PROVIDER};
use crate::collections::AUTH_ACCOUNTS;
use crate::error::{CoreError, CoreResult, StoreResultExt};

/// Verifies who a user is. Sessions and profiles are handled by the
/// gateway on top of it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new email and password account.
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> CoreResult<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<Identity>;

    /// Accept an identity verified by an OAuth provider, registering it on
    /// first use.
    async fn sign_in_with_oauth(&self, oauth: &OAuthIdentity) -> CoreResult<Identity>;
}

/// Account record in `authAccounts`, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    #[serde(default)]
    id: String,
    email: String,
    display_name: String,
    provider: String,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    salt: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity {
            uid: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            provider: self.provider.clone(),
        }
    }
}

/// Built-in provider keeping accounts in the document store.
pub struct StoreIdentityProvider {
    store: SharedStore,
}

impl StoreIdentityProvider {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn find_one(&self, query: Query) -> CoreResult<Option<Account>> {
        let docs = self
            .store
            .query(AUTH_ACCOUNTS, &query.limit(1))
            .await
            .or_backend("Could not reach the sign-in service.")?;
        docs.into_iter()
            .next()
            .map(StoredDocument::decode)
            .transpose()
            .or_backend("Could not read the account.")
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Account>> {
        self.find_one(Query::new().where_eq("email", email)).await
    }

    async fn insert(&self, account: &Account) -> CoreResult<Account> {
        let uid = uuid::Uuid::new_v4().to_string();
        let body = to_document(account).or_backend("Could not create the account.")?;
        let doc = self
            .store
            .set(AUTH_ACCOUNTS, &uid, body)
            .await
            .or_backend("Could not create the account.")?;
        doc.decode().or_backend("Could not read the account.")
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> CoreResult<Identity> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::WeakPassword(MIN_PASSWORD_LEN));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(CoreError::EmailInUse(email));
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let account = Account {
            id: String::new(),
            display_name: display_name_or_default(display_name, &email),
            email,
            provider: PASSWORD_PROVIDER.to_string(),
            photo_url: None,
            password_hash: Some(hash_password(&salt, password)),
            salt: Some(salt),
            external_id: None,
        };
        let created = self.insert(&account).await?;
        info!(uid = %created.id, "Account registered");
        Ok(created.identity())
    }

    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<Identity> {
        let email = normalize_email(email)?;
        let account = self
            .find_by_email(&email)
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        match (&account.salt, &account.password_hash) {
            (Some(salt), Some(expected)) if hash_password(salt, password) == *expected => {
                Ok(account.identity())
            }
            _ => {
                debug!(uid = %account.id, "Password rejected");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    async fn sign_in_with_oauth(&self, oauth: &OAuthIdentity) -> CoreResult<Identity> {
        if oauth.external_id.trim().is_empty() {
            return Err(CoreError::validation("OAuth identity has no subject id"));
        }
        let linked = self
            .find_one(
                Query::new()
                    .where_eq("externalId", oauth.external_id.as_str())
                    .where_eq("provider", oauth.provider.as_str()),
            )
            .await?;
        if let Some(account) = linked {
            return Ok(account.identity());
        }

        let email = normalize_email(&oauth.email)?;
        if self.find_by_email(&email).await?.is_some() {
            return Err(CoreError::EmailInUse(email));
        }
        let account = Account {
            id: String::new(),
            display_name: display_name_or_default(&oauth.display_name, &email),
            email,
            provider: oauth.provider.clone(),
            photo_url: oauth.photo_url.clone(),
            password_hash: None,
            salt: None,
            external_id: Some(oauth.external_id.clone()),
        };
        let created = self.insert(&account).await?;
        info!(uid = %created.id, provider = %oauth.provider, "OAuth account registered");
        Ok(created.identity())
    }
}

/// Salted SHA-256, base64 encoded.
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

fn normalize_email(email: &str) -> CoreResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(CoreError::validation(format!("'{}' is not a valid email address", email))),
    }
}

fn display_name_or_default(display_name: &str, email: &str) -> String {
    let name = display_name.trim();
    if name.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        name.to_string()
    }
}
