use crate::ads::AdService;
use crate::auth::{
    IssuedToken, TokenIssuer, hash_password, require_identity, validate_password_strength,
    verify_password,
};
use crate::domain::{Ad, Identity, NewUser, User, UserChanges, UserId};
use crate::ports::UserRepository;
use crate::validation::{check_user_fields, ensure_id, normalize_email};
use shared::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Account management and login.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    ads: AdService,
    tokens: Arc<TokenIssuer>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, ads: AdService, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, ads, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn get_all(&self) -> Result<Vec<User>> {
        self.users.get_all().await
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<User> {
        ensure_id(id)?;
        self.users.get_by_id(id).await
    }

    /// Ads of an existing user; unknown users are `NotFound` rather than an empty list.
    pub async fn get_users_ads(&self, id: UserId) -> Result<Vec<Ad>> {
        self.get_by_id(id).await?;
        self.ads.get_by_owner(id).await
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        check_user_fields(&new_user.name, &new_user.email)?;
        validate_password_strength(&new_user.password)?;

        let email = normalize_email(&new_user.email);
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(format!("email {} is already registered", email)));
        }

        let user = User {
            id: 0,
            name: new_user.name.trim().to_string(),
            email,
            password_hash: hash_password(&new_user.password)?,
            birthday: new_user.birthday,
            contact: new_user.contact,
        };
        let user = self.users.create(user).await?;

        info!("CREATE_USER: id={}, email={}", user.id, user.email);
        Ok(user)
    }

    pub async fn update(
        &self,
        caller: Option<&Identity>,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User> {
        let current = self.load_self(caller, id).await?;
        check_user_fields(&changes.name, &changes.email)?;

        let email = normalize_email(&changes.email);
        if email != current.email {
            let taken = match self.users.get_by_email(&email).await? {
                Some(other) => other.id != id,
                None => false,
            };
            if taken {
                return Err(Error::Conflict(format!("email {} is already registered", email)));
            }
        }

        let user = User {
            id,
            name: changes.name.trim().to_string(),
            email,
            password_hash: current.password_hash,
            birthday: changes.birthday,
            contact: changes.contact,
        };
        let user = self.users.update(id, user).await?;

        info!("UPDATE_USER: id={}", user.id);
        Ok(user)
    }

    /// Removes the user's ads through [`AdService`] so their cache entries are
    /// dropped, then removes the user.
    pub async fn delete(&self, caller: Option<&Identity>, id: UserId) -> Result<()> {
        self.load_self(caller, id).await?;

        for ad in self.ads.get_by_owner(id).await? {
            match self.ads.delete(caller, ad.id).await {
                Ok(()) | Err(Error::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
        self.users.delete(id).await?;

        info!("DELETE_USER: id={}", id);
        Ok(())
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let Some(user) = self.users.get_by_email(&email).await? else {
            warn!("LOGIN_FAILED: unknown email={}", email);
            return Err(Error::Unauthenticated);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!("LOGIN_FAILED: bad password for id={}", user.id);
            return Err(Error::Unauthenticated);
        }
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let user = self.authenticate(email, password).await?;
        let token = self.tokens.issue(user.id)?;

        info!("LOGIN: id={}", user.id);
        Ok(token)
    }

    async fn load_self(&self, caller: Option<&Identity>, id: UserId) -> Result<User> {
        let caller = require_identity(caller)?;
        ensure_id(id)?;
        // Compared before the read: existence of other accounts is never revealed
        if caller.user_id != id {
            return Err(Error::Forbidden);
        }
        self.users.get_by_id(id).await
    }
}
