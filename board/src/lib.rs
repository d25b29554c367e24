pub mod ads;
pub mod auth;
pub mod domain;
pub mod persistence;
pub mod ports;
pub mod users;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use ads::{AdCache, AdService};
pub use domain::{Ad, AdDraft, AdId, Identity, NewUser, User, UserChanges, UserId};
pub use ports::{AdRepository, CacheStore, UserRepository};
pub use users::UserService;
