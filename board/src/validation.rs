use crate::domain::AdDraft;
use shared::{Error, Result};

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// Business rules applied to ad payloads before they reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdRules {
    /// Lowest accepted price, inclusive. Zero allows free items.
    pub min_price: i64,
}

impl Default for AdRules {
    fn default() -> Self {
        Self { min_price: 0 }
    }
}

impl AdRules {
    pub fn with_min_price(min_price: i64) -> Self {
        Self {
            min_price: min_price.max(0),
        }
    }

    pub fn check(&self, draft: &AdDraft) -> Result<()> {
        if draft.title.trim().is_empty() {
            return Err(Error::invalid("title must not be empty"));
        }
        if draft.title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::invalid(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if draft.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(Error::invalid(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }
        if draft.price < self.min_price {
            return Err(Error::invalid(format!(
                "price must be at least {}",
                self.min_price
            )));
        }
        Ok(())
    }
}

/// Store-assigned ids start at 1.
pub fn ensure_id(id: i64) -> Result<()> {
    if id <= 0 {
        return Err(Error::invalid("id must be a positive integer"));
    }
    Ok(())
}

pub fn check_user_fields(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid("name must not be empty"));
    }

    let email = email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid_email {
        return Err(Error::invalid("email is not valid"));
    }

    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
