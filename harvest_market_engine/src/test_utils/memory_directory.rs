//! An in-memory [`BuyerDirectory`] for tests and demos.

use std::collections::HashMap;

use crate::{
    db_types::UserId,
    traits::{BuyerContact, BuyerDirectory, DirectoryError},
};

#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    contacts: HashMap<String, BuyerContact>,
}

impl MemoryDirectory {
    pub fn with_contact(mut self, user_id: &str, name: &str, email: &str) -> Self {
        let contact = BuyerContact {
            user_id: UserId::from(user_id),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.contacts.insert(user_id.to_string(), contact);
        self
    }
}

impl BuyerDirectory for MemoryDirectory {
    async fn fetch_contact(&self, user_id: &UserId) -> Result<BuyerContact, DirectoryError> {
        self.contacts
            .get(user_id.as_str())
            .cloned()
            .ok_or_else(|| DirectoryError::ContactNotFound(user_id.clone()))
    }
}
