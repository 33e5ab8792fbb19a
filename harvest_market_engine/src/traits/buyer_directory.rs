use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::UserId;

/// Contact details for a buyer, as held by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerContact {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("Directory lookup failed: {0}")]
    LookupFailed(String),
    #[error("There is no contact record for user {0}")]
    ContactNotFound(UserId),
}

#[allow(async_fn_in_trait)]
pub trait BuyerDirectory {
    /// Fetch the contact record for the given user. Identity lives outside this engine; the invoice
    /// flow calls this to attach buyer details to a fully resolved order before handing it to the
    /// renderer. If the user is unknown, the error [`DirectoryError::ContactNotFound`] is returned.
    async fn fetch_contact(&self, user_id: &UserId) -> Result<BuyerContact, DirectoryError>;
}
