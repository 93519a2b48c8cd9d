//! Contact lookup abstraction over the CRM.
//!
//! This module defines the [`ContactDirectory`] trait, the single seam
//! through which the reconciliation jobs reach the CRM. The production
//! implementation is [`rest::RestDirectory`]; tests substitute in-memory
//! fakes.
//!
//! The trait is async and supports dynamic dispatch (`dyn ContactDirectory`)
//! so a job can be wired against any backend at runtime.

pub mod errors;
pub mod rest;

use async_trait::async_trait;

use crate::contact::Contact;
use errors::DirectoryError;

/// A directory of CRM contacts, addressable by canonical phone number.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Looks up the contact for a canonicalized phone number.
    ///
    /// `Ok(None)` means the CRM has no record for this phone; it is a normal
    /// outcome, not an error.
    async fn contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct AlwaysFound;
    struct AlwaysEmpty;

    #[async_trait]
    impl ContactDirectory for AlwaysFound {
        async fn contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, DirectoryError> {
            Ok(Some(Contact {
                phone: Some(phone.to_string()),
                lifecycle: Some("New".into()),
            }))
        }
    }

    #[async_trait]
    impl ContactDirectory for AlwaysEmpty {
        async fn contact_by_phone(&self, _phone: &str) -> Result<Option<Contact>, DirectoryError> {
            Ok(None)
        }
    }

    fn pick(found: bool) -> Box<dyn ContactDirectory> {
        if found { Box::new(AlwaysFound) } else { Box::new(AlwaysEmpty) }
    }

    #[tokio::test]
    async fn trait_objects_dispatch_at_runtime() {
        let dir = pick(true);
        let contact = dir.contact_by_phone("+212612345678").await.unwrap();
        assert!(contact.is_some());

        let dir = pick(false);
        assert!(dir.contact_by_phone("+212612345678").await.unwrap().is_none());
    }
}
