//! Client library for the external CRM's contact directory.
//!
//! The pieces here are deliberately small: phone-number canonicalization
//! ([`phone`]), the contact payload and lifecycle labels the CRM hands back
//! ([`contact`]), and the lookup seam plus its HTTP implementation
//! ([`directory`]). Everything that decides what to *do* with a contact
//! lives in the `lead_sync` crate; this crate only fetches and shapes data.

pub mod contact;
pub mod directory;
pub mod phone;
