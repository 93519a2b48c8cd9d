//! Row models for the referral tables.

pub mod referral;
