// src/models/claims.rs
//! Bank-ID identity claims.
//!
//! The claims arrive from the upstream OIDC callback as an already-decoded JSON
//! object (or as the raw id token). They are untrusted: the payload is shape
//! checked before the subject is used as the identity seed, and it is dropped
//! once the identity and its credential request have been derived from it.

use crate::error::ClaimsError;
use chrono::{Datelike, NaiveDate};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Decoded bank-ID token claims.
///
/// Only `sub` is required; every other claim is optional because the issuing
/// identity provider decides which attributes it releases.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Stable subject identifier; the seed for identity derivation.
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Either `dd.mm.yyyy` (as the bank-ID provider sends it) or ISO `yyyy-mm-dd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Attributes attested by the nationality/age/gender credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialAttributes {
    pub name: String,
    pub gender: String,
    pub age: String,
    pub nationality: String,
}

impl TokenClaims {
    /// Parses and validates a decoded claims payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ClaimsError> {
        let claims: Self = serde_json::from_slice(bytes)?;
        claims.validate()?;
        Ok(claims)
    }

    /// Reads the claims out of a raw id token without checking its signature.
    ///
    /// The token was already verified by the OIDC callback that handed it to
    /// us; this only exists so callers can pass the token through unchanged.
    pub fn from_unverified_jwt(token: &str) -> Result<Self, ClaimsError> {
        let header = jsonwebtoken::decode_header(token)?;
        let mut validation = Validation::new(header.alg);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<Self>(token, &DecodingKey::from_secret(&[]), &validation)?;
        data.claims.validate()?;
        Ok(data.claims)
    }

    /// Checks the claims are usable as an identity seed.
    pub fn validate(&self) -> Result<(), ClaimsError> {
        if self.sub.trim().is_empty() {
            return Err(ClaimsError::Missing("sub"));
        }
        if self.sub.chars().any(char::is_control) {
            return Err(ClaimsError::Malformed {
                claim: "sub",
                message: "contains control characters".into(),
            });
        }
        self.birth_date()?;
        Ok(())
    }

    /// Seed bytes for deterministic identity derivation.
    pub fn seed(&self) -> &[u8] {
        self.sub.as_bytes()
    }

    /// Parsed birth date, if the claim is present.
    pub fn birth_date(&self) -> Result<Option<NaiveDate>, ClaimsError> {
        let Some(raw) = self.birthdate.as_deref() else {
            return Ok(None);
        };
        NaiveDate::parse_from_str(raw, "%d.%m.%Y")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .map(Some)
            .map_err(|e| ClaimsError::Malformed {
                claim: "birthdate",
                message: e.to_string(),
            })
    }

    /// Age as the difference between `today`'s year and the birth year.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.birth_date()
            .ok()
            .flatten()
            .map(|born| today.year() - born.year())
    }

    /// Display name, falling back to given and family name.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the credential subject attributes issued for these claims.
    pub fn credential_attributes(&self, nationality: &str, today: NaiveDate) -> CredentialAttributes {
        CredentialAttributes {
            name: self.display_name(),
            gender: self.gender.clone().unwrap_or_default(),
            age: self
                .age_on(today)
                .map(|age| age.to_string())
                .unwrap_or_default(),
            nationality: nationality.to_string(),
        }
    }
}
