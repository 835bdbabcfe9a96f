//! # Metadata Locator
//!
//! One mutable base URI for the whole ledger. A token's metadata lives at
//! the base URI with every `{id}` placeholder replaced by the token id as
//! 64 lowercase hex digits, so clients can fetch metadata for any id
//! without a per-token registry.

use assent_protocol::config::TOKEN_ID_PLACEHOLDER;
use assent_protocol::types::{to_padded_hex, TokenId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataStore {
    base_uri: String,
}

impl MetadataStore {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn set_base_uri(&mut self, uri: impl Into<String>) {
        self.base_uri = uri.into();
    }

    /// Renders the locator for `token_id`. A base URI without a placeholder
    /// is returned verbatim.
    pub fn uri(&self, token_id: &TokenId) -> String {
        if self.base_uri.contains(TOKEN_ID_PLACEHOLDER) {
            self.base_uri
                .replace(TOKEN_ID_PLACEHOLDER, &to_padded_hex(token_id))
        } else {
            self.base_uri.clone()
        }
    }
}
