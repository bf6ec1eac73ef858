//! Quota counter key

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::QUOTA_KEY_PREFIX;

/// Identifies one account's call counter for one calendar day.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaKey {
    pub account_id: String,
    pub date: NaiveDate,
}

impl QuotaKey {
    pub fn new(account_id: impl Into<String>, date: NaiveDate) -> Self {
        Self { account_id: account_id.into(), date }
    }

    /// String form shared by every process: `tap-pardot/<account>/<YYYY-MM-DD>`.
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", QUOTA_KEY_PREFIX, self.account_id, self.date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for QuotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
