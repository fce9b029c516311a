//! CCI (Código de Cuenta Interbancario) derivation for Peruvian banks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Banks with a known CCI layout, plus the "other" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bank {
    #[serde(rename = "BCP")]
    Bcp,
    Interbank,
    Scotiabank,
    #[serde(rename = "Banco de la Nación")]
    BancoDeLaNacion,
    BanBif,
    #[serde(rename = "Otros")]
    Other,
}

impl Bank {
    /// Every selectable bank, in display order.
    pub const ALL: [Bank; 6] = [
        Bank::Bcp,
        Bank::Interbank,
        Bank::Scotiabank,
        Bank::BancoDeLaNacion,
        Bank::BanBif,
        Bank::Other,
    ];

    /// Display name, as written into the quotation.
    pub fn name(self) -> &'static str {
        match self {
            Bank::Bcp => "BCP",
            Bank::Interbank => "Interbank",
            Bank::Scotiabank => "Scotiabank",
            Bank::BancoDeLaNacion => "Banco de la Nación",
            Bank::BanBif => "BanBif",
            Bank::Other => "Otros",
        }
    }

    /// Exact-name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bank| bank.name() == name)
    }

    /// Fixed (prefix, suffix) wrapped around the account digits.
    pub fn cci_affixes(self) -> Option<(&'static str, &'static str)> {
        match self {
            Bank::Bcp => Some(("002", "13")),
            Bank::Interbank => Some(("003", "43")),
            Bank::Scotiabank => Some(("00936020", "95")),
            Bank::BancoDeLaNacion => Some(("0187810", "55")),
            Bank::BanBif => Some(("0386501", "83")),
            Bank::Other => None,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strip hyphen separators from an account number.
pub fn clean_account(raw_account: &str) -> String {
    raw_account.chars().filter(|&c| c != '-').collect()
}

/// Derive the CCI for an account.
///
/// Pure string transform: no length or checksum validation. Returns an empty
/// string for an empty, unknown or "Otros" bank and for an empty account.
pub fn generate_cci(bank_id: &str, raw_account: &str) -> String {
    if bank_id.is_empty() || raw_account.is_empty() {
        return String::new();
    }

    let Some((prefix, suffix)) = Bank::from_name(bank_id).and_then(Bank::cci_affixes) else {
        return String::new();
    };

    let account = clean_account(raw_account);
    let mut cci = String::with_capacity(prefix.len() + account.len() + suffix.len());
    cci.push_str(prefix);
    cci.push_str(&account);
    cci.push_str(suffix);
    cci
}
