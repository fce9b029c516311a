//! Quotation request data and its formatted form fields.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::extraction::{Bank, generate_cci};

/// Spanish month names as written in Peruvian documents ("setiembre").
pub const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "setiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Supplier data for one quotation, as entered by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationRequest {
    /// National ID (DNI).
    pub dni: String,

    /// Full name.
    pub nombres: String,

    /// Taxpayer number (RUC).
    #[serde(default)]
    pub ruc: String,

    pub telefono: String,

    pub correo: String,

    pub direccion: String,

    pub banco: Bank,

    /// Account number, hyphens allowed.
    pub cuenta: String,

    /// Explicit CCI; derived from `banco` and `cuenta` when absent or blank.
    #[serde(default)]
    pub cci: Option<String>,

    /// Offered amount.
    pub oferta: Decimal,

    /// Quotation date; defaults to the generation date.
    #[serde(default)]
    pub fecha: Option<NaiveDate>,
}

impl QuotationRequest {
    /// The CCI that will be written: the explicit one, or the derived one.
    pub fn effective_cci(&self) -> String {
        match self.cci.as_deref().map(str::trim) {
            Some(cci) if !cci.is_empty() => cci.to_string(),
            _ => generate_cci(self.banco.name(), &self.cuenta),
        }
    }

    /// Required-field checks. Returns one message per problem; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let required = [
            ("dni", &self.dni),
            ("nombres", &self.nombres),
            ("telefono", &self.telefono),
            ("correo", &self.correo),
            ("direccion", &self.direccion),
            ("cuenta", &self.cuenta),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                issues.push(format!("{} is required", name));
            }
        }

        if self.oferta <= Decimal::ZERO {
            issues.push(format!("oferta must be positive, got {}", self.oferta));
        }

        if self.banco == Bank::Other && self.effective_cci().is_empty() {
            issues.push("cci is required when banco is Otros".to_string());
        }

        issues
    }
}

/// Every caller-supplied token value, already formatted.
///
/// Converted into a token map by [`crate::resolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormFields {
    /// Long Spanish date, e.g. "5 de marzo de 2025".
    pub fecha: String,
    /// Upper-case month name.
    pub mes: String,
    pub year: String,
    /// Two-decimal amount.
    pub oferta: String,
    pub dni: String,
    pub nombres: String,
    pub ruc: String,
    pub telefono: String,
    pub correo: String,
    pub direccion: String,
    pub banco: String,
    pub cuenta: String,
    pub cci: String,
}

impl FormFields {
    /// Format a request. `today` is used when the request carries no date.
    pub fn from_request(request: &QuotationRequest, today: NaiveDate) -> Self {
        let date = request.fecha.unwrap_or(today);

        Self {
            fecha: format_spanish_date(date),
            mes: spanish_month(date).to_uppercase(),
            year: date.year().to_string(),
            oferta: format_amount(request.oferta),
            dni: request.dni.clone(),
            nombres: request.nombres.clone(),
            ruc: request.ruc.clone(),
            telefono: request.telefono.clone(),
            correo: request.correo.clone(),
            direccion: request.direccion.clone(),
            banco: request.banco.name().to_string(),
            cuenta: request.cuenta.clone(),
            cci: request.effective_cci(),
        }
    }
}

/// Lower-case Spanish month name.
pub fn spanish_month(date: NaiveDate) -> &'static str {
    SPANISH_MONTHS[date.month0() as usize]
}

/// "5 de marzo de 2025".
pub fn format_spanish_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), spanish_month(date), date.year())
}

/// Two decimals, half away from zero, no grouping.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}
