//! Card types.
//!
//! Card numbers and verification values are sensitive. They live only as long
//! as the request that carries them, and the `Debug` output of [`CardDetails`]
//! masks both, so a stray `{:?}` in a log line cannot leak them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

/// Card network brands accepted by the acquirer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    /// Visa credit and debit.
    Visa,
    /// Mastercard.
    Mastercard,
    /// American Express.
    Amex,
    /// Diners Club.
    Diners,
    /// Switch (legacy UK debit, needs an issue number).
    Switch,
    /// Solo (legacy UK debit, routed as Switch).
    Solo,
    /// Laser (legacy Irish debit).
    Laser,
    /// Maestro (routed as Mastercard).
    Maestro,
}

impl CardBrand {
    /// The acquirer's `<type>` code for this brand.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Visa => "VISA",
            Self::Mastercard | Self::Maestro => "MC",
            Self::Amex => "AMEX",
            Self::Diners => "DINERS",
            Self::Switch | Self::Solo => "SWITCH",
            Self::Laser => "LASER",
        }
    }

    /// Length of the verification value printed on cards of this brand.
    #[must_use]
    pub const fn verification_len(self) -> usize {
        match self {
            Self::Amex => 4,
            _ => 3,
        }
    }
}

impl FromStr for CardBrand {
    type Err = GatewayError;

    /// Parse the brand names used by storefront card models.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visa" => Ok(Self::Visa),
            "master" | "mastercard" | "mc" => Ok(Self::Mastercard),
            "american_express" | "amex" => Ok(Self::Amex),
            "diners_club" | "diners" => Ok(Self::Diners),
            "switch" => Ok(Self::Switch),
            "solo" => Ok(Self::Solo),
            "laser" => Ok(Self::Laser),
            "maestro" => Ok(Self::Maestro),
            other => Err(GatewayError::Validation(format!(
                "unsupported card brand: {other}"
            ))),
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Card data for a single authorize or purchase call.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    /// Primary account number, digits only.
    pub number: String,
    /// Expiry month, 1 to 12.
    pub expiry_month: u8,
    /// Expiry year, two or four digits.
    pub expiry_year: u16,
    /// Card verification value, if the customer supplied one.
    pub verification_value: Option<String>,
    /// Name printed on the card.
    pub holder_name: String,
    /// Card network.
    pub brand: CardBrand,
    /// Issue number printed on some legacy debit cards (Switch, Solo).
    pub issue_number: Option<String>,
}

impl CardDetails {
    /// Create card details without a verification value or issue number.
    pub fn new(
        number: impl Into<String>,
        expiry_month: u8,
        expiry_year: u16,
        holder_name: impl Into<String>,
        brand: CardBrand,
    ) -> Self {
        Self {
            number: number.into(),
            expiry_month,
            expiry_year,
            verification_value: None,
            holder_name: holder_name.into(),
            brand,
            issue_number: None,
        }
    }

    /// Attach a verification value.
    #[must_use]
    pub fn with_verification_value(mut self, cvv: impl Into<String>) -> Self {
        self.verification_value = Some(cvv.into());
        self
    }

    /// Attach an issue number.
    #[must_use]
    pub fn with_issue_number(mut self, issue: impl Into<String>) -> Self {
        self.issue_number = Some(issue.into());
        self
    }

    /// Check the fields the acquirer would otherwise reject.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] describing the first bad field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.number.is_empty() || !self.number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GatewayError::Validation(
                "card number must be a non-empty string of digits".into(),
            ));
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err(GatewayError::Validation(format!(
                "expiry month {} is out of range",
                self.expiry_month
            )));
        }
        if !(self.expiry_year < 100 || (1000..=9999).contains(&self.expiry_year)) {
            return Err(GatewayError::Validation(format!(
                "expiry year {} must have two or four digits",
                self.expiry_year
            )));
        }
        if self.holder_name.trim().is_empty() {
            return Err(GatewayError::Validation("card holder name is empty".into()));
        }
        if let Some(cvv) = self.verification_value.as_deref() {
            if cvv.is_empty() || !cvv.bytes().all(|b| b.is_ascii_digit()) {
                return Err(GatewayError::Validation(
                    "verification value must be digits".into(),
                ));
            }
            if cvv.len() != self.brand.verification_len() {
                return Err(GatewayError::Validation(format!(
                    "{} verification value must have {} digits",
                    self.brand,
                    self.brand.verification_len()
                )));
            }
        }
        if let Some(issue) = self.issue_number.as_deref() {
            if issue.trim().is_empty() {
                return Err(GatewayError::Validation("issue number is blank".into()));
            }
        }
        Ok(())
    }

    /// Expiry in the acquirer's `MMYY` form.
    #[must_use]
    pub fn expiry_date(&self) -> String {
        format!("{:02}{:02}", self.expiry_month, self.expiry_year % 100)
    }

    /// The last four digits, for display and logs.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or_default()
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("expiry", &self.expiry_date())
            .field(
                "verification_value",
                &self.verification_value.as_ref().map(|_| "***"),
            )
            .field("holder_name", &self.holder_name)
            .field("brand", &self.brand)
            .field("issue_number", &self.issue_number)
            .finish()
    }
}
