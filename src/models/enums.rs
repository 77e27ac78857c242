//! Enumerations that arrive as ordinals or as free-form strings.
//!
//! Upstream ordinals follow declaration order, starting at 0.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

fn token(value: &Value) -> Option<String> {
    value.as_str().map(|s| {
        s.trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect()
    })
}

fn ordinal(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Stock state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum VehicleStatus {
    Available,
    Reserved,
    Sold,
    #[default]
    Unknown,
}

impl VehicleStatus {
    pub fn from_value(value: &Value) -> Self {
        if let Some(n) = ordinal(value) {
            return match n {
                0 => Self::Available,
                1 => Self::Reserved,
                2 => Self::Sold,
                _ => Self::Unknown,
            };
        }
        match token(value).as_deref() {
            Some("available" | "instock" | "forsale" | "active" | "unsold") => Self::Available,
            Some("reserved" | "booked" | "onhold" | "hold") => Self::Reserved,
            Some("sold" | "delivered") => Self::Sold,
            _ => Self::Unknown,
        }
    }
}

/// Vehicle fuel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Cng,
    Lpg,
    Electric,
    Hybrid,
    #[default]
    Unknown,
}

impl FuelType {
    pub fn from_value(value: &Value) -> Self {
        if let Some(n) = ordinal(value) {
            return match n {
                0 => Self::Petrol,
                1 => Self::Diesel,
                2 => Self::Cng,
                3 => Self::Lpg,
                4 => Self::Electric,
                5 => Self::Hybrid,
                _ => Self::Unknown,
            };
        }
        match token(value).as_deref() {
            Some("petrol" | "gasoline" | "gas") => Self::Petrol,
            Some("diesel") => Self::Diesel,
            Some("cng") => Self::Cng,
            Some("lpg") => Self::Lpg,
            Some("electric" | "ev" | "bev") => Self::Electric,
            Some("hybrid" | "phev") => Self::Hybrid,
            _ => Self::Unknown,
        }
    }
}

/// Lifecycle of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
    #[default]
    Unknown,
}

impl SaleStatus {
    pub fn from_value(value: &Value) -> Self {
        if let Some(n) = ordinal(value) {
            return match n {
                0 => Self::Pending,
                1 => Self::Completed,
                2 => Self::Cancelled,
                _ => Self::Unknown,
            };
        }
        match token(value).as_deref() {
            Some("pending" | "draft" | "open" | "partiallypaid") => Self::Pending,
            Some("completed" | "complete" | "paid" | "closed" | "delivered") => Self::Completed,
            Some("cancelled" | "canceled" | "void" | "voided") => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

/// How one part of a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMode {
    Cash,
    BankTransfer,
    Cheque,
    Card,
    Upi,
    Finance,
    Exchange,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 7] = [
        Self::Cash,
        Self::BankTransfer,
        Self::Cheque,
        Self::Card,
        Self::Upi,
        Self::Finance,
        Self::Exchange,
    ];

    /// Unrecognized modes are `None`; a payment without a known mode cannot
    /// be booked.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(n) = ordinal(value) {
            return Self::ALL.get(usize::try_from(n).ok()?).copied();
        }
        match token(value).as_deref()? {
            "cash" => Some(Self::Cash),
            "banktransfer" | "bank" | "neft" | "rtgs" | "imps" | "transfer" | "wire" => {
                Some(Self::BankTransfer)
            }
            "cheque" | "check" | "dd" | "demanddraft" => Some(Self::Cheque),
            "card" | "creditcard" | "debitcard" => Some(Self::Card),
            "upi" => Some(Self::Upi),
            "finance" | "loan" | "financed" => Some(Self::Finance),
            "exchange" | "tradein" | "oldvehicle" => Some(Self::Exchange),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Upstream enum member name.
    pub fn pascal_name(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::BankTransfer => "BankTransfer",
            Self::Cheque => "Cheque",
            Self::Card => "Card",
            Self::Upi => "Upi",
            Self::Finance => "Finance",
            Self::Exchange => "Exchange",
        }
    }

    pub fn snake_name(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Finance => "finance",
            Self::Exchange => "exchange",
        }
    }
}

impl<'de> Deserialize<'de> for PaymentMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown payment mode {}", value)))
    }
}
