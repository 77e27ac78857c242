//! Canonical DTOs and browser input forms.
//!
//! Every entity serializes to the browser in camelCase and is built from
//! upstream records through [`crate::normalize::FromUpstream`]. Input forms
//! validate and produce the upstream request body.

pub mod customer;
pub mod enums;
pub mod finance;
pub mod manual_bill;
pub mod purchase;
pub mod sale;
pub mod settings;
pub mod vehicle;

pub use customer::{Customer, CustomerInput};
pub use enums::{FuelType, PaymentMode, SaleStatus, VehicleStatus};
pub use finance::{FinanceCompany, FinanceCompanyInput};
pub use manual_bill::{BillItem, ManualBill, ManualBillDraft, ManualBillInput};
pub use purchase::{Purchase, PurchaseInput};
pub use sale::{Payment, PaymentInput, Sale, SaleDraft, SaleInput};
pub use settings::{DeliveryNoteSettings, DeliveryNoteSettingsInput};
pub use vehicle::{PublicVehicle, Vehicle, VehicleInput};
