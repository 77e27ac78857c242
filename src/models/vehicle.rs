//! Vehicles in stock, and their storefront projection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::enums::{FuelType, VehicleStatus};
use crate::normalize::{de, Fields, FromUpstream, NormalizeError};
use crate::validation::{FieldError, FieldErrors};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub purchase_id: Option<String>,
    pub make: String,
    pub model: String,
    pub variant: Option<String>,
    pub year: Option<i64>,
    pub registration_number: Option<String>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub colour: Option<String>,
    pub fuel_type: FuelType,
    pub transmission: Option<String>,
    pub mileage_km: Option<f64>,
    pub status: VehicleStatus,
    pub asking_price: Option<f64>,
    pub purchase_price: Option<f64>,
    pub images: Vec<String>,
}

impl Vehicle {
    /// "2019 Maruti Swift (MH12AB1234)".
    pub fn label(&self) -> String {
        let mut label = String::new();
        if let Some(year) = self.year {
            label.push_str(&year.to_string());
            label.push(' ');
        }
        label.push_str(self.make.trim());
        if !self.model.is_empty() {
            label.push(' ');
            label.push_str(&self.model);
        }
        if let Some(reg) = &self.registration_number {
            label.push_str(&format!(" ({reg})"));
        }
        label.trim().to_string()
    }
}

impl FromUpstream for Vehicle {
    const ENTITY: &'static str = "vehicle";

    fn from_upstream(r: &Fields<'_>) -> Result<Self, NormalizeError> {
        let mut images = r.list("images", &["image_urls", "photos", "vehicle_images"]);
        if images.is_empty() {
            images.extend(r.string("image_url", &["image", "photo_url", "thumbnail"]));
        }
        Ok(Self {
            id: r.id(&["vehicle_id"])?,
            purchase_id: r.string("purchase_id", &[]),
            make: r.require_string("make", &["brand", "manufacturer"])?,
            model: r.require_string("model", &["model_name"])?,
            variant: r.string("variant", &["trim"]),
            year: r.i64("year", &["manufacture_year", "model_year", "year_of_manufacture"]),
            registration_number: r.string(
                "registration_number",
                &["registration_no", "reg_no", "reg_number", "plate_number", "vehicle_number"],
            ),
            chassis_number: r.string("chassis_number", &["chassis_no", "vin"]),
            engine_number: r.string("engine_number", &["engine_no"]),
            colour: r.string("colour", &["color"]),
            fuel_type: r.raw("fuel_type", &["fuel"]).map(FuelType::from_value).unwrap_or_default(),
            transmission: r.string("transmission", &["gearbox"]),
            mileage_km: r.f64("mileage_km", &["mileage", "odometer", "kms_driven", "km_driven", "kilometers"]),
            status: r
                .raw("status", &["vehicle_status", "stock_status"])
                .map(VehicleStatus::from_value)
                .unwrap_or_default(),
            asking_price: r.f64("asking_price", &["selling_price", "sale_price", "price", "expected_price"]),
            purchase_price: r.f64("purchase_price", &["cost_price", "buying_price"]),
            images,
        })
    }
}

/// Vehicle as shown on the public storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicVehicle {
    pub id: String,
    pub title: String,
    pub make: String,
    pub model: String,
    pub variant: Option<String>,
    pub year: Option<i64>,
    pub colour: Option<String>,
    pub fuel_type: FuelType,
    pub transmission: Option<String>,
    pub mileage_km: Option<f64>,
    pub price: Option<f64>,
    pub images: Vec<String>,
}

impl PublicVehicle {
    /// Only vehicles on sale are published.
    pub fn publish(vehicle: Vehicle) -> Option<Self> {
        if vehicle.status != VehicleStatus::Available {
            return None;
        }
        let mut title = vehicle.label();
        if let Some(reg) = &vehicle.registration_number {
            title = title.replace(&format!(" ({reg})"), "");
        }
        Some(Self {
            id: vehicle.id,
            title,
            make: vehicle.make,
            model: vehicle.model,
            variant: vehicle.variant,
            year: vehicle.year,
            colour: vehicle.colour,
            fuel_type: vehicle.fuel_type,
            transmission: vehicle.transmission,
            mileage_km: vehicle.mileage_km,
            price: vehicle.asking_price,
            images: vehicle.images,
        })
    }
}

/// Vehicle create/update form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub variant: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub year: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub registration_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub chassis_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub engine_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub colour: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<Value>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub transmission: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub mileage_km: Option<f64>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub asking_price: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl VehicleInput {
    /// Validate into the upstream body. `prefix` scopes field paths when the
    /// vehicle is nested in another form.
    pub fn validate_into(self, prefix: &str, errors: &mut FieldErrors) -> Value {
        let path = |name: &str| format!("{prefix}{name}");
        let make = errors.required_text(&path("make"), self.make.as_deref());
        let model = errors.required_text(&path("model"), self.model.as_deref());

        let this_year = chrono::Datelike::year(&chrono::Utc::now().date_naive()) as f64;
        let year = match self.year {
            Some(y) if y.fract() != 0.0 || !(1900.0..=this_year + 1.0).contains(&y) => {
                errors.push(path("year"), "is not a valid model year");
                None
            }
            Some(y) => Some(y as i64),
            None => None,
        };
        if self.mileage_km.is_some_and(|m| m < 0.0) {
            errors.push(path("mileageKm"), "must not be negative");
        }
        if self.asking_price.is_some_and(|p| p < 0.0) {
            errors.push(path("askingPrice"), "must not be negative");
        }
        let fuel = self.fuel_type.as_ref().map(FuelType::from_value);
        if fuel == Some(FuelType::Unknown) {
            errors.push(path("fuelType"), "is not a known fuel type");
        }
        let status = self.status.as_ref().map(VehicleStatus::from_value);
        if status == Some(VehicleStatus::Unknown) {
            errors.push(path("status"), "is not a known status");
        }

        json!({
            "make": make,
            "model": model,
            "variant": FieldErrors::optional_text(self.variant.as_deref()),
            "year": year,
            "registrationNumber": self
                .registration_number
                .as_deref()
                .map(|r| r.replace([' ', '-'], "").to_uppercase()),
            "chassisNumber": FieldErrors::optional_text(self.chassis_number.as_deref()),
            "engineNumber": FieldErrors::optional_text(self.engine_number.as_deref()),
            "colour": FieldErrors::optional_text(self.colour.as_deref()),
            "fuelType": fuel.map(|f| serde_json::to_value(f).unwrap_or(Value::Null)),
            "transmission": FieldErrors::optional_text(self.transmission.as_deref()),
            "mileageKm": self.mileage_km,
            "status": status.map(|s| serde_json::to_value(s).unwrap_or(Value::Null)),
            "askingPrice": self.asking_price,
            "images": self.images,
        })
    }

    pub fn into_upstream(self) -> Result<Value, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let body = self.validate_into("", &mut errors);
        errors.finish(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_many;

    #[test]
    fn test_mixed_casing_list() {
        let vehicles: Vec<Vehicle> = normalize_many(json!({
            "$values": [
                {"VehicleId": 1, "Brand": "Maruti", "ModelName": "Swift", "Year": "2019",
                 "RegNo": "MH12AB1234", "FuelType": 1, "Status": 0, "Price": "4,50,000",
                 "Photos": [{"url": "a.jpg"}]},
                {"vehicle_id": "v2", "make": "Honda", "model": "City", "status": "SOLD",
                 "imageUrl": "b.jpg"}
            ]
        }))
        .unwrap();

        let swift = &vehicles[0];
        assert_eq!(swift.id, "1");
        assert_eq!(swift.label(), "2019 Maruti Swift (MH12AB1234)");
        assert_eq!(swift.fuel_type, FuelType::Diesel);
        assert_eq!(swift.status, VehicleStatus::Available);
        assert_eq!(swift.asking_price, Some(450000.0));
        assert_eq!(swift.images, vec!["a.jpg"]);

        assert_eq!(vehicles[1].status, VehicleStatus::Sold);
        assert_eq!(vehicles[1].images, vec!["b.jpg"]);
    }

    #[test]
    fn test_publish_hides_internal_fields() {
        let vehicle: Vehicle = crate::normalize::normalize_one(&json!({
            "id": 3, "make": "Tata", "model": "Nexon", "status": "available",
            "purchasePrice": 500000, "chassisNumber": "X1", "askingPrice": 650000,
            "registrationNumber": "KA01"
        }))
        .unwrap();
        let public = PublicVehicle::publish(vehicle.clone()).unwrap();
        assert_eq!(public.title, "Tata Nexon");
        assert_eq!(public.price, Some(650000.0));
        let body = serde_json::to_value(&public).unwrap();
        assert!(body.get("purchasePrice").is_none());
        assert!(body.get("chassisNumber").is_none());

        let sold = Vehicle { status: VehicleStatus::Sold, ..vehicle };
        assert!(PublicVehicle::publish(sold).is_none());
    }

    #[test]
    fn test_input_validation() {
        let input = VehicleInput {
            make: Some("Hyundai".into()),
            model: Some("i20".into()),
            year: Some(1850.0),
            fuel_type: Some(json!("kerosene")),
            registration_number: Some("mh 12-ab 1234".into()),
            ..Default::default()
        };
        let errors = input.clone().into_upstream().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["year", "fuelType"]);

        let ok = VehicleInput { year: Some(2020.0), fuel_type: Some(json!("Petrol")), ..input };
        let body = ok.into_upstream().unwrap();
        assert_eq!(body["registrationNumber"], "MH12AB1234");
        assert_eq!(body["fuelType"], "petrol");
        assert_eq!(body["year"], 2020);
    }
}
