//! Fixed food-bank directory
//!
//! Backs the "find a food bank near you" search and the map markers. The
//! catalog is compiled in; there is no lookup service behind it.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

struct CatalogEntry {
    id: u32,
    name: &'static str,
    address: &'static str,
    lat: f64,
    lon: f64,
    hours: &'static str,
    phone: &'static str,
    services: &'static [&'static str],
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: 1,
        name: "Downtown Community Pantry",
        address: "120 Main St",
        lat: 40.7128,
        lon: -74.0060,
        hours: "Mon-Fri 9am-5pm",
        phone: "(555) 201-1100",
        services: &["groceries", "hot meals", "baby supplies"],
    },
    CatalogEntry {
        id: 2,
        name: "Eastside Food Share",
        address: "48 River Rd",
        lat: 40.7306,
        lon: -73.9352,
        hours: "Tue-Sat 10am-4pm",
        phone: "(555) 201-2200",
        services: &["groceries", "fresh produce"],
    },
    CatalogEntry {
        id: 3,
        name: "Harbor Lights Kitchen",
        address: "9 Pier Ave",
        lat: 40.6782,
        lon: -73.9442,
        hours: "Daily 11am-2pm",
        phone: "(555) 201-3300",
        services: &["hot meals", "senior delivery"],
    },
    CatalogEntry {
        id: 4,
        name: "Northgate Family Market",
        address: "2001 Grand Concourse",
        lat: 40.8448,
        lon: -73.8648,
        hours: "Mon, Wed, Fri 1pm-7pm",
        phone: "(555) 201-4400",
        services: &["groceries", "halal", "kosher", "fresh produce"],
    },
    CatalogEntry {
        id: 5,
        name: "Westfield Mobile Pantry",
        address: "Westfield Mall lot C",
        lat: 40.7357,
        lon: -74.1724,
        hours: "Sat 8am-12pm",
        phone: "(555) 201-5500",
        services: &["groceries", "pet food"],
    },
];

/// A point on the map in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether the coordinates are inside the valid lat/lon ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Great-circle distance in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// A distribution site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodBank {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub hours: String,
    pub phone: String,
    pub services: Vec<String>,
}

/// A food bank and how far it is from the search origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyResult {
    pub bank: FoodBank,
    pub distance_km: f64,
}

/// Marker data for a map widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: u32,
    pub position: GeoPoint,
    pub title: String,
    /// Plain-text popup body; the widget is responsible for escaping it
    pub popup: String,
}

/// Searchable set of food banks
#[derive(Debug, Clone, Default)]
pub struct Directory {
    banks: Vec<FoodBank>,
}

impl Directory {
    pub fn new(banks: Vec<FoodBank>) -> Self {
        Self { banks }
    }

    /// The compiled-in catalog
    pub fn builtin() -> Self {
        let banks = CATALOG
            .iter()
            .map(|entry| FoodBank {
                id: entry.id,
                name: entry.name.to_string(),
                address: entry.address.to_string(),
                location: GeoPoint::new(entry.lat, entry.lon),
                hours: entry.hours.to_string(),
                phone: entry.phone.to_string(),
                services: entry.services.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self::new(banks)
    }

    pub fn all(&self) -> &[FoodBank] {
        &self.banks
    }

    pub fn get(&self, id: u32) -> Option<&FoodBank> {
        self.banks.iter().find(|b| b.id == id)
    }

    /// Banks within `radius_km` of `origin`, nearest first, at most `limit`
    pub fn nearby(&self, origin: GeoPoint, radius_km: f64, limit: usize) -> Vec<NearbyResult> {
        if !origin.is_valid() {
            return vec![];
        }

        let mut results: Vec<NearbyResult> = self
            .banks
            .iter()
            .map(|bank| NearbyResult {
                distance_km: haversine_km(origin, bank.location),
                bank: bank.clone(),
            })
            .filter(|r| r.distance_km <= radius_km)
            .collect();

        results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        results.truncate(limit);
        results
    }

    /// Case-insensitive match on name, address or service
    pub fn search_text(&self, query: &str) -> Vec<&FoodBank> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.banks.iter().collect();
        }

        self.banks
            .iter()
            .filter(|b| {
                b.name.to_lowercase().contains(&query)
                    || b.address.to_lowercase().contains(&query)
                    || b.services.iter().any(|s| s.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// One marker per bank
    pub fn markers(&self) -> Vec<MapMarker> {
        self.banks
            .iter()
            .map(|b| MapMarker {
                id: b.id,
                position: b.location,
                title: b.name.clone(),
                popup: format!("{}\n{}\n{}\n{}", b.name, b.address, b.hours, b.phone),
            })
            .collect()
    }
}
