use chrono::DateTime;
use diesel::prelude::*;
use garde::Validate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    reviews::models::Review,
    schema::{spot_images, spots},
    users::models::{User, UserResponseBrief},
    utils::average_rating,
};

#[derive(Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(User, foreign_key = owner_id))]
#[diesel(table_name = spots)]
pub struct Spot {
    pub id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub owner_id: Uuid,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
}

impl Spot {
    pub fn into_response(self, reviews: &[Review], preview_image: Option<String>) -> SpotResponse {
        SpotResponse {
            id: self.id,
            owner_id: self.owner_id,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            lat: self.lat,
            lng: self.lng,
            name: self.name,
            description: self.description,
            price: self.price,
            created_at: self.created_at,
            updated_at: self.updated_at,
            avg_rating: average_rating(reviews),
            preview_image,
        }
    }

    pub fn into_response_brief(self, preview_image: Option<String>) -> SpotResponseBrief {
        SpotResponseBrief {
            id: self.id,
            owner_id: self.owner_id,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            lat: self.lat,
            lng: self.lng,
            name: self.name,
            price: self.price,
            preview_image,
        }
    }

    pub fn into_detail_response(
        self,
        reviews: &[Review],
        images: Vec<SpotImage>,
        owner: UserResponseBrief,
    ) -> SpotDetailResponse {
        SpotDetailResponse {
            id: self.id,
            owner_id: self.owner_id,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            lat: self.lat,
            lng: self.lng,
            name: self.name,
            description: self.description,
            price: self.price,
            created_at: self.created_at,
            updated_at: self.updated_at,
            num_reviews: reviews.len() as i64,
            avg_star_rating: average_rating(reviews),
            spot_images: images.into_iter().map(SpotImage::into_response).collect(),
            owner,
        }
    }
}

#[derive(Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(Spot))]
#[diesel(table_name = spot_images)]
pub struct SpotImage {
    pub id: Uuid,
    pub url: String,
    pub preview: bool,
    pub spot_id: Uuid,
    pub created_at: DateTime<chrono::Utc>,
}

impl SpotImage {
    pub fn into_response(self) -> SpotImageResponse {
        SpotImageResponse {
            id: self.id,
            url: self.url,
            preview: self.preview,
        }
    }
}

#[derive(Validate, AsChangeset, Deserialize, ToSchema, TS, Debug)]
#[diesel(table_name = spots)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpot {
    #[garde(length(min = 1))]
    pub address: String,
    #[garde(length(min = 1))]
    pub city: String,
    #[garde(length(min = 1))]
    pub state: String,
    #[garde(length(min = 1))]
    pub country: String,
    #[garde(custom(valid_latitude))]
    pub lat: f64,
    #[garde(custom(valid_longitude))]
    pub lng: f64,
    #[garde(length(min = 1, max = 50))]
    pub name: String,
    #[garde(length(min = 1))]
    pub description: String,
    #[garde(custom(valid_price))]
    pub price: f64,
}

fn valid_latitude(lat: &f64, _: &()) -> Result<(), garde::Error> {
    if (-90.0..=90.0).contains(lat) {
        Ok(())
    } else {
        Err(garde::Error::new("Latitude is not valid"))
    }
}

fn valid_longitude(lng: &f64, _: &()) -> Result<(), garde::Error> {
    if (-180.0..=180.0).contains(lng) {
        Ok(())
    } else {
        Err(garde::Error::new("Longitude is not valid"))
    }
}

fn valid_price(price: &f64, _: &()) -> Result<(), garde::Error> {
    if *price > 0.0 {
        Ok(())
    } else {
        Err(garde::Error::new("Price per day is required"))
    }
}

#[derive(Validate, Deserialize, ToSchema, TS, Debug)]
pub struct CreateSpotImage {
    #[garde(length(min = 1))]
    pub url: String,
    #[garde(skip)]
    pub preview: bool,
}

/// List item, augmented with the review average and preview image url
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SpotResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
    pub avg_rating: f64,
    pub preview_image: Option<String>,
}

/// Summary nested inside review and booking responses
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SpotResponseBrief {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub price: f64,
    pub preview_image: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetailResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
    pub num_reviews: i64,
    pub avg_star_rating: f64,
    #[serde(rename = "SpotImages")]
    pub spot_images: Vec<SpotImageResponse>,
    #[serde(rename = "Owner")]
    pub owner: UserResponseBrief,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct SpotImageResponse {
    pub id: Uuid,
    pub url: String,
    pub preview: bool,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct SpotsResponse {
    #[serde(rename = "Spots")]
    pub spots: Vec<SpotResponse>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn spot_payload() -> CreateSpot {
        CreateSpot {
            address: String::from("123 Disney Lane"),
            city: String::from("San Francisco"),
            state: String::from("California"),
            country: String::from("United States of America"),
            lat: 37.76,
            lng: -122.47,
            name: String::from("App Academy"),
            description: String::from("Place where web developers are created"),
            price: 123.0,
        }
    }

    #[test]
    fn valid_spot_payload_passes() {
        assert!(spot_payload().validate(&()).is_ok());
    }

    #[test]
    fn name_longer_than_50_chars_is_rejected() {
        let mut payload = spot_payload();
        payload.name = "x".repeat(51);

        let errors = payload.validate(&()).unwrap_err();
        assert!(errors
            .flatten()
            .iter()
            .any(|(path, _)| path.contains("name")));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut payload = spot_payload();
        payload.lat = 91.0;
        payload.lng = -200.0;

        let errors = payload.validate(&()).unwrap_err();
        let fields: Vec<String> = errors
            .flatten()
            .iter()
            .map(|(path, _)| path.clone())
            .collect();

        assert!(fields.iter().any(|f| f.contains("lat")));
        assert!(fields.iter().any(|f| f.contains("lng")));
    }

    #[test]
    fn spot_with_no_reviews_reports_zero_average() {
        let spot = Spot {
            id: Uuid::now_v7(),
            address: String::from("123 Disney Lane"),
            city: String::from("San Francisco"),
            state: String::from("California"),
            country: String::from("United States of America"),
            lat: 37.76,
            lng: -122.47,
            name: String::from("App Academy"),
            description: String::from("Place where web developers are created"),
            price: 123.0,
            owner_id: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: None,
        };

        let response = spot.into_response(&[], None);

        assert_eq!(response.avg_rating, 0.0);
        assert_eq!(response.preview_image, None);
    }
}
