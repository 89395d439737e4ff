use chrono::DateTime;
use diesel::prelude::*;
use garde::Validate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    schema::{review_images, reviews},
    spots::models::{Spot, SpotResponseBrief},
    users::models::{User, UserResponseBrief},
    Rating,
};

#[derive(Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Spot))]
#[diesel(table_name = reviews)]
pub struct Review {
    pub id: Uuid,
    pub body: String,
    pub stars: i32,
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
}

impl Rating for Review {
    fn rating(&self) -> f64 {
        self.stars as f64
    }
}

impl Review {
    pub fn into_response(self) -> ReviewResponse {
        ReviewResponse {
            id: self.id,
            user_id: self.user_id,
            spot_id: self.spot_id,
            review: self.body,
            stars: self.stars,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_detail_response(
        self,
        user: UserResponseBrief,
        images: Vec<ReviewImage>,
    ) -> ReviewDetailResponse {
        ReviewDetailResponse {
            id: self.id,
            user_id: self.user_id,
            spot_id: self.spot_id,
            review: self.body,
            stars: self.stars,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user,
            review_images: images
                .into_iter()
                .map(ReviewImage::into_response)
                .collect(),
        }
    }

    pub fn into_spot_response(
        self,
        spot: SpotResponseBrief,
        images: Vec<ReviewImage>,
    ) -> ReviewWithSpotResponse {
        ReviewWithSpotResponse {
            id: self.id,
            user_id: self.user_id,
            spot_id: self.spot_id,
            review: self.body,
            stars: self.stars,
            created_at: self.created_at,
            updated_at: self.updated_at,
            spot,
            review_images: images
                .into_iter()
                .map(ReviewImage::into_response)
                .collect(),
        }
    }
}

#[derive(Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(Review))]
#[diesel(table_name = review_images)]
pub struct ReviewImage {
    pub id: Uuid,
    pub url: String,
    pub review_id: Uuid,
    pub created_at: DateTime<chrono::Utc>,
}

impl ReviewImage {
    pub fn into_response(self) -> ReviewImageResponse {
        ReviewImageResponse {
            id: self.id,
            url: self.url,
        }
    }
}

#[derive(Validate, AsChangeset, Deserialize, ToSchema, TS, Debug)]
#[diesel(table_name = reviews)]
pub struct CreateReview {
    #[diesel(column_name = body)]
    #[garde(custom(review_text_required))]
    pub review: String,
    #[garde(custom(valid_stars))]
    pub stars: i32,
}

fn review_text_required(review: &str, _: &()) -> Result<(), garde::Error> {
    if review.trim().is_empty() {
        Err(garde::Error::new("Review text is required"))
    } else {
        Ok(())
    }
}

fn valid_stars(stars: &i32, _: &()) -> Result<(), garde::Error> {
    if (1..=5).contains(stars) {
        Ok(())
    } else {
        Err(garde::Error::new("Stars must be an integer from 1 to 5"))
    }
}

#[derive(Validate, Deserialize, ToSchema, TS, Debug)]
pub struct CreateReviewImage {
    #[garde(length(min = 1))]
    pub url: String,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Uuid,
    pub review: String,
    pub stars: i32,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
}

/// Review as listed under a spot, with its author and images
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetailResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Uuid,
    pub review: String,
    pub stars: i32,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
    #[serde(rename = "User")]
    pub user: UserResponseBrief,
    #[serde(rename = "ReviewImages")]
    pub review_images: Vec<ReviewImageResponse>,
}

/// Review as listed for its author, with the reviewed spot
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithSpotResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Uuid,
    pub review: String,
    pub stars: i32,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
    #[serde(rename = "Spot")]
    pub spot: SpotResponseBrief,
    #[serde(rename = "ReviewImages")]
    pub review_images: Vec<ReviewImageResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct ReviewImageResponse {
    pub id: Uuid,
    pub url: String,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct SpotReviewsResponse {
    #[serde(rename = "Reviews")]
    pub reviews: Vec<ReviewDetailResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct UserReviewsResponse {
    #[serde(rename = "Reviews")]
    pub reviews: Vec<ReviewWithSpotResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_out_of_range_are_rejected() {
        for stars in [0, 6, -1] {
            let payload = CreateReview {
                review: String::from("This was an awesome spot!"),
                stars,
            };

            let errors = payload.validate(&()).unwrap_err();
            let messages: Vec<String> = errors
                .flatten()
                .iter()
                .map(|(_, error)| error.to_string())
                .collect();

            assert!(messages
                .iter()
                .any(|m| m.contains("Stars must be an integer from 1 to 5")));
        }
    }

    #[test]
    fn stars_in_range_are_accepted() {
        for stars in 1..=5 {
            let payload = CreateReview {
                review: String::from("This was an awesome spot!"),
                stars,
            };

            assert!(payload.validate(&()).is_ok());
        }
    }

    #[test]
    fn empty_review_text_is_rejected() {
        let payload = CreateReview {
            review: String::from("   "),
            stars: 5,
        };

        assert!(payload.validate(&()).is_err());
    }
}
