use chrono::{DateTime, NaiveDate};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    schema::bookings,
    spots::models::{Spot, SpotResponseBrief},
    users::models::{User, UserResponseBrief},
};

#[derive(Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Spot))]
#[diesel(table_name = bookings)]
pub struct Booking {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
}

impl Booking {
    pub fn into_response(self) -> BookingResponse {
        BookingResponse {
            id: self.id,
            spot_id: self.spot_id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_response_brief(self) -> BookingResponseBrief {
        BookingResponseBrief {
            spot_id: self.spot_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn into_spot_response(self, spot: SpotResponseBrief) -> BookingWithSpotResponse {
        BookingWithSpotResponse {
            id: self.id,
            spot_id: self.spot_id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            spot,
        }
    }

    pub fn into_user_response(self, user: UserResponseBrief) -> BookingWithUserResponse {
        BookingWithUserResponse {
            id: self.id,
            spot_id: self.spot_id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user,
        }
    }

    /// Half-open overlap test does not apply here; bookings touching on
    /// a shared boundary date still conflict
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        self.start_date <= end_date && start_date <= self.end_date
    }
}

#[derive(AsChangeset, Deserialize, ToSchema, TS, Debug)]
#[diesel(table_name = bookings)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CreateBooking {
    pub fn date_range_is_valid(&self) -> bool {
        self.start_date < self.end_date
    }
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
}

/// What non-owners get to see about a spot's bookings
#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponseBrief {
    pub spot_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithSpotResponse {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
    #[serde(rename = "Spot")]
    pub spot: SpotResponseBrief,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithUserResponse {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<chrono::Utc>,
    pub updated_at: Option<DateTime<chrono::Utc>>,
    #[serde(rename = "User")]
    pub user: UserResponseBrief,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct UserBookingsResponse {
    #[serde(rename = "Bookings")]
    pub bookings: Vec<BookingWithSpotResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct SpotBookingsResponse {
    #[serde(rename = "Bookings")]
    pub bookings: Vec<BookingWithUserResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, TS, Debug)]
#[ts(export)]
pub struct SpotBookingsBriefResponse {
    #[serde(rename = "Bookings")]
    pub bookings: Vec<BookingResponseBrief>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn booking(start_date: NaiveDate, end_date: NaiveDate) -> Booking {
        Booking {
            id: Uuid::now_v7(),
            spot_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            start_date,
            end_date,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn end_date_must_follow_start_date() {
        let payload = CreateBooking {
            start_date: date(2026, 9, 10),
            end_date: date(2026, 9, 12),
        };
        assert!(payload.date_range_is_valid());

        let same_day = CreateBooking {
            start_date: date(2026, 9, 10),
            end_date: date(2026, 9, 10),
        };
        assert!(!same_day.date_range_is_valid());

        let backwards = CreateBooking {
            start_date: date(2026, 9, 12),
            end_date: date(2026, 9, 10),
        };
        assert!(!backwards.date_range_is_valid());
    }

    #[test]
    fn overlapping_ranges_conflict() {
        let existing = booking(date(2026, 9, 10), date(2026, 9, 15));

        // fully inside
        assert!(existing.overlaps(date(2026, 9, 11), date(2026, 9, 14)));
        // straddles the start
        assert!(existing.overlaps(date(2026, 9, 8), date(2026, 9, 11)));
        // straddles the end
        assert!(existing.overlaps(date(2026, 9, 14), date(2026, 9, 18)));
        // surrounds
        assert!(existing.overlaps(date(2026, 9, 1), date(2026, 9, 30)));
    }

    #[test]
    fn shared_boundary_dates_conflict() {
        let existing = booking(date(2026, 9, 10), date(2026, 9, 15));

        assert!(existing.overlaps(date(2026, 9, 15), date(2026, 9, 20)));
        assert!(existing.overlaps(date(2026, 9, 5), date(2026, 9, 10)));
    }

    #[test]
    fn disjoint_ranges_do_not_conflict() {
        let existing = booking(date(2026, 9, 10), date(2026, 9, 15));

        assert!(!existing.overlaps(date(2026, 9, 16), date(2026, 9, 20)));
        assert!(!existing.overlaps(date(2026, 9, 1), date(2026, 9, 9)));
    }
}
