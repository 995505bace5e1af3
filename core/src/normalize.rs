//! Wire shapes and their normalization into canonical records.
//!
//! Backend versions disagree on field names (`hotelName` vs `name`,
//! `pricePerNight` vs `price`, `tripPlanId` vs `id`, `dailySchedules` vs
//! `days`, ...). Each wire struct
//! keeps every variant as its own optional field; `normalize` picks one
//! canonical value, preferring the first-listed name when both are present.
//! Records without any usable id are dropped from lists.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::types::{
    Accommodation, DaySchedule, Flight, Page, PlannedStay, SavedTripPlan, ScheduleItem, Theme,
    Transportation, TripPlace, TripPlanStatus,
};

/// Pagination body nested inside `result`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorPage<W> {
    #[serde(default = "Vec::new")]
    pub list: Vec<W>,
    #[serde(default)]
    pub next_cursor_id: Option<i64>,
    #[serde(default)]
    pub has_next: bool,
}

impl<W: Normalize> CursorPage<W> {
    pub fn into_page(self) -> Page<W::Output> {
        Page::new(normalize_list(self.list), self.next_cursor_id, self.has_next)
    }
}

/// `result` of the saved-plan listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TripPlanList {
    #[serde(default)]
    pub trip_plan_list: Vec<RawTripPlan>,
}

pub(crate) trait Normalize {
    type Output;

    fn normalize(self) -> Option<Self::Output>;
}

pub(crate) fn normalize_list<W: Normalize>(raw: Vec<W>) -> Vec<W::Output> {
    let total = raw.len();
    let items: Vec<_> = raw.into_iter().filter_map(Normalize::normalize).collect();
    if items.len() < total {
        warn!(
            dropped = total - items.len(),
            kind = std::any::type_name::<W::Output>(),
            "dropped incomplete records"
        );
    }
    items
}

/// Amount given as an integer, a float or a formatted string ("12,000원").
fn amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(amount_from_value))
}

fn amount_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Budget given either as text or as a number.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Drops empty strings so `a.or(b)` falls through to the other variant.
fn present(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTripPlace {
    #[serde(default)]
    trip_place_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default, deserialize_with = "amount")]
    view_count: Option<u64>,
}

impl Normalize for RawTripPlace {
    type Output = TripPlace;

    fn normalize(self) -> Option<TripPlace> {
        let id = self.trip_place_id.or(self.id)?;
        Some(TripPlace {
            id,
            name: present(self.name).or(present(self.title)).unwrap_or_default(),
            description: present(self.description).or(present(self.subtitle)),
            image_url: present(self.image_url).or(present(self.image)),
            tags: self.tags,
            themes: self.themes.iter().filter_map(|t| Theme::parse(t)).collect(),
            view_count: self.view_count,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawFlight {
    #[serde(default)]
    flight_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default)]
    departure_time: Option<String>,
    #[serde(default)]
    arrival_time: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    price: Option<u64>,
    #[serde(default, deserialize_with = "amount")]
    total_price: Option<u64>,
}

impl Normalize for RawFlight {
    type Output = Flight;

    fn normalize(self) -> Option<Flight> {
        let id = self.flight_id.or(self.id)?;
        Some(Flight {
            id,
            airline: present(self.airline).or(present(self.name)).unwrap_or_default(),
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price: self.price.or(self.total_price),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAccommodation {
    #[serde(default)]
    accommodation_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    hotel_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    price_per_night: Option<u64>,
    #[serde(default, deserialize_with = "amount")]
    price: Option<u64>,
    #[serde(default)]
    rating: Option<f64>,
}

impl Normalize for RawAccommodation {
    type Output = Accommodation;

    fn normalize(self) -> Option<Accommodation> {
        let id = self.accommodation_id.or(self.id)?;
        Some(Accommodation {
            id,
            name: present(self.hotel_name).or(present(self.name)).unwrap_or_default(),
            address: self.address,
            image_url: self.image_url,
            price_per_night: self.price_per_night.or(self.price),
            rating: self.rating,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTransportation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    airline: Option<String>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    destination: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    price: Option<u64>,
}

impl From<RawTransportation> for Transportation {
    fn from(raw: RawTransportation) -> Self {
        Transportation {
            name: present(raw.name).or(present(raw.airline)).unwrap_or_default(),
            origin: raw.origin,
            destination: raw.destination,
            price: raw.price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStay {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    hotel_name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    price_per_night: Option<u64>,
    #[serde(default, deserialize_with = "amount")]
    price: Option<u64>,
}

impl From<RawStay> for PlannedStay {
    fn from(raw: RawStay) -> Self {
        PlannedStay {
            name: present(raw.name).or(present(raw.hotel_name)).unwrap_or_default(),
            address: raw.address,
            price_per_night: raw.price_per_night.or(raw.price),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawScheduleItem {
    #[serde(default)]
    order_index: Option<i64>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl Normalize for RawScheduleItem {
    type Output = ScheduleItem;

    /// Stops without a title carry nothing to show and are dropped.
    fn normalize(self) -> Option<ScheduleItem> {
        Some(ScheduleItem {
            title: present(self.title)?,
            // "09:30:00" -> "09:30"
            time: present(self.time).map(|t| t.chars().take(5).collect()),
            description: present(self.description),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDaySchedule {
    #[serde(default)]
    day: Option<u32>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    schedules: Vec<RawScheduleItem>,
}

/// Days keep their server order; a missing day number falls back to the
/// position in the list. Stops are sorted by `orderIndex`, unindexed last.
fn normalize_days(raw: Vec<RawDaySchedule>) -> Vec<DaySchedule> {
    raw.into_iter()
        .zip(1u32..)
        .map(|(day, position)| {
            let mut stops = day.schedules;
            stops.sort_by_key(|s| s.order_index.unwrap_or(i64::MAX));
            DaySchedule {
                day: day.day.unwrap_or(position),
                date: present(day.date),
                schedules: normalize_list(stops),
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTripPlan {
    #[serde(default)]
    trip_plan_id: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "text")]
    budget: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transportations: Vec<RawTransportation>,
    #[serde(default)]
    accommodations: Vec<RawStay>,
    #[serde(default)]
    daily_schedules: Vec<RawDaySchedule>,
    #[serde(default)]
    days: Vec<RawDaySchedule>,
}

impl Normalize for RawTripPlan {
    type Output = SavedTripPlan;

    fn normalize(self) -> Option<SavedTripPlan> {
        let id = self.trip_plan_id.or(self.id)?;
        Some(SavedTripPlan {
            id,
            title: self.title.unwrap_or_default(),
            start_date: self.start_date,
            end_date: self.end_date,
            image_url: present(self.image_url),
            budget: present(self.budget),
            status: self
                .status
                .as_deref()
                .and_then(TripPlanStatus::parse)
                .unwrap_or_default(),
            transportations: self.transportations.into_iter().map(Into::into).collect(),
            accommodations: self.accommodations.into_iter().map(Into::into).collect(),
            days: normalize_days(if self.daily_schedules.is_empty() {
                self.days
            } else {
                self.daily_schedules
            }),
        })
    }
}
