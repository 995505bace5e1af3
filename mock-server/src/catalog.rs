//! Trip places, flights and accommodations with cursor pagination.
//!
//! Records are kept as raw JSON because the real backend is inconsistent
//! about field names; the seed data alternates between the variants.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{success, unauthorized, AppState, Db};

const DEFAULT_SIZE: usize = 10;
const MAX_SIZE: usize = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub theme: Option<String>,
    pub cursor_id: Option<i64>,
    pub size: Option<usize>,
}

fn record_id(record: &Value) -> Option<i64> {
    ["tripPlaceId", "flightId", "accommodationId", "id"]
        .iter()
        .find_map(|key| record.get(key)?.as_i64())
}

/// Items after `cursor` (ids ascending), at most `size` of them.
pub(crate) fn paginate<'a>(
    records: impl Iterator<Item = &'a Value>,
    cursor: Option<i64>,
    size: usize,
) -> Value {
    let size = size.clamp(1, MAX_SIZE);
    let mut remaining: Vec<&Value> = records
        .filter(|r| match (cursor, record_id(r)) {
            (Some(cursor), Some(id)) => id > cursor,
            _ => true,
        })
        .collect();
    let has_next = remaining.len() > size;
    remaining.truncate(size);
    let next_cursor_id = if has_next {
        remaining.last().and_then(|r| record_id(r))
    } else {
        None
    };
    json!({
        "list": remaining,
        "nextCursorId": next_cursor_id,
        "hasNext": has_next,
    })
}

/// Bearer is optional here, but a present and unknown one is rejected so
/// clients notice their session expired.
fn check_optional_bearer(db: &Db, headers: &HeaderMap) -> Result<(), Response> {
    if crate::bearer(headers).is_some() && db.user_for(headers).is_none() {
        return Err(unauthorized());
    }
    Ok(())
}

fn has_theme(place: &Value, theme: &str) -> bool {
    place["themes"]
        .as_array()
        .is_some_and(|themes| themes.iter().any(|t| t.as_str() == Some(theme)))
}

pub async fn trip_places(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let db = state.db.read().await;
    if let Err(rejected) = check_optional_bearer(&db, &headers) {
        return rejected;
    }
    let theme = query.theme.as_deref().map(str::to_ascii_uppercase);
    let matching = db
        .places
        .iter()
        .filter(|p| theme.as_deref().is_none_or(|t| has_theme(p, t)));
    success(paginate(
        matching,
        query.cursor_id,
        query.size.unwrap_or(DEFAULT_SIZE),
    ))
}

pub async fn flights(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let db = state.db.read().await;
    if let Err(rejected) = check_optional_bearer(&db, &headers) {
        return rejected;
    }
    success(paginate(
        db.flights.iter(),
        query.cursor_id,
        query.size.unwrap_or(DEFAULT_SIZE),
    ))
}

pub async fn accommodations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Response {
    let db = state.db.read().await;
    if let Err(rejected) = check_optional_bearer(&db, &headers) {
        return rejected;
    }
    success(paginate(
        db.accommodations.iter(),
        query.cursor_id,
        query.size.unwrap_or(DEFAULT_SIZE),
    ))
}

const PLACES: [(&str, &str, &str); 24] = [
    ("성산일출봉", "제주 동쪽 끝에서 보는 일출", "NATURE"),
    ("해운대 해수욕장", "부산의 대표 해변", "SEA"),
    ("경복궁", "조선 왕조의 법궁", "HISTORY"),
    ("전주 한옥마을", "한옥 700여 채가 모인 마을", "CULTURE"),
    ("설악산", "사계절 모두 아름다운 명산", "NATURE"),
    ("강릉 안목해변", "커피거리와 함께하는 바다", "SEA"),
    ("담양 죽녹원", "대나무 숲길 산책", "HEALING"),
    ("불국사", "신라 불교 예술의 정수", "HISTORY"),
    ("국립중앙박물관", "한국 역사를 한눈에", "CULTURE"),
    ("제주 올레길", "걷는 여행의 시작", "HEALING"),
    ("우도", "제주 옆 작은 섬", "SEA"),
    ("지리산", "한국 최초의 국립공원", "NATURE"),
    ("수원 화성", "정조의 꿈이 담긴 성곽", "HISTORY"),
    ("인사동", "전통 공예와 찻집 거리", "CULTURE"),
    ("보성 녹차밭", "초록 계단식 차밭", "HEALING"),
    ("남해 독일마을", "바다가 보이는 이국적인 마을", "SEA"),
    ("순천만 습지", "갈대밭과 철새", "NATURE"),
    ("안동 하회마을", "살아 있는 전통 마을", "HISTORY"),
    ("부산 감천문화마을", "알록달록한 골목", "CULTURE"),
    ("템플스테이 해인사", "산사에서의 하룻밤", "HEALING"),
    ("태안 꽃지해변", "할미 할아비 바위 낙조", "SEA"),
    ("한라산", "남한에서 가장 높은 산", "NATURE"),
    ("공주 공산성", "백제의 옛 수도", "HISTORY"),
    ("양평 두물머리", "두 강이 만나는 물안개", "HEALING"),
];

pub(crate) fn seed_places() -> Vec<Value> {
    PLACES
        .iter()
        .enumerate()
        .map(|(i, (name, description, theme))| {
            let id = i as i64 + 1;
            let image = format!("https://images.triptalk.app/places/{id}.jpg");
            if i % 2 == 0 {
                json!({
                    "tripPlaceId": id,
                    "name": name,
                    "description": description,
                    "imageUrl": image,
                    "themes": [theme],
                    "tags": [format!("#{theme}")],
                    "viewCount": 1000 - (id * 17),
                })
            } else {
                json!({
                    "id": id,
                    "title": name,
                    "subtitle": description,
                    "image": image,
                    "themes": [theme],
                    "viewCount": format!("{}", 900 - id * 13),
                })
            }
        })
        .collect()
}

const ROUTES: [(&str, &str, &str); 4] = [
    ("대한항공", "GMP", "CJU"),
    ("아시아나항공", "GMP", "PUS"),
    ("제주항공", "ICN", "NRT"),
    ("진에어", "ICN", "KIX"),
];

pub(crate) fn seed_flights() -> Vec<Value> {
    (1..=14)
        .map(|id: i64| {
            let (airline, origin, destination) = ROUTES[(id as usize) % ROUTES.len()];
            let hour = 6 + (id % 12);
            let price = 50_000 + id * 7_500;
            if id % 3 == 0 {
                json!({
                    "id": id,
                    "name": airline,
                    "origin": origin,
                    "destination": destination,
                    "departureTime": format!("{hour:02}:00"),
                    "arrivalTime": format!("{:02}:10", hour + 1),
                    "totalPrice": price as f64,
                })
            } else {
                json!({
                    "flightId": id,
                    "airline": airline,
                    "origin": origin,
                    "destination": destination,
                    "departureTime": format!("{hour:02}:00"),
                    "arrivalTime": format!("{:02}:10", hour + 1),
                    "price": price,
                })
            }
        })
        .collect()
}

const STAYS: [(&str, &str); 6] = [
    ("신라호텔 제주", "제주 서귀포시 중문관광로"),
    ("파라다이스 호텔 부산", "부산 해운대구 해운대해변로"),
    ("라한셀렉트 경주", "경북 경주시 보문로"),
    ("씨마크 호텔", "강원 강릉시 해안로"),
    ("전주 한옥 스테이", "전북 전주시 완산구 은행로"),
    ("여수 베네치아 호텔", "전남 여수시 오동도로"),
];

pub(crate) fn seed_accommodations() -> Vec<Value> {
    (1..=15)
        .map(|id: i64| {
            let (name, address) = STAYS[(id as usize) % STAYS.len()];
            let price = 80_000 + id * 12_000;
            let rating = 3.5 + (id % 4) as f64 * 0.4;
            if id % 2 == 0 {
                json!({
                    "accommodationId": id,
                    "hotelName": name,
                    "address": address,
                    "imageUrl": format!("https://images.triptalk.app/stays/{id}.jpg"),
                    "pricePerNight": price,
                    "rating": rating,
                })
            } else {
                json!({
                    "id": id,
                    "name": name,
                    "address": address,
                    "price": format!("{price}"),
                    "rating": rating,
                })
            }
        })
        .collect()
}
