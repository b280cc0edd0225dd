use serde::{Deserialize, Serialize};

/// Body of `GET /api/tip/{year}/{quarter}/max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxTipResponse {
    #[serde(rename = "DOLocationID")]
    pub do_location_id: i64,
    #[serde(rename = "maxTipPercentage")]
    pub max_tip_percentage: f64,
}

/// Body of `GET /api/speed/{year}/{month}/{day}/max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSpeedsResponse {
    pub trip_speeds: Vec<HourlySpeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlySpeed {
    pub hour: i32,
    pub max_speed: f64,
}

/// Highest tip-rate trip of a quarter as stored in the trips table.
#[derive(Debug, Clone, PartialEq)]
pub struct TopTip {
    pub do_location_id: i64,
    pub tip_rate: f64,
}

impl From<TopTip> for MaxTipResponse {
    fn from(top: TopTip) -> Self {
        Self {
            do_location_id: top.do_location_id,
            max_tip_percentage: round_to(top.tip_rate, 1),
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
