//! Per-hour plan record and its wire form.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One hour of a subject's or object's day plan
///
/// `P1` is the supplied reading; `P2` is derived from it through the
/// coefficient and volume unless the server already stored a value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "HourRecordWire")]
pub struct HourRecord {
    pub hour: u8,
    #[serde(rename = "P1")]
    pub p1: f64,
    #[serde(rename = "P1_Gen")]
    pub p1_gen: f64,
    /// Stored P2; `None` until the server has computed it
    #[serde(rename = "P2")]
    pub p2: Option<f64>,
    #[serde(rename = "P2_Gen")]
    pub p2_gen: Option<f64>,
    #[serde(rename = "P3")]
    pub p3: f64,
    #[serde(rename = "P3_Gen")]
    pub p3_gen: f64,
    #[serde(rename = "F1")]
    pub f1: f64,
    #[serde(rename = "F1_Gen")]
    pub f1_gen: f64,
    #[serde(rename = "F2")]
    pub f2: f64,
    #[serde(rename = "F2_Gen")]
    pub f2_gen: f64,
    pub coefficient: f64,
    #[serde(rename = "coefficient_Gen")]
    pub coefficient_gen: f64,
    pub volume: f64,
    #[serde(rename = "volume_Gen")]
    pub volume_gen: f64,
    #[serde(rename = "P2_message")]
    pub p2_message: String,
    #[serde(rename = "P2_Gen_message")]
    pub p2_gen_message: String,
    pub message: String,
}

impl HourRecord {
    /// Default record for an hour: zero readings, identity coefficients
    pub fn new(hour: u8) -> Self {
        Self {
            hour,
            p1: 0.0,
            p1_gen: 0.0,
            p2: None,
            p2_gen: None,
            p3: 0.0,
            p3_gen: 0.0,
            f1: 0.0,
            f1_gen: 0.0,
            f2: 0.0,
            f2_gen: 0.0,
            coefficient: 1.0,
            coefficient_gen: 1.0,
            volume: 0.0,
            volume_gen: 0.0,
            p2_message: String::new(),
            p2_gen_message: String::new(),
            message: String::new(),
        }
    }

    /// `P1 * coefficient + volume`, rounded to 2 places
    pub fn calculate_p2(&self) -> f64 {
        round2(self.p1 * self.coefficient + self.volume)
    }

    /// `P1_Gen * coefficient_Gen + volume_Gen`, rounded to 2 places
    pub fn calculate_p2_gen(&self) -> f64 {
        round2(self.p1_gen * self.coefficient_gen + self.volume_gen)
    }

    /// Stored P2 when present, the computed value otherwise
    pub fn display_p2(&self) -> f64 {
        self.p2.unwrap_or_else(|| self.calculate_p2())
    }

    pub fn display_p2_gen(&self) -> f64 {
        self.p2_gen.unwrap_or_else(|| self.calculate_p2_gen())
    }

    pub fn series(&self, series: PlanSeries) -> f64 {
        series.value(self)
    }
}

impl Default for HourRecord {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// The named planning-stage series of an hour record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanSeries {
    P1,
    P1Gen,
    P2,
    P2Gen,
    P3,
    P3Gen,
    F1,
    F1Gen,
    F2,
    F2Gen,
}

impl PlanSeries {
    /// All series in table column order
    pub const ALL: [PlanSeries; 10] = [
        Self::P1,
        Self::P1Gen,
        Self::P2,
        Self::P2Gen,
        Self::P3,
        Self::P3Gen,
        Self::F1,
        Self::F1Gen,
        Self::F2,
        Self::F2Gen,
    ];

    pub fn is_gen(self) -> bool {
        matches!(
            self,
            Self::P1Gen | Self::P2Gen | Self::P3Gen | Self::F1Gen | Self::F2Gen
        )
    }

    /// Column header used in exports
    pub fn column_name(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P1Gen => "P1_Gen",
            Self::P2 => "P2",
            Self::P2Gen => "P2_Gen",
            Self::P3 => "P3",
            Self::P3Gen => "P3_Gen",
            Self::F1 => "F1",
            Self::F1Gen => "F1_Gen",
            Self::F2 => "F2",
            Self::F2Gen => "F2_Gen",
        }
    }

    /// Stored reading; an unset P2 counts as zero
    pub fn value(self, record: &HourRecord) -> f64 {
        match self {
            Self::P1 => record.p1,
            Self::P1Gen => record.p1_gen,
            Self::P2 => record.p2.unwrap_or(0.0),
            Self::P2Gen => record.p2_gen.unwrap_or(0.0),
            Self::P3 => record.p3,
            Self::P3Gen => record.p3_gen,
            Self::F1 => record.f1,
            Self::F1Gen => record.f1_gen,
            Self::F2 => record.f2,
            Self::F2Gen => record.f2_gen,
        }
    }

    /// Series applicable to an entity, dropping `_Gen` when it has no generation
    pub fn applicable(has_generation: bool) -> Vec<PlanSeries> {
        Self::ALL
            .into_iter()
            .filter(|s| has_generation || !s.is_gen())
            .collect()
    }
}

/// Numbers arrive as JSON numbers or as decimal strings
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn get(self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn num(value: Option<LooseNumber>) -> Option<f64> {
    value.and_then(LooseNumber::get)
}

/// The server sends 0 for hours whose P2 is not computed yet
fn computed(value: Option<LooseNumber>) -> Option<f64> {
    num(value).filter(|v| *v != 0.0)
}

/// Server representation: every field optional and nullable
#[derive(Deserialize)]
struct HourRecordWire {
    hour: u8,
    #[serde(rename = "P1")]
    p1: Option<LooseNumber>,
    #[serde(rename = "P1_Gen")]
    p1_gen: Option<LooseNumber>,
    #[serde(rename = "P2")]
    p2: Option<LooseNumber>,
    #[serde(rename = "P2_Gen")]
    p2_gen: Option<LooseNumber>,
    #[serde(rename = "P3")]
    p3: Option<LooseNumber>,
    #[serde(rename = "P3_Gen")]
    p3_gen: Option<LooseNumber>,
    #[serde(rename = "F1")]
    f1: Option<LooseNumber>,
    #[serde(rename = "F1_Gen")]
    f1_gen: Option<LooseNumber>,
    #[serde(rename = "F2")]
    f2: Option<LooseNumber>,
    #[serde(rename = "F2_Gen")]
    f2_gen: Option<LooseNumber>,
    coefficient: Option<LooseNumber>,
    #[serde(rename = "coefficient_Gen")]
    coefficient_gen: Option<LooseNumber>,
    volume: Option<LooseNumber>,
    #[serde(rename = "volume_Gen")]
    volume_gen: Option<LooseNumber>,
    #[serde(rename = "P2_message")]
    p2_message: Option<String>,
    #[serde(rename = "P2_Gen_message")]
    p2_gen_message: Option<String>,
    message: Option<String>,
}

impl From<HourRecordWire> for HourRecord {
    fn from(w: HourRecordWire) -> Self {
        Self {
            hour: w.hour,
            p1: num(w.p1).unwrap_or(0.0),
            p1_gen: num(w.p1_gen).unwrap_or(0.0),
            p2: computed(w.p2),
            p2_gen: computed(w.p2_gen),
            p3: num(w.p3).unwrap_or(0.0),
            p3_gen: num(w.p3_gen).unwrap_or(0.0),
            f1: num(w.f1).unwrap_or(0.0),
            f1_gen: num(w.f1_gen).unwrap_or(0.0),
            f2: num(w.f2).unwrap_or(0.0),
            f2_gen: num(w.f2_gen).unwrap_or(0.0),
            coefficient: num(w.coefficient).unwrap_or(1.0),
            coefficient_gen: num(w.coefficient_gen).unwrap_or(1.0),
            volume: num(w.volume).unwrap_or(0.0),
            volume_gen: num(w.volume_gen).unwrap_or(0.0),
            p2_message: w.p2_message.unwrap_or_default(),
            p2_gen_message: w.p2_gen_message.unwrap_or_default(),
            message: w.message.unwrap_or_default(),
        }
    }
}
