//! Info domain — market metadata and order book snapshots.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;
use wire::{L2BookResponse, LevelResponse};

/// One price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub size: Decimal,
    /// Number of resting orders at this level.
    pub orders: u32,
}

/// Order book snapshot, best level first on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L2Book {
    pub coin: String,
    pub time: u64,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
}

impl L2Book {
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    pub fn mid(&self) -> Option<Decimal> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some((bid + ask) / Decimal::TWO)
    }
}

fn parse_decimal(field: &str, s: &str) -> Result<Decimal, SdkError> {
    Decimal::from_str(s)
        .map_err(|e| SdkError::validation(format!("invalid {} `{}`: {}", field, s, e)))
}

impl TryFrom<LevelResponse> for Level {
    type Error = SdkError;

    fn try_from(level: LevelResponse) -> Result<Self, Self::Error> {
        Ok(Level {
            price: parse_decimal("px", &level.px)?,
            size: parse_decimal("sz", &level.sz)?,
            orders: level.n,
        })
    }
}

impl TryFrom<L2BookResponse> for L2Book {
    type Error = SdkError;

    fn try_from(resp: L2BookResponse) -> Result<Self, Self::Error> {
        let mut sides = resp.levels.into_iter();
        let convert = |side: Option<Vec<LevelResponse>>| -> Result<Vec<Level>, SdkError> {
            side.unwrap_or_default()
                .into_iter()
                .map(Level::try_from)
                .collect()
        };
        let bids = convert(sides.next())?;
        let asks = convert(sides.next())?;
        Ok(L2Book {
            coin: resp.coin,
            time: resp.time,
            bids,
            asks,
        })
    }
}

/// Parse an `allMids` response into decimals.
pub fn parse_mids(raw: HashMap<String, String>) -> Result<HashMap<String, Decimal>, SdkError> {
    raw.into_iter()
        .map(|(coin, px)| {
            let price = parse_decimal("mid", &px)?;
            Ok((coin, price))
        })
        .collect()
}
