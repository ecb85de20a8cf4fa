//! Exchange domain — order requests expressed by coin name and resolved to
//! wire payloads through the symbol registry.

#[cfg(feature = "http")]
pub mod client;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::action::{CancelByCloidWire, CancelWire, OrderTypeWire, Tif, Tpsl, WireOrder};
use crate::error::SdkError;
use crate::shared::{decimal_to_wire, Cloid};
use crate::symbols::SymbolRegistry;

/// How an order rests or triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit { tif: Tif },
    Trigger {
        trigger_px: Decimal,
        is_market: bool,
        tpsl: Tpsl,
    },
}

impl Default for OrderKind {
    fn default() -> Self {
        OrderKind::Limit { tif: Tif::Gtc }
    }
}

/// An order by coin name. `coin` may be an internal (`BTC-PERP`) or
/// exchange (`BTC`) name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub coin: String,
    pub is_buy: bool,
    pub price: Decimal,
    pub size: Decimal,
    pub reduce_only: bool,
    pub kind: OrderKind,
    pub cloid: Option<Cloid>,
}

impl OrderRequest {
    /// Good-til-cancelled limit order.
    pub fn limit(coin: &str, is_buy: bool, price: Decimal, size: Decimal) -> Self {
        Self {
            coin: coin.to_string(),
            is_buy,
            price,
            size,
            reduce_only: false,
            kind: OrderKind::default(),
            cloid: None,
        }
    }

    pub fn with_tif(mut self, tif: Tif) -> Self {
        self.kind = OrderKind::Limit { tif };
        self
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    pub fn with_cloid(mut self, cloid: Cloid) -> Self {
        self.cloid = Some(cloid);
        self
    }

    /// Resolve the coin and render prices and sizes canonically.
    pub fn to_wire(&self, registry: &SymbolRegistry) -> Result<WireOrder, SdkError> {
        if self.size <= Decimal::ZERO {
            return Err(SdkError::validation(format!(
                "order size must be positive, got {}",
                self.size
            )));
        }
        if self.price < Decimal::ZERO {
            return Err(SdkError::validation(format!(
                "order price must not be negative, got {}",
                self.price
            )));
        }

        let order_type = match self.kind {
            OrderKind::Limit { tif } => OrderTypeWire::limit(tif),
            OrderKind::Trigger {
                trigger_px,
                is_market,
                tpsl,
            } => OrderTypeWire::trigger(decimal_to_wire(trigger_px), is_market, tpsl),
        };

        Ok(WireOrder {
            asset: registry.resolve_asset(&self.coin)?,
            is_buy: self.is_buy,
            limit_px: decimal_to_wire(self.price),
            sz: decimal_to_wire(self.size),
            reduce_only: self.reduce_only,
            order_type,
            cloid: self.cloid.clone(),
        })
    }
}

/// Cancel by exchange-assigned order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub coin: String,
    pub oid: u64,
}

impl CancelRequest {
    pub fn to_wire(&self, registry: &SymbolRegistry) -> Result<CancelWire, SdkError> {
        Ok(CancelWire {
            asset: registry.resolve_asset(&self.coin)?,
            oid: self.oid,
        })
    }
}

/// Cancel by client order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelByCloidRequest {
    pub coin: String,
    pub cloid: Cloid,
}

impl CancelByCloidRequest {
    pub fn to_wire(&self, registry: &SymbolRegistry) -> Result<CancelByCloidWire, SdkError> {
        Ok(CancelByCloidWire {
            asset: registry.resolve_asset(&self.coin)?,
            cloid: self.cloid.clone(),
        })
    }
}
