//! Wire payloads carried inside actions.
//!
//! Field names and declaration order are the venue's: the action hash is taken
//! over the MessagePack encoding of these structs with keys in declaration
//! order, so reordering a field here changes every signature.

use serde::{Deserialize, Serialize};

use crate::shared::Cloid;

// ─── Orders ──────────────────────────────────────────────────────────────────

/// Normalized, index-resolved order ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOrder {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "p")]
    pub limit_px: String,
    #[serde(rename = "s")]
    pub sz: String,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,
    #[serde(rename = "c", skip_serializing_if = "Option::is_none", default)]
    pub cloid: Option<Cloid>,
}

/// `{"limit": {...}}` or `{"trigger": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderTypeWire {
    #[serde(rename = "limit")]
    Limit(LimitWire),
    #[serde(rename = "trigger")]
    Trigger(TriggerWire),
}

impl OrderTypeWire {
    pub fn limit(tif: Tif) -> Self {
        OrderTypeWire::Limit(LimitWire { tif })
    }

    pub fn trigger(trigger_px: String, is_market: bool, tpsl: Tpsl) -> Self {
        OrderTypeWire::Trigger(TriggerWire {
            is_market,
            trigger_px,
            tpsl,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitWire {
    pub tif: Tif,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerWire {
    #[serde(rename = "isMarket")]
    pub is_market: bool,
    #[serde(rename = "triggerPx")]
    pub trigger_px: String,
    pub tpsl: Tpsl,
}

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tif {
    Alo,
    Ioc,
    Gtc,
}

/// Take-profit or stop-loss trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tpsl {
    Tp,
    Sl,
}

/// How the orders of one `order` action relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Grouping {
    #[default]
    #[serde(rename = "na")]
    Na,
    #[serde(rename = "normalTpsl")]
    NormalTpsl,
    #[serde(rename = "positionTpsl")]
    PositionTpsl,
}

/// Builder fee attached to an order action. `f` is in tenths of a basis point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderInfo {
    #[serde(rename = "b")]
    pub builder: String,
    #[serde(rename = "f")]
    pub fee: u64,
}

// ─── Cancels / modifies ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "o")]
    pub oid: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelByCloidWire {
    pub asset: u32,
    pub cloid: Cloid,
}

/// Order id or client order id of the order being modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderRef {
    Oid(u64),
    Cloid(Cloid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyWire {
    pub oid: OrderRef,
    pub order: WireOrder,
}

// ─── TWAP ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwapWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "s")]
    pub sz: String,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    /// Duration in minutes.
    #[serde(rename = "m")]
    pub minutes: u32,
    /// Randomize slice timing.
    #[serde(rename = "t")]
    pub randomize: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_order_key_order() {
        let order = WireOrder {
            asset: 3,
            is_buy: true,
            limit_px: "1670.1".into(),
            sz: "0.0147".into(),
            reduce_only: false,
            order_type: OrderTypeWire::limit(Tif::Ioc),
            cloid: None,
        };
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(
            json,
            r#"{"a":3,"b":true,"p":"1670.1","s":"0.0147","r":false,"t":{"limit":{"tif":"Ioc"}}}"#
        );
    }

    #[test]
    fn test_trigger_wire_shape() {
        let t = OrderTypeWire::trigger("100".into(), true, Tpsl::Sl);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(
            json,
            r#"{"trigger":{"isMarket":true,"triggerPx":"100","tpsl":"sl"}}"#
        );
    }

    #[test]
    fn test_order_ref_untagged() {
        assert_eq!(serde_json::to_string(&OrderRef::Oid(12)).unwrap(), "12");
        let cloid = Cloid::from_u128(1);
        assert_eq!(
            serde_json::to_string(&OrderRef::Cloid(cloid)).unwrap(),
            r#""0x00000000000000000000000000000001""#
        );
    }

    #[test]
    fn test_grouping_default_na() {
        assert_eq!(serde_json::to_string(&Grouping::default()).unwrap(), r#""na""#);
    }
}
