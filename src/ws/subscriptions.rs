//! Subscription types and the frame fields that identify them.

use serde::{Deserialize, Serialize};

/// A subscribable feed.
///
/// Wire format is the `subscription` object of a subscribe/unsubscribe
/// message, tagged by `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Subscription {
    #[serde(rename = "allMids")]
    AllMids,
    #[serde(rename = "l2Book")]
    L2Book { coin: String },
    #[serde(rename = "trades")]
    Trades { coin: String },
    #[serde(rename = "candle")]
    Candle { coin: String, interval: String },
    #[serde(rename = "bbo")]
    Bbo { coin: String },
    #[serde(rename = "activeAssetCtx")]
    ActiveAssetCtx { coin: String },
    #[serde(rename = "orderUpdates")]
    OrderUpdates { user: String },
    #[serde(rename = "userEvents")]
    UserEvents { user: String },
    #[serde(rename = "userFills")]
    UserFills { user: String },
    #[serde(rename = "userFundings")]
    UserFundings { user: String },
    #[serde(rename = "userNonFundingLedgerUpdates")]
    UserNonFundingLedgerUpdates { user: String },
    #[serde(rename = "webData2")]
    WebData2 { user: String },
    #[serde(rename = "notification")]
    Notification { user: String },
}

impl Subscription {
    /// The `channel` field of inbound frames for this feed.
    pub fn channel(&self) -> &'static str {
        match self {
            Subscription::AllMids => "allMids",
            Subscription::L2Book { .. } => "l2Book",
            Subscription::Trades { .. } => "trades",
            Subscription::Candle { .. } => "candle",
            Subscription::Bbo { .. } => "bbo",
            Subscription::ActiveAssetCtx { .. } => "activeAssetCtx",
            Subscription::OrderUpdates { .. } => "orderUpdates",
            Subscription::UserEvents { .. } => "user",
            Subscription::UserFills { .. } => "userFills",
            Subscription::UserFundings { .. } => "userFundings",
            Subscription::UserNonFundingLedgerUpdates { .. } => "userNonFundingLedgerUpdates",
            Subscription::WebData2 { .. } => "webData2",
            Subscription::Notification { .. } => "notification",
        }
    }

    /// Fields an inbound frame must carry (with these values) to belong to
    /// this subscription. Channels whose frames carry no identifying field
    /// return an empty list.
    pub fn frame_discriminators(&self) -> Vec<(&'static str, String)> {
        match self {
            Subscription::L2Book { coin }
            | Subscription::Trades { coin }
            | Subscription::Bbo { coin }
            | Subscription::ActiveAssetCtx { coin } => vec![("coin", coin.clone())],
            Subscription::Candle { coin, interval } => {
                vec![("coin", coin.clone()), ("interval", interval.clone())]
            }
            Subscription::UserFills { user }
            | Subscription::UserFundings { user }
            | Subscription::UserNonFundingLedgerUpdates { user }
            | Subscription::WebData2 { user } => vec![("user", user.clone())],
            Subscription::AllMids
            | Subscription::OrderUpdates { .. }
            | Subscription::UserEvents { .. }
            | Subscription::Notification { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscription_wire_format() {
        assert_eq!(
            serde_json::to_value(Subscription::AllMids).unwrap(),
            json!({"type": "allMids"})
        );
        assert_eq!(
            serde_json::to_value(Subscription::Candle {
                coin: "ETH".into(),
                interval: "1m".into()
            })
            .unwrap(),
            json!({"type": "candle", "coin": "ETH", "interval": "1m"})
        );
    }

    #[test]
    fn test_subscription_round_trip() {
        let sub: Subscription =
            serde_json::from_value(json!({"type": "userFills", "user": "0xabc"})).unwrap();
        assert_eq!(sub, Subscription::UserFills { user: "0xabc".into() });
    }

    #[test]
    fn test_user_events_channel_name() {
        let sub = Subscription::UserEvents { user: "0xabc".into() };
        assert_eq!(sub.channel(), "user");
    }

    #[test]
    fn test_discriminators() {
        let sub = Subscription::Trades { coin: "BTC".into() };
        assert_eq!(sub.frame_discriminators(), vec![("coin", "BTC".to_string())]);
        assert!(Subscription::AllMids.frame_discriminators().is_empty());
        assert_eq!(
            Subscription::Candle {
                coin: "BTC".into(),
                interval: "1h".into()
            }
            .frame_discriminators()
            .len(),
            2
        );
    }
}
