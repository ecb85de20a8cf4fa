//! Wire types for `/info` responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Perp metadata ───────────────────────────────────────────────────────────

/// `{"type": "meta"}` response. Universe position is the asset index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerpMeta {
    pub universe: Vec<PerpAssetInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerpAssetInfo {
    pub name: String,
    #[serde(rename = "szDecimals")]
    pub sz_decimals: u32,
    #[serde(rename = "maxLeverage", default, skip_serializing_if = "Option::is_none")]
    pub max_leverage: Option<u32>,
    #[serde(rename = "onlyIsolated", default, skip_serializing_if = "Option::is_none")]
    pub only_isolated: Option<bool>,
    #[serde(rename = "isDelisted", default, skip_serializing_if = "Option::is_none")]
    pub is_delisted: Option<bool>,
}

// ─── Spot metadata ───────────────────────────────────────────────────────────

/// `{"type": "spotMeta"}` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotMeta {
    pub universe: Vec<SpotPairInfo>,
    pub tokens: Vec<SpotTokenInfo>,
}

/// A spot pair. `tokens` is `[base, quote]` as token indices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotPairInfo {
    pub name: String,
    pub tokens: Vec<u32>,
    pub index: u32,
    #[serde(rename = "isCanonical", default, skip_serializing_if = "Option::is_none")]
    pub is_canonical: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotTokenInfo {
    pub name: String,
    pub index: u32,
    #[serde(rename = "szDecimals", default)]
    pub sz_decimals: u32,
    #[serde(rename = "weiDecimals", default)]
    pub wei_decimals: u32,
    #[serde(rename = "tokenId", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

// ─── Market data ─────────────────────────────────────────────────────────────

/// `{"type": "allMids"}` response: coin → mid price string.
pub type AllMidsResponse = HashMap<String, String>;

/// `{"type": "l2Book", "coin": ...}` response. `levels` is `[bids, asks]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct L2BookResponse {
    pub coin: String,
    pub time: u64,
    pub levels: Vec<Vec<LevelResponse>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelResponse {
    pub px: String,
    pub sz: String,
    pub n: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spot_meta_deserialize() {
        let meta: SpotMeta = serde_json::from_value(json!({
            "universe": [{"name": "PURR/USDC", "tokens": [1, 0], "index": 0, "isCanonical": true}],
            "tokens": [
                {"name": "USDC", "index": 0, "szDecimals": 8, "weiDecimals": 8, "tokenId": "0x6d"},
                {"name": "PURR", "index": 1, "szDecimals": 0, "weiDecimals": 5}
            ]
        }))
        .unwrap();
        assert_eq!(meta.universe[0].tokens, vec![1, 0]);
        assert_eq!(meta.tokens[1].name, "PURR");
        assert_eq!(meta.tokens[1].token_id, None);
    }

    #[test]
    fn test_perp_meta_ignores_unknown_fields() {
        let meta: PerpMeta = serde_json::from_value(json!({
            "universe": [{"name": "BTC", "szDecimals": 5, "maxLeverage": 50, "marginTableId": 3}],
            "marginTables": []
        }))
        .unwrap();
        assert_eq!(meta.universe[0].max_leverage, Some(50));
    }
}
