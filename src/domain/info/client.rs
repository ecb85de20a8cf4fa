//! Info sub-client — read-only market data over `/info`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::client::HyperliquidClient;
use crate::domain::info::wire::{AllMidsResponse, L2BookResponse, PerpMeta, SpotMeta};
use crate::domain::info::{parse_mids, L2Book};
use crate::error::SdkError;

/// Sub-client for info requests.
pub struct Info<'a> {
    pub(crate) client: &'a HyperliquidClient,
}

impl<'a> Info<'a> {
    /// Perpetual universe.
    pub async fn meta(&self) -> Result<PerpMeta, SdkError> {
        self.raw(&json!({"type": "meta"})).await
    }

    /// Spot pairs and tokens.
    pub async fn spot_meta(&self) -> Result<SpotMeta, SdkError> {
        self.raw(&json!({"type": "spotMeta"})).await
    }

    /// Mid prices keyed by exchange name.
    pub async fn all_mids(&self) -> Result<HashMap<String, Decimal>, SdkError> {
        let raw: AllMidsResponse = self.raw(&json!({"type": "allMids"})).await?;
        parse_mids(raw)
    }

    /// Order book snapshot. `coin` may be an internal or exchange name.
    pub async fn l2_book(&self, coin: &str) -> Result<L2Book, SdkError> {
        let exchange_name = self
            .client
            .symbols()
            .convert_symbol(coin, crate::symbols::Direction::Reverse, None);
        let resp: L2BookResponse = self
            .raw(&json!({"type": "l2Book", "coin": exchange_name}))
            .await?;
        resp.try_into()
    }

    /// Any other info request, deserialized into `T`.
    pub async fn raw<T: DeserializeOwned>(&self, request: &Value) -> Result<T, SdkError> {
        self.client.http.post_info(request).await
    }
}
