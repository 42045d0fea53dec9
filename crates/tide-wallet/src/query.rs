//! Ledger queries.
//!
//! [`CoinQuery`] is the seam between the inventory and the ledger's object
//! index. [`RpcCoinQuery`] talks JSON-RPC (`suix_getCoins`, cursor
//! paginated); [`MockCoinQuery`] serves fixed records in tests.
//! [`RpcAuthorizationLookup`] resolves the balance manager and trade
//! capability from the same node.

use crate::auth::{AuthorizationLookup, BALANCE_MANAGER_MODULE};
use crate::coin::CoinRecord;
use crate::error::{WalletError, WalletResult};
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tide_core::{Address, BoxFuture, ObjectId, ObjectRef, SharedObjectRef, TypeTag};
use tracing::{debug, trace, warn};

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size requested from the RPC node.
const PAGE_LIMIT: u32 = 50;

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: usize = 40;

/// Lists an owner's coins of one type.
pub trait CoinQuery: Send + Sync {
    fn list_coins(
        &self,
        owner: Address,
        coin_type: TypeTag,
    ) -> BoxFuture<'_, WalletResult<Vec<CoinRecord>>>;
}

/// Arc wrapper for CoinQuery trait objects.
pub type DynCoinQuery = Arc<dyn CoinQuery>;

#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC client for a ledger full node.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: Client,
    rpc_url: String,
    request_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| WalletError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Call `method` and decode its result.
    pub async fn call<P, T>(&self, method: &'static str, params: P) -> WalletResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| WalletError::HttpClient(format!("Failed to parse response: {e}")))?;

        if let Some(err) = body.error {
            return Err(WalletError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result.ok_or_else(|| {
            WalletError::Query(format!("{method}: response has neither result nor error"))
        })
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    data: Vec<T>,
    next_cursor: Option<String>,
    has_next_page: bool,
}

/// Items of a paginated listing. `truncated` is set when the page bound was
/// hit while the node still had more pages.
#[derive(Debug)]
struct Collected<T> {
    items: Vec<T>,
    truncated: bool,
}

async fn collect_pages<T, F, Fut>(max_pages: usize, mut fetch: F) -> WalletResult<Collected<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = WalletResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    for page_no in 0..max_pages {
        let page = fetch(cursor.take()).await?;
        trace!(page_no, items = page.data.len(), "Page received");
        items.extend(page.data);
        if !page.has_next_page || page.next_cursor.is_none() {
            return Ok(Collected {
                items,
                truncated: false,
            });
        }
        cursor = page.next_cursor;
    }
    Ok(Collected {
        items,
        truncated: true,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoin {
    coin_type: String,
    coin_object_id: String,
    version: String,
    digest: String,
    balance: String,
}

impl RawCoin {
    fn into_record(self) -> WalletResult<CoinRecord> {
        let object_id: ObjectId = self
            .coin_object_id
            .parse()
            .map_err(|e| WalletError::Query(format!("bad coin id: {e}")))?;
        let version = self
            .version
            .parse::<u64>()
            .map_err(|e| WalletError::Query(format!("bad version {}: {e}", self.version)))?;
        let balance = self
            .balance
            .parse::<u64>()
            .map_err(|e| WalletError::Query(format!("bad balance {}: {e}", self.balance)))?;
        Ok(CoinRecord {
            object: ObjectRef::new(object_id, version, self.digest),
            balance,
            coin_type: TypeTag::new(self.coin_type),
        })
    }
}

/// JSON-RPC coin query.
#[derive(Debug, Clone)]
pub struct RpcCoinQuery {
    rpc: JsonRpcClient,
}

impl RpcCoinQuery {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }

    async fn list_all(&self, owner: Address, coin_type: TypeTag) -> WalletResult<Vec<CoinRecord>> {
        let rpc = &self.rpc;
        let owner_hex = owner.to_hex();
        let type_str = coin_type.as_str().to_string();
        let collected = collect_pages(MAX_PAGES, move |cursor| {
            rpc.call::<_, Page<RawCoin>>(
                "suix_getCoins",
                (owner_hex.clone(), type_str.clone(), cursor, PAGE_LIMIT),
            )
        })
        .await?;

        let records = collected
            .items
            .into_iter()
            .map(RawCoin::into_record)
            .collect::<WalletResult<Vec<_>>>()?;
        if collected.truncated {
            warn!(
                %owner,
                %coin_type,
                coins = records.len(),
                max_pages = MAX_PAGES,
                "Coin listing truncated, holdings understate the balance"
            );
        }
        debug!(%owner, %coin_type, count = records.len(), "Coins listed");
        Ok(records)
    }
}

impl CoinQuery for RpcCoinQuery {
    fn list_coins(
        &self,
        owner: Address,
        coin_type: TypeTag,
    ) -> BoxFuture<'_, WalletResult<Vec<CoinRecord>>> {
        Box::pin(self.list_all(owner, coin_type))
    }
}

/// `sui_getObject` result, also the item type of `suix_getOwnedObjects`.
#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<ObjectData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: String,
    version: String,
    digest: String,
    #[serde(default)]
    owner: Option<Value>,
    #[serde(default)]
    content: Option<MoveContent>,
}

#[derive(Debug, Deserialize)]
struct MoveContent {
    #[serde(default)]
    fields: Value,
}

impl ObjectData {
    fn id(&self) -> WalletResult<ObjectId> {
        self.object_id
            .parse()
            .map_err(|e| WalletError::Query(format!("bad object id {}: {e}", self.object_id)))
    }

    fn object_ref(&self) -> WalletResult<ObjectRef> {
        let version = self
            .version
            .parse::<u64>()
            .map_err(|e| WalletError::Query(format!("bad version {}: {e}", self.version)))?;
        Ok(ObjectRef::new(self.id()?, version, self.digest.clone()))
    }

    /// Initial shared version when the object is shared.
    fn initial_shared_version(&self) -> Option<u64> {
        let version = self.owner.as_ref()?.get("Shared")?.get("initial_shared_version")?;
        version
            .as_u64()
            .or_else(|| version.as_str().and_then(|s| s.parse().ok()))
    }

    fn field_str(&self, name: &str) -> Option<&str> {
        self.content.as_ref()?.fields.get(name)?.as_str()
    }
}

/// Balance manager `id`, if it is a shared object owned by `owner`.
fn balance_manager_ref(
    data: &ObjectData,
    id: ObjectId,
    owner: Address,
) -> WalletResult<Option<SharedObjectRef>> {
    let Some(version) = data.initial_shared_version() else {
        return Err(WalletError::Query(format!(
            "balance manager {id} is not a shared object"
        )));
    };
    let recorded_owner = data.field_str("owner").and_then(|s| s.parse::<Address>().ok());
    if recorded_owner != Some(owner) {
        warn!(balance_manager = %id, %owner, "Balance manager belongs to another account");
        return Ok(None);
    }
    Ok(Some(SharedObjectRef::new(id, version, true)))
}

/// First trade capability in `objects` issued by `balance_manager`.
fn matching_trade_cap(
    objects: &[ObjectResponse],
    balance_manager: ObjectId,
) -> WalletResult<Option<ObjectRef>> {
    for data in objects.iter().filter_map(|o| o.data.as_ref()) {
        let issuer = data
            .field_str("balance_manager_id")
            .and_then(|s| s.parse::<ObjectId>().ok());
        if issuer == Some(balance_manager) {
            return data.object_ref().map(Some);
        }
    }
    Ok(None)
}

/// Authorization lookup against the ledger.
///
/// A balance manager is shared and cannot be listed by owner, so its id
/// comes from configuration; the ledger supplies its shared version and
/// confirms the owner. Trade capabilities are owned objects found by type.
/// A capability authorizes every pool of its balance manager.
#[derive(Debug, Clone)]
pub struct RpcAuthorizationLookup {
    rpc: JsonRpcClient,
    package: ObjectId,
    balance_manager: Option<ObjectId>,
}

impl RpcAuthorizationLookup {
    pub fn new(rpc: JsonRpcClient, package: ObjectId, balance_manager: Option<ObjectId>) -> Self {
        Self {
            rpc,
            package,
            balance_manager,
        }
    }

    fn trade_cap_type(&self) -> String {
        format!("{}::{BALANCE_MANAGER_MODULE}::TradeCap", self.package.to_hex())
    }

    async fn fetch_balance_manager(&self, owner: Address) -> WalletResult<Option<SharedObjectRef>> {
        let Some(id) = self.balance_manager else {
            return Ok(None);
        };
        let response: ObjectResponse = self
            .rpc
            .call(
                "sui_getObject",
                (id.to_hex(), json!({ "showOwner": true, "showContent": true })),
            )
            .await?;
        match response.data {
            Some(data) => balance_manager_ref(&data, id, owner),
            None => {
                debug!(balance_manager = %id, "Balance manager not found on ledger");
                Ok(None)
            }
        }
    }

    async fn fetch_trade_cap(
        &self,
        owner: Address,
        balance_manager: ObjectId,
    ) -> WalletResult<Option<ObjectRef>> {
        let rpc = &self.rpc;
        let owner_hex = owner.to_hex();
        let query = json!({
            "filter": { "StructType": self.trade_cap_type() },
            "options": { "showContent": true }
        });
        let collected = collect_pages(MAX_PAGES, move |cursor| {
            rpc.call::<_, Page<ObjectResponse>>(
                "suix_getOwnedObjects",
                (owner_hex.clone(), query.clone(), cursor, PAGE_LIMIT),
            )
        })
        .await?;
        let found = matching_trade_cap(&collected.items, balance_manager)?;
        if found.is_none() && collected.truncated {
            warn!(%owner, max_pages = MAX_PAGES, "Trade capability listing truncated");
        }
        Ok(found)
    }
}

impl AuthorizationLookup for RpcAuthorizationLookup {
    fn balance_manager(
        &self,
        owner: Address,
    ) -> BoxFuture<'_, WalletResult<Option<SharedObjectRef>>> {
        Box::pin(self.fetch_balance_manager(owner))
    }

    fn trade_cap(
        &self,
        owner: Address,
        balance_manager: ObjectId,
        _pool: ObjectId,
    ) -> BoxFuture<'_, WalletResult<Option<ObjectRef>>> {
        Box::pin(self.fetch_trade_cap(owner, balance_manager))
    }
}

/// Mock coin query for testing.
#[derive(Debug, Default)]
pub struct MockCoinQuery {
    coins: Mutex<HashMap<(Address, String), Vec<CoinRecord>>>,
    failure: Mutex<Option<String>>,
    calls: AtomicU64,
}

impl MockCoinQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the coins returned for `owner`/`coin_type`.
    pub fn set_coins(&self, owner: Address, coin_type: &TypeTag, coins: Vec<CoinRecord>) {
        self.coins
            .lock()
            .insert((owner, coin_type.canonical()), coins);
    }

    /// Make every following call fail with a query error.
    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock() = message;
    }

    /// Number of `list_coins` calls served.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CoinQuery for MockCoinQuery {
    fn list_coins(
        &self,
        owner: Address,
        coin_type: TypeTag,
    ) -> BoxFuture<'_, WalletResult<Vec<CoinRecord>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = self.failure.lock().clone() {
                return Err(WalletError::Query(message));
            }
            Ok(self
                .coins
                .lock()
                .get(&(owner, coin_type.canonical()))
                .cloned()
                .unwrap_or_default())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::test_fixtures::*;

    #[test]
    fn test_raw_coin_parse() {
        let raw: RawCoin = serde_json::from_value(json!({
            "coinType": "0x2::sui::SUI",
            "coinObjectId": "0x1234",
            "version": "103626",
            "digest": "HkVh8Dd7tA",
            "balance": "2000000000",
            "previousTransaction": "x"
        }))
        .unwrap();
        let record = raw.into_record().unwrap();
        assert_eq!(record.balance, 2_000_000_000);
        assert_eq!(record.object.version, 103_626);
        assert!(record.coin_type.is_native_gas());
    }

    #[test]
    fn test_raw_coin_bad_balance() {
        let raw = RawCoin {
            coin_type: "0x2::sui::SUI".into(),
            coin_object_id: "0x1".into(),
            version: "1".into(),
            digest: "d".into(),
            balance: "-5".into(),
        };
        assert!(raw.into_record().is_err());
    }

    #[test]
    fn test_rpc_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "suix_getCoins",
            params: ("0x01".to_string(), "0x2::sui::SUI", None::<String>, PAGE_LIMIT),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["params"][2], Value::Null);
        assert_eq!(json["params"][3], 50);
    }

    fn page(data: Vec<u32>, next: Option<&str>) -> Page<u32> {
        Page {
            data,
            next_cursor: next.map(str::to_string),
            has_next_page: next.is_some(),
        }
    }

    #[test]
    fn test_pages_followed_until_last() {
        let mut cursors = Vec::new();
        let collected = tokio_test::block_on(collect_pages(MAX_PAGES, |cursor| {
            let next = match cursor.as_deref() {
                None => page(vec![1, 2], Some("c1")),
                Some("c1") => page(vec![3], Some("c2")),
                _ => page(vec![4], None),
            };
            cursors.push(cursor);
            async move { Ok(next) }
        }))
        .unwrap();
        assert_eq!(collected.items, vec![1, 2, 3, 4]);
        assert!(!collected.truncated);
        assert_eq!(
            cursors,
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[test]
    fn test_page_bound_reports_truncation() {
        let collected = tokio_test::block_on(collect_pages(3, |_cursor| async {
            Ok(page(vec![7, 7], Some("more")))
        }))
        .unwrap();
        assert_eq!(collected.items.len(), 6);
        assert!(collected.truncated);
    }

    #[test]
    fn test_page_error_propagates() {
        let result: WalletResult<Collected<u32>> =
            tokio_test::block_on(collect_pages(3, |_| async {
                Err(WalletError::Query("node down".into()))
            }));
        assert!(matches!(result, Err(WalletError::Query(_))));
    }

    fn balance_manager_object(owner: &str, shared_version: Value) -> ObjectData {
        serde_json::from_value(json!({
            "objectId": "0xb0",
            "version": "500",
            "digest": "bmdigest",
            "owner": { "Shared": { "initial_shared_version": shared_version } },
            "content": {
                "dataType": "moveObject",
                "type": "0xdb::balance_manager::BalanceManager",
                "fields": { "owner": owner, "id": { "id": "0xb0" } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_balance_manager_from_ledger() {
        let owner: Address = "0xa11ce".parse().unwrap();
        let id = ObjectId::from_low_byte(0xb0);

        let data = balance_manager_object("0xa11ce", json!(389_750_322u64));
        let bm = balance_manager_ref(&data, id, owner).unwrap().unwrap();
        assert_eq!(bm.initial_shared_version, 389_750_322);
        assert!(bm.mutable);

        // Some nodes send the version as a string.
        let data = balance_manager_object("0xa11ce", json!("42"));
        let bm = balance_manager_ref(&data, id, owner).unwrap().unwrap();
        assert_eq!(bm.initial_shared_version, 42);

        let data = balance_manager_object("0xbad", json!(42));
        assert!(balance_manager_ref(&data, id, owner).unwrap().is_none());
    }

    #[test]
    fn test_owned_balance_manager_rejected() {
        let data: ObjectData = serde_json::from_value(json!({
            "objectId": "0xb0",
            "version": "5",
            "digest": "d",
            "owner": { "AddressOwner": "0xa11ce" }
        }))
        .unwrap();
        let owner: Address = "0xa11ce".parse().unwrap();
        assert!(balance_manager_ref(&data, ObjectId::from_low_byte(0xb0), owner).is_err());
    }

    #[test]
    fn test_trade_cap_matched_by_balance_manager() {
        let objects: Vec<ObjectResponse> = serde_json::from_value(json!([
            { "data": {
                "objectId": "0xc1", "version": "3", "digest": "other",
                "content": { "fields": { "balance_manager_id": "0xb9" } }
            } },
            { "error": { "code": "deleted" } },
            { "data": {
                "objectId": "0xc2", "version": "8", "digest": "mine",
                "content": { "fields": { "balance_manager_id": "0xb0" } }
            } }
        ]))
        .unwrap();
        let cap = matching_trade_cap(&objects, ObjectId::from_low_byte(0xb0))
            .unwrap()
            .unwrap();
        assert_eq!(cap.object_id, ObjectId::from_low_byte(0xc2));
        assert_eq!(cap.version, 8);
        assert!(matching_trade_cap(&objects, ObjectId::from_low_byte(0x01))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_trade_cap_type() {
        let lookup = RpcAuthorizationLookup::new(
            JsonRpcClient::new("http://localhost:9000").unwrap(),
            ObjectId::from_low_byte(0xdb),
            None,
        );
        assert!(lookup.trade_cap_type().ends_with("db::balance_manager::TradeCap"));
        let owner: Address = "0xa11ce".parse().unwrap();
        let bm = tokio_test::block_on(lookup.balance_manager(owner)).unwrap();
        assert!(bm.is_none());
    }

    #[tokio::test]
    async fn test_mock_query() {
        let query = MockCoinQuery::new();
        let owner = Address::ZERO;
        query.set_coins(owner, &usdc_type(), vec![coin(1, 10, &usdc_type())]);

        let coins = query.list_coins(owner, usdc_type()).await.unwrap();
        assert_eq!(coins.len(), 1);
        assert!(query.list_coins(owner, deep_type()).await.unwrap().is_empty());

        query.set_failure(Some("node down".into()));
        assert!(query.list_coins(owner, usdc_type()).await.is_err());
        assert_eq!(query.call_count(), 3);
    }
}
