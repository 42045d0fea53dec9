//! Application wired over mock seams.

use std::sync::Arc;
use tide_bot::{AppConfig, Application, Components};
use tide_core::{Address, Clock, ObjectId, ObjectRef, PairKey, TypeTag};
use tide_executor::{MockPriceFeed, MockSigner};
use tide_wallet::{CoinRecord, MockAuthorizationLookup, MockCoinQuery};

pub const OWNER: &str = "0xa11ce";
pub const SUI_USDC_POOL: &str = "0xaa";

pub const CONFIG: &str = r#"
mode = "test"
owner = "0xa11ce"

[venue]
package = "0xdb"

[[assets]]
symbol = "SUI"
type_tag = "0x2::sui::SUI"
decimals = 9

[[assets]]
symbol = "USDC"
type_tag = "0xdba3::usdc::USDC"
decimals = 6

[[assets]]
symbol = "DEEP"
type_tag = "0xdeeb::deep::DEEP"
decimals = 6

[[pools]]
pool_id = "0xaa"
initial_shared_version = 389750322
base = "SUI"
quote = "USDC"
tick_size = 1000
lot_size = 100000000
min_size = 1000000000

[[pools]]
pool_id = "0xab"
initial_shared_version = 389750323
base = "DEEP"
quote = "USDC"
tick_size = 10000
lot_size = 1000000
min_size = 10000000

[[orders]]
pair = "SUI_USDC"
side = "sell"
kind = "stop_loss"
trigger_price = "3.00"
quantity = "2"
"#;

pub fn owner() -> Address {
    OWNER.parse().unwrap()
}

pub fn sui_usdc() -> PairKey {
    PairKey::new("SUI", "USDC")
}

pub fn sui_type() -> TypeTag {
    TypeTag::new("0x2::sui::SUI")
}

pub fn usdc_type() -> TypeTag {
    TypeTag::new("0xdba3::usdc::USDC")
}

pub fn deep_type() -> TypeTag {
    TypeTag::new("0xdeeb::deep::DEEP")
}

pub fn coin(n: u8, balance: u64, coin_type: &TypeTag) -> CoinRecord {
    CoinRecord {
        object: ObjectRef::new(ObjectId::from_low_byte(n), 1, format!("coin{n}")),
        balance,
        coin_type: coin_type.clone(),
    }
}

/// Wired application plus handles on every mock.
pub struct TestEnv {
    pub app: Application,
    pub coins: Arc<MockCoinQuery>,
    pub auth: Arc<MockAuthorizationLookup>,
    pub signer: Arc<MockSigner>,
    pub feed: Arc<MockPriceFeed>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(AppConfig::from_toml(CONFIG).unwrap())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let coins = Arc::new(MockCoinQuery::new());
        let auth = Arc::new(MockAuthorizationLookup::new());
        let signer = Arc::new(MockSigner::new());
        let feed = Arc::new(MockPriceFeed::new());
        let clock: Arc<dyn Clock> = Arc::new(tide_core::FixedClock::new(1_700_000_000_000));

        let app = Application::with_components(
            config,
            Components {
                coin_query: coins.clone(),
                authorization: auth.clone(),
                signer: signer.clone(),
                price_feed: feed.clone(),
                clock,
            },
        )
        .unwrap();

        Self {
            app,
            coins,
            auth,
            signer,
            feed,
        }
    }

    /// 10 SUI in two coins, 20 USDC, 5 DEEP.
    pub fn fund(&self) {
        self.coins.set_coins(
            owner(),
            &sui_type(),
            vec![coin(1, 6_000_000_000, &sui_type()), coin(2, 4_000_000_000, &sui_type())],
        );
        self.coins
            .set_coins(owner(), &usdc_type(), vec![coin(3, 20_000_000, &usdc_type())]);
        self.coins.set_coins(
            owner(),
            &deep_type(),
            vec![coin(4, 3_000_000, &deep_type()), coin(5, 2_000_000, &deep_type())],
        );
    }
}
