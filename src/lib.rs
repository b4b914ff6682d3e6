pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{
    DataSourceError, HttpPricingApi, HttpSignatureProvider, MockPricingApi, MockSignatureProvider,
    PricingApi, SignatureProvider,
};
pub use db::{init_db, Repository};
pub use domain::{
    Authorization, CommissionFigures, CommissionRule, Contract, ContractStatus, ContractType,
    Decimal, LedgerSide, MeterIdentifier, MeterKind, PriceRequest, PriceResponse,
    ReconciliationLedger, ReconciliationLine, SignStatus, TariffQuote,
};
pub use error::AppError;
