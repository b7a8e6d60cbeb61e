pub mod coordinator;
pub mod fetcher;
pub mod timing;
pub mod view;

pub use crate::domain::model::{
    CoordinatorState, Gender, OperationMode, Person, RequestParameters, StrategyId, TimingSample,
    User,
};
pub use crate::domain::ports::{ConfigProvider, KeyValueStore, PeopleTransport, UserDirectory};
pub use crate::utils::error::Result;
