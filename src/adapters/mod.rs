// Adapters layer: concrete implementations of the domain ports (http transports, storage).

pub mod http;
pub mod storage;
