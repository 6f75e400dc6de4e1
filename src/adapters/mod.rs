// Adapters layer: domain ports 的具體實作

pub mod http;
