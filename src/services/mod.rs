pub mod driver;
pub mod keepalive;
