pub mod address;
pub mod ghn_orders;
pub mod warranties;
pub mod warranty_logs;
