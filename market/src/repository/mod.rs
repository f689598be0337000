pub mod bid;
pub mod cron;
pub mod notification;
pub mod rfq;
pub mod vehicle;
