//! Ethio Calendar - Ethiopian dates for the news site
//!
//! This crate converts Gregorian dates to the Ethiopian calendar and formats
//! them with localized month names. It also ships a small web service that
//! renders those dates for articles and the bot dashboard.

pub mod calendar;
pub mod config;
pub mod error;
pub mod months;
pub mod routes;

pub use calendar::{to_ethiopian, try_to_ethiopian, EthiopianDate, GregorianDate};
pub use error::InvalidDateError;
pub use months::{format_ethiopian_date, MonthNameTable};
