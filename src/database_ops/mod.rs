pub mod db;
pub mod stripe;
