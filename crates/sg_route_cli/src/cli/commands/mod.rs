pub mod db;
pub mod evaluate;
pub mod rank;
