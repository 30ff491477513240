pub mod geographic;
