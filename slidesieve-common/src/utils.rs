pub mod fsutils;
pub mod imgutils;
pub mod math;
pub mod time;
