pub mod risk_level;
