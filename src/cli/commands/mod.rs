pub mod orders;
pub mod portfolios;
pub mod stocks;
pub mod watch;
