pub mod cash_karp;
pub mod puls;
