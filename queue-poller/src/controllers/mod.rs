pub mod adaptive_polling;
pub mod general;
