pub mod orders;
pub mod parties;
pub mod reservations;
pub mod settings;
pub mod tariffs;
