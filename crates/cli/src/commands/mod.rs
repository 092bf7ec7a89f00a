pub mod chat;
pub mod classify;
pub mod doctor;
pub mod hash_pin;
pub mod serve;
