pub mod events;
pub mod roster;
pub mod sync;
