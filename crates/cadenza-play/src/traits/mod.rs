pub mod delivery;
pub mod surface;
