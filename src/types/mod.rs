pub mod device;
pub mod point;
pub mod record;
pub mod result;
