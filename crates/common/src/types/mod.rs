mod analysis;
mod lip_flap;
mod media;
mod shot;

pub use analysis::*;
pub use lip_flap::*;
pub use media::*;
pub use shot::*;
