mod bass_drone;
mod click;
mod guitar_string;
mod hi_hat;
mod kick_drum;

pub use bass_drone::BassDrone;
pub use click::Click;
pub use guitar_string::{string_frequency, GuitarVoice, OPEN_STRING_HZ};
pub use hi_hat::HiHat;
pub use kick_drum::KickDrum;
