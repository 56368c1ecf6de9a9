mod goalie;
mod instinct;
mod midfielder;
mod striker;

pub use goalie::Goalie;
pub use instinct::Instinct;
pub use midfielder::Midfielder;
pub use striker::Striker;
