mod calculation;
mod user;

pub use calculation::{Calculation, NewCalculation};
pub use user::{NewUser, OperatorCount, OperatorTally, User, UserUpdate};
