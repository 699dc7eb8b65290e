mod detector;
mod error;
mod simulator;
mod types;

pub use detector::{detect, outlier_bounds};
pub use error::CoreError;
pub use simulator::simulate;
pub use types::{
    Contribution, Detection, ExpenseRecord, OutlierBounds, Simulation, SimulationParams,
    WealthTrajectory,
};
