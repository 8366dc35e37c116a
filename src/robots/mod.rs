// Robot (bed verification) profiles and the policy choosing between them

pub mod policy;
pub mod types;

pub use policy::{
    robot_choice, robot_summary, suitable_robots, verification_choice, RobotChoice, RobotSummary,
};
pub use types::{BedConfig, RobotConfig, RobotTable};
