use serde::Serialize;
use tracing::debug;

use super::types::{RobotConfig, RobotTable};
use crate::ids::{RobotId, StateName};

/// Robot facts shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RobotSummary {
    pub id: RobotId,
    pub name: String,
    /// Labels of the beds that accept the labware
    pub beds: Vec<String>,
    pub target_states: Vec<StateName>,
}

/// What the robot area offers for the current labware
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RobotChoice {
    /// No robot drives this labware forward; show the generic action
    Default,
    /// Link straight to the one robot's verification flow
    Direct { robot: RobotSummary },
    /// Let the user pick
    Selection { robots: Vec<RobotSummary> },
}

impl RobotChoice {
    pub fn robots(&self) -> &[RobotSummary] {
        match self {
            RobotChoice::Default => &[],
            RobotChoice::Direct { robot } => std::slice::from_ref(robot),
            RobotChoice::Selection { robots } => robots,
        }
    }
}

/// Robots with a bed that accepts `purpose` in `state` and drives it to a new state
pub fn suitable_robots<'a>(
    purpose: &str,
    state: &str,
    robots: &'a RobotTable,
) -> Vec<(&'a RobotId, &'a RobotConfig)> {
    robots
        .iter()
        .filter(|(_, robot)| robot.is_suitable_for(purpose, state))
        .collect()
}

/// Branch on the number of suitable robots: none, one, or several
pub fn robot_choice(purpose: &str, state: &str, robots: &RobotTable) -> RobotChoice {
    let mut summaries: Vec<RobotSummary> = suitable_robots(purpose, state, robots)
        .into_iter()
        .map(|(id, robot)| robot_summary(id, robot, purpose, state))
        .collect();

    let choice = match summaries.len() {
        0 => RobotChoice::Default,
        1 => RobotChoice::Direct {
            robot: summaries.remove(0),
        },
        _ => RobotChoice::Selection { robots: summaries },
    };
    debug!(
        purpose = purpose,
        state = state,
        robots = choice.robots().len(),
        "Resolved robot choice"
    );
    choice
}

/// Robot choice honouring a robot configured to own the current state.
///
/// The owning robot is linked directly only while it is itself suitable;
/// otherwise the choice falls back to the suitable robots.
pub fn verification_choice(
    purpose: &str,
    state: &str,
    robots: &RobotTable,
    controlling: Option<&RobotId>,
) -> RobotChoice {
    if let Some(owner) = controlling {
        if let Some((id, robot)) = suitable_robots(purpose, state, robots)
            .into_iter()
            .find(|(id, _)| *id == owner)
        {
            return RobotChoice::Direct {
                robot: robot_summary(id, robot, purpose, state),
            };
        }
        debug!(
            purpose = purpose,
            state = state,
            robot = %owner,
            "Controlling robot has no bed for this labware"
        );
    }
    robot_choice(purpose, state, robots)
}

/// Beds and target states of `robot` that apply to `purpose` in `state`
pub fn robot_summary(id: &RobotId, robot: &RobotConfig, purpose: &str, state: &str) -> RobotSummary {
    let mut beds = Vec::new();
    let mut target_states: Vec<StateName> = Vec::new();
    for (_, bed) in robot.beds_for(purpose, state) {
        beds.push(bed.label.clone());
        if let Some(target) = &bed.target_state {
            if !target_states.contains(target) {
                target_states.push(target.clone());
            }
        }
    }
    RobotSummary {
        id: id.clone(),
        name: robot.name.clone(),
        beds,
        target_states,
    }
}
