//! Motion table for the sorter arm and gripper.
//!
//! Every numeric parameter baked into a generated program lives here, not
//! scattered through the program text. The sort arm is motor E, the
//! gripper is motor F, the color sensor sits on port C.

use super::Command;

/// One bounded motor motion of a manual command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Absolute move of the sort arm (motor E) to a target angle.
    Target { speed: i32, angle: i32 },
    /// Relative move of the gripper (motor F) by a delta angle.
    Angle { speed: i32, delta: i32 },
}

/// Speed for operator-triggered single motions (deg/s).
pub const MANUAL_SPEED: i32 = 100;
/// Speed for the continuous auto-sort arm moves (deg/s).
pub const SORT_SPEED: i32 = 300;

/// Gripper control limits, applied in every program.
pub const GRIPPER_SPEED_LIMIT: i32 = 300;
pub const GRIPPER_ACCEL_LIMIT: i32 = 800;

/// Sort arm target angles (deg).
pub const ANGLE_HOME: i32 = 0;
pub const ANGLE_GREEN: i32 = -45;
pub const ANGLE_BLUE: i32 = -70;
pub const ANGLE_RED: i32 = 90;
pub const ANGLE_YELLOW: i32 = 125;

/// Gripper relative angles (deg).
pub const GRIPPER_OPEN: i32 = -40;
pub const GRIPPER_PUSH: i32 = 40;

/// Settle after a manual motion (ms).
pub const SETTLE_WAIT_MS: u32 = 100;
/// Pause between steps of one auto-sort cycle (ms).
pub const STEP_WAIT_MS: u32 = 200;
/// Retry pause when the sensor reads nothing sortable (ms).
pub const IDLE_WAIT_MS: u32 = 300;
/// Pause after returning home and after the terminal white read (ms).
pub const RETURN_WAIT_MS: u32 = 500;

/// The single motion a manual command performs. `AutoSort` runs a loop
/// rather than one motion and therefore has no entry.
pub fn manual_motion(cmd: Command) -> Option<Motion> {
    let motion = match cmd {
        Command::Home => Motion::Target {
            speed: MANUAL_SPEED,
            angle: ANGLE_HOME,
        },
        Command::SelectGreen => Motion::Target {
            speed: MANUAL_SPEED,
            angle: ANGLE_GREEN,
        },
        Command::SelectBlue => Motion::Target {
            speed: MANUAL_SPEED,
            angle: ANGLE_BLUE,
        },
        Command::SelectRed => Motion::Target {
            speed: MANUAL_SPEED,
            angle: ANGLE_RED,
        },
        Command::SelectYellow => Motion::Target {
            speed: MANUAL_SPEED,
            angle: ANGLE_YELLOW,
        },
        Command::OpenGripper => Motion::Angle {
            speed: MANUAL_SPEED,
            delta: GRIPPER_OPEN,
        },
        Command::PushBlock => Motion::Angle {
            speed: MANUAL_SPEED,
            delta: GRIPPER_PUSH,
        },
        Command::AutoSort => return None,
    };
    Some(motion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_angles_are_distinct() {
        let mut angles = [ANGLE_GREEN, ANGLE_BLUE, ANGLE_RED, ANGLE_YELLOW, ANGLE_HOME];
        angles.sort_unstable();
        for pair in angles.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_only_auto_sort_lacks_a_manual_motion() {
        for cmd in Command::ALL {
            assert_eq!(manual_motion(cmd).is_none(), cmd == Command::AutoSort);
        }
    }

    #[test]
    fn test_gripper_open_and_push_cancel_out() {
        // One open followed by one push returns the gripper to its rest angle.
        assert_eq!(GRIPPER_OPEN + GRIPPER_PUSH, 0);
    }
}
