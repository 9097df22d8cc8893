//! Pybricks MicroPython program generation.
//!
//! Each submitted command becomes a fresh, self-contained program the hub
//! runs to completion. Generation is pure and total over the closed
//! command set; bad operator input is rejected earlier, at the parsing
//! boundary.

use super::motion::{self, Motion};
use super::Command;

/// Generate the MicroPython source the hub runs for one command.
pub fn generate(cmd: Command) -> String {
    match motion::manual_motion(cmd) {
        Some(m) => manual_program(m),
        None => auto_sort_program(),
    }
}

/// One bounded motion, then a short settle.
fn manual_program(m: Motion) -> String {
    format!(
        "\
from pybricks.hubs import PrimeHub
from pybricks.pupdevices import Motor
from pybricks.parameters import Port
from pybricks.tools import wait

hub = PrimeHub()

motorE = Motor(Port.E)
motorF = Motor(Port.F)

motorF.control.limits(speed={gripper_speed}, acceleration={gripper_accel})

{action}

wait({settle})
",
        gripper_speed = motion::GRIPPER_SPEED_LIMIT,
        gripper_accel = motion::GRIPPER_ACCEL_LIMIT,
        action = action_line(m),
        settle = motion::SETTLE_WAIT_MS,
    )
}

fn action_line(m: Motion) -> String {
    match m {
        Motion::Target { speed, angle } => format!("motorE.run_target({speed}, {angle})"),
        Motion::Angle { speed, delta } => format!("motorF.run_angle({speed}, {delta})"),
    }
}

/// Continuous sorting: read the color sensor, move the arm to the color's
/// bin, run the open/push/return gripper cycle, repeat. A white read
/// terminates the loop; an unrecognized read idles and retries.
fn auto_sort_program() -> String {
    format!(
        "\
from pybricks.hubs import PrimeHub
from pybricks.pupdevices import Motor, ColorSensor
from pybricks.parameters import Port, Color
from pybricks.tools import wait

hub = PrimeHub()

motorE = Motor(Port.E)
motorF = Motor(Port.F)
sensor = ColorSensor(Port.C)

motorF.control.limits(speed={gripper_speed}, acceleration={gripper_accel})

while True:
    color = sensor.color()

    if color == Color.WHITE:
        hub.light.on(Color.WHITE)
        wait({terminal})
        break

    if color == Color.GREEN:
        motorE.run_target({sort_speed}, {green})
    elif color == Color.BLUE:
        motorE.run_target({sort_speed}, {blue})
    elif color == Color.RED:
        motorE.run_target({sort_speed}, {red})
    elif color == Color.YELLOW:
        motorE.run_target({sort_speed}, {yellow})
    else:
        wait({idle})
        continue

    wait({step})

    motorF.run_angle({sort_speed}, {open})
    wait({step})

    motorF.run_angle({sort_speed}, {push})
    wait({step})

    motorE.run_target({sort_speed}, {home})
    wait({terminal})
",
        gripper_speed = motion::GRIPPER_SPEED_LIMIT,
        gripper_accel = motion::GRIPPER_ACCEL_LIMIT,
        sort_speed = motion::SORT_SPEED,
        green = motion::ANGLE_GREEN,
        blue = motion::ANGLE_BLUE,
        red = motion::ANGLE_RED,
        yellow = motion::ANGLE_YELLOW,
        home = motion::ANGLE_HOME,
        open = motion::GRIPPER_OPEN,
        push = motion::GRIPPER_PUSH,
        step = motion::STEP_WAIT_MS,
        idle = motion::IDLE_WAIT_MS,
        terminal = motion::RETURN_WAIT_MS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programs_are_deterministic_and_non_empty() {
        for cmd in Command::ALL {
            let first = generate(cmd);
            assert!(!first.is_empty());
            assert_eq!(first, generate(cmd));
        }
    }

    #[test]
    fn test_auto_sort_terminates_on_white() {
        let program = generate(Command::AutoSort);
        assert!(program.contains("if color == Color.WHITE:"));
        assert!(program.contains("break"));
        // The terminal branch is distinct from every sortable color branch.
        for color in ["GREEN", "BLUE", "RED", "YELLOW"] {
            assert!(!program.contains(&format!("Color.{color}:\n        break")));
        }
    }

    #[test]
    fn test_auto_sort_has_four_distinct_sort_branches() {
        let program = generate(Command::AutoSort);
        for line in [
            "motorE.run_target(300, -45)",
            "motorE.run_target(300, -70)",
            "motorE.run_target(300, 90)",
            "motorE.run_target(300, 125)",
        ] {
            assert_eq!(program.matches(line).count(), 1, "missing branch: {line}");
        }
    }

    #[test]
    fn test_auto_sort_idles_on_unrecognized_reading() {
        let program = generate(Command::AutoSort);
        assert!(program.contains("else:\n        wait(300)\n        continue"));
    }

    #[test]
    fn test_manual_programs_are_single_bounded_motions() {
        for cmd in Command::ALL {
            if cmd == Command::AutoSort {
                continue;
            }
            let program = generate(cmd);
            assert!(!program.contains("while True"), "{cmd} must not loop");
            assert!(!program.contains("ColorSensor"), "{cmd} must not read the sensor");
            let motions = program.matches("motorE.run_target").count()
                + program.matches("motorF.run_angle").count();
            assert_eq!(motions, 1, "{cmd} must perform exactly one motion");
            assert!(program.trim_end().ends_with("wait(100)"));
        }
    }

    #[test]
    fn test_every_program_applies_gripper_limits() {
        for cmd in Command::ALL {
            assert!(generate(cmd).contains("motorF.control.limits(speed=300, acceleration=800)"));
        }
    }
}
