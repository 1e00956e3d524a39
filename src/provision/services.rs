/// System service enablement through systemctl.
use crate::config::types::Result;
use crate::provision::run_checked;
use std::process::Command;

/// GPIO daemon driven by the servo layer.
pub const GPIO_DAEMON_UNIT: &str = "pigpiod";
/// Remote-desktop server enabled as a best-effort convenience.
pub const VNC_UNIT: &str = "vncserver-x11-serviced";

pub(crate) fn systemctl(args: &[&str]) -> Command {
    let mut cmd = Command::new("systemctl");
    cmd.args(args);
    cmd
}

/// Enable a unit at boot and start it immediately.
pub fn enable_now(unit: &str) -> Result<()> {
    run_checked(&mut systemctl(&["enable", "--now", unit]), &format!("enable {}", unit))
}

/// Enable a unit at boot without starting it.
pub fn enable_on_boot(unit: &str) -> Result<()> {
    run_checked(&mut systemctl(&["enable", unit]), &format!("enable {}", unit))
}

/// Disable the graphical auto-login so the robot boots to a console.
pub fn disable_graphical_autologin() -> Result<()> {
    run_checked(
        Command::new("raspi-config").args(["nonint", "do_boot_behaviour", "B1"]),
        "raspi-config do_boot_behaviour",
    )
}
