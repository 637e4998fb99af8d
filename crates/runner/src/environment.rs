//! Execution-mode resolution - headed vs headless policy

use std::env;

use tokio::process::Command;

/// Platform facts that decide whether a visible browser window is possible.
#[derive(Debug, Clone, Copy)]
pub struct HostCapabilities {
    /// The host session can render a browser window.
    pub has_display: bool,
    /// `FORCE_HEADED=true` - the operator insists headed mode works even
    /// though no display was detected (e.g. Xvfb started out of band).
    pub force_headed: bool,
}

impl HostCapabilities {
    /// Detect capabilities from the host platform and environment.
    ///
    /// Windows and macOS sessions always have a display surface. Everywhere
    /// else (Linux desktops, containers, CI) a display exists only when
    /// `DISPLAY` or `WAYLAND_DISPLAY` is set.
    pub fn detect() -> Self {
        let has_display = cfg!(any(windows, target_os = "macos"))
            || env::var_os("DISPLAY").is_some()
            || env::var_os("WAYLAND_DISPLAY").is_some();

        let force_headed = env::var("FORCE_HEADED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            has_display,
            force_headed,
        }
    }
}

/// Resolved environment for one run: the effective mode plus the variables
/// the Playwright process needs set or removed so it agrees with that mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    /// Effective mode after applying host capabilities.
    pub headed: bool,
    set: Vec<(&'static str, &'static str)>,
    removed: Vec<&'static str>,
}

impl ExecutionEnvironment {
    /// Decide the effective mode for a run.
    ///
    /// Headed mode is granted only when the caller asked for it and the host
    /// can render a window (or the operator forced it). In every other case
    /// the run is silently downgraded to headless so Playwright does not try
    /// to open a window it cannot draw. The downgrade is a compatibility
    /// accommodation, not an error.
    pub fn resolve(requested_headed: bool, caps: &HostCapabilities) -> Self {
        let headed = requested_headed && (caps.has_display || caps.force_headed);

        if headed {
            Self {
                headed,
                set: vec![("HEADLESS", "0"), ("PWDEBUG", "0")],
                removed: vec!["CI"],
            }
        } else {
            Self {
                headed,
                set: vec![("CI", "1"), ("HEADLESS", "1")],
                removed: vec![],
            }
        }
    }

    /// Apply the resolved variables to a child process command.
    pub fn apply(&self, cmd: &mut Command) {
        for (key, value) in &self.set {
            cmd.env(key, value);
        }
        for key in &self.removed {
            cmd.env_remove(key);
        }
    }

    /// Variables that will be set on the child.
    pub fn set_vars(&self) -> &[(&'static str, &'static str)] {
        &self.set
    }

    /// Variables that will be removed from the child's environment.
    pub fn removed_vars(&self) -> &[&'static str] {
        &self.removed
    }
}
