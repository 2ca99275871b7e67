use std::process::{Command as ProcessCommand, ExitStatus};

use anyhow::{Context, Result};

/// Runs the player to completion. Ctrl-C stops the player, never radiotrack.
///
/// When stdin is a terminal the player gets its own process group and the
/// terminal's foreground for the duration of the run.
#[cfg(unix)]
pub(super) fn run_in_foreground(cmd: ProcessCommand) -> Result<ExitStatus> {
    run_attached(cmd, libc::STDIN_FILENO)
}

#[cfg(not(unix))]
pub(super) fn run_in_foreground(mut cmd: ProcessCommand) -> Result<ExitStatus> {
    cmd.status().context("failed to launch player")
}

#[cfg(unix)]
fn run_attached(mut cmd: ProcessCommand, tty_fd: libc::c_int) -> Result<ExitStatus> {
    use std::os::unix::process::CommandExt;

    let owner_pgrp = match unsafe { libc::tcgetpgrp(tty_fd) } {
        -1 => None,
        pgrp => Some(pgrp),
    };
    let own_group = owner_pgrp.is_some();

    let _sigint = SignalMask::ignore(libc::SIGINT)?;
    // Taking the terminal back from a background group raises SIGTTOU.
    let _sigttou = match owner_pgrp {
        Some(_) => Some(SignalMask::ignore(libc::SIGTTOU)?),
        None => None,
    };

    // Ignored dispositions survive exec; the player must see Ctrl-C again.
    unsafe {
        cmd.pre_exec(move || {
            for signum in [libc::SIGINT, libc::SIGQUIT, libc::SIGTSTP, libc::SIGTTOU] {
                libc::signal(signum, libc::SIG_DFL);
            }
            if own_group && libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = cmd.spawn().context("failed to spawn player")?;
    let _terminal = owner_pgrp
        .and_then(|owner| TerminalLoan::lend(tty_fd, owner, child.id() as libc::pid_t));
    child.wait().context("failed waiting on player")
}

/// A signal disposition swapped to `SIG_IGN`, restored on drop.
#[cfg(unix)]
struct SignalMask {
    signum: libc::c_int,
    previous: libc::sigaction,
}

#[cfg(unix)]
impl SignalMask {
    fn ignore(signum: libc::c_int) -> Result<Self> {
        unsafe {
            let mut ignore: libc::sigaction = std::mem::zeroed();
            ignore.sa_sigaction = libc::SIG_IGN;
            libc::sigemptyset(&mut ignore.sa_mask);

            let mut previous: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signum, &ignore, &mut previous) != 0 {
                return Err(std::io::Error::last_os_error())
                    .with_context(|| format!("failed to ignore signal {signum}"));
            }
            Ok(Self { signum, previous })
        }
    }
}

#[cfg(unix)]
impl Drop for SignalMask {
    fn drop(&mut self) {
        unsafe {
            libc::sigaction(self.signum, &self.previous, std::ptr::null_mut());
        }
    }
}

/// Terminal foreground lent to the player's group until dropped.
#[cfg(unix)]
struct TerminalLoan {
    tty_fd: libc::c_int,
    owner_pgrp: libc::pid_t,
}

#[cfg(unix)]
impl TerminalLoan {
    fn lend(tty_fd: libc::c_int, owner_pgrp: libc::pid_t, borrower: libc::pid_t) -> Option<Self> {
        (unsafe { libc::tcsetpgrp(tty_fd, borrower) } == 0).then_some(Self { tty_fd, owner_pgrp })
    }
}

#[cfg(unix)]
impl Drop for TerminalLoan {
    fn drop(&mut self) {
        unsafe {
            libc::tcsetpgrp(self.tty_fd, self.owner_pgrp);
        }
    }
}
