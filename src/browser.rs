use color_eyre::{eyre::eyre, Result};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

/// Open `url` with the platform's default handler.
///
/// The opener runs detached so the event loop never blocks on it.
pub fn open_url(url: &str) -> Result<()> {
  if url.is_empty() {
    return Err(eyre!("no URL to open"));
  }

  #[cfg(target_os = "macos")]
  let command = {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
  };
  #[cfg(target_os = "windows")]
  let command = {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
  };
  #[cfg(not(any(target_os = "macos", target_os = "windows")))]
  let command = {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
  };

  spawn_detached(command).map_err(|e| eyre!("failed to launch browser: {}", e))?;
  tracing::debug!(url, "opened in browser");
  Ok(())
}

/// Start `command` with null stdio and reap it on a helper thread.
///
/// The returned handle yields the exit status once the child is gone.
fn spawn_detached(mut command: Command) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
  let mut child = command
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()?;

  Ok(std::thread::spawn(move || match child.wait() {
    Ok(status) => {
      if !status.success() {
        tracing::warn!(%status, "browser opener exited with an error");
      }
      Some(status)
    }
    Err(e) => {
      tracing::warn!(error = %e, "failed to wait for browser opener");
      None
    }
  }))
}
