use color_eyre::{eyre::eyre, Result};

/// System clipboard, opened on first use.
///
/// The handle is kept for the whole session: on X11 the copied text is only
/// served while it is alive.
#[derive(Default)]
pub struct Clipboard {
  inner: Option<arboard::Clipboard>,
}

impl Clipboard {
  /// Put `url` on the clipboard.
  pub fn copy_url(&mut self, url: &str) -> Result<()> {
    if url.is_empty() {
      return Err(eyre!("no URL to copy"));
    }
    let clipboard = match self.inner.as_mut() {
      Some(clipboard) => clipboard,
      None => {
        let clipboard =
          arboard::Clipboard::new().map_err(|e| eyre!("clipboard unavailable: {}", e))?;
        self.inner.insert(clipboard)
      }
    };
    clipboard
      .set_text(url.to_string())
      .map_err(|e| eyre!("clipboard write failed: {}", e))?;
    tracing::debug!(url, "copied to clipboard");
    Ok(())
  }
}
