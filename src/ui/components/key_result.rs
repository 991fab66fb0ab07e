/// What a component did with a key press.
///
/// Components return this so the app can decide whether to keep routing the
/// key (e.g. to list navigation) or stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the caller to do
  Handled,
  /// Key was consumed and produced an event for the caller
  Event(T),
  /// Key was not consumed, try the next handler
  NotHandled,
}
