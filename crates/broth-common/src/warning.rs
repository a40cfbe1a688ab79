//! Deduplicated warnings.
//!
//! Recoverable oddities (dropped processing instructions, unknown charset
//! names, wrap markup without an element) are reported once per unique
//! message so a large document does not flood the log. Messages are emitted
//! as `tracing` warnings; the subscriber decides where they go.

use std::collections::HashSet;
use std::sync::Mutex;

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about a recoverable condition (emits once per unique message)
///
/// # Example
/// ```
/// broth_common::warning::warn_once("HTML", "dropping processing instruction 'xml'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    // A poisoned set only means another thread panicked mid-insert; the
    // set itself is still usable.
    let should_emit = WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_emit {
        tracing::warn!(component, "{message}");
    }
}

/// Forget every recorded warning so each can be emitted again (call when
/// loading a new document)
pub fn clear_warnings() {
    let mut guard = WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Returns true if this exact warning has already been emitted.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .as_ref()
        .is_some_and(|set| set.contains(&key))
}
