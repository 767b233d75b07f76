//! Feature flag set reconciliation.
//!
//! Every `/status` poll reports the service's boolean feature flags. The
//! [`FlagSet`] keeps one rendered entry per flag and, on each poll, applies
//! the smallest set of changes that makes the rendered set match the
//! snapshot: new flags are added, existing ones are updated in place, and
//! flags that disappeared are removed.
//!
//! The reconciler does no drawing. It returns [`FlagEvent`] records that a
//! presentation adapter implementing [`FlagListener`] turns into view
//! changes.
//!
//! Toggling is optimistic: [`FlagSet::begin_toggle`] flips the displayed
//! value before the request is sent, and [`FlagSet::finish_toggle`] reverts
//! it if the server refused.

pub mod aliases;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

pub use aliases::FlagAliases;

/// Server snapshot: full flag name → enabled.
pub type FlagSnapshot = BTreeMap<String, bool>;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A single change to the rendered flag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagEvent {
    /// A control was created for `key` and bound to toggle `full_key`.
    Added {
        key: String,
        full_key: String,
        enabled: bool,
    },
    /// The displayed value of an existing control changed.
    Updated { key: String, enabled: bool },
    /// The control for `key` was removed.
    Removed { key: String },
    /// The service is stopped and the "flags unavailable" notice is shown.
    PlaceholderShown,
    /// The notice was taken down because the service is running again.
    PlaceholderHidden,
}

impl FlagEvent {
    /// The display key this event concerns, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Added { key, .. } | Self::Updated { key, .. } | Self::Removed { key } => {
                Some(key)
            }
            Self::PlaceholderShown | Self::PlaceholderHidden => None,
        }
    }
}

/// Receives flag events and mirrors them into a view.
pub trait FlagListener {
    fn on_flag_event(&mut self, event: &FlagEvent);
}

impl<F: FnMut(&FlagEvent)> FlagListener for F {
    fn on_flag_event(&mut self, event: &FlagEvent) {
        self(event)
    }
}

// ---------------------------------------------------------------------------
// Flag set
// ---------------------------------------------------------------------------

/// One rendered flag control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFlag {
    pub full_key: String,
    pub display_key: String,
    pub enabled: bool,
}

/// A toggle that has been applied optimistically and awaits the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub display_key: String,
    pub full_key: String,
    /// Displayed value before the toggle.
    pub previous: bool,
}

impl PendingToggle {
    /// The value shown while the request is in flight.
    pub fn optimistic(&self) -> bool {
        !self.previous
    }
}

#[derive(Debug, Default)]
pub struct FlagSet {
    aliases: FlagAliases,
    rendered: BTreeMap<String, RenderedFlag>,
    placeholder: bool,
}

impl FlagSet {
    pub fn new(aliases: FlagAliases) -> Self {
        Self {
            aliases,
            rendered: BTreeMap::new(),
            placeholder: false,
        }
    }

    pub fn aliases(&self) -> &FlagAliases {
        &self.aliases
    }

    /// Display keys of every rendered control, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rendered.keys().map(String::as_str)
    }

    pub fn flags(&self) -> impl Iterator<Item = &RenderedFlag> {
        self.rendered.values()
    }

    pub fn get(&self, display_key: &str) -> Option<&RenderedFlag> {
        self.rendered.get(display_key)
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    pub fn shows_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Reconcile against one status poll.
    ///
    /// While the service is running the rendered set is made equal to the
    /// snapshot's key set (a missing snapshot counts as empty). When it is
    /// not running every control is removed and the placeholder is shown.
    pub fn reconcile(&mut self, running: bool, snapshot: Option<&FlagSnapshot>) -> Vec<FlagEvent> {
        if !running {
            return self.clear_for_stopped();
        }

        let empty = FlagSnapshot::new();
        let snapshot = snapshot.unwrap_or(&empty);
        let mut events = Vec::new();

        if self.placeholder {
            self.placeholder = false;
            events.push(FlagEvent::PlaceholderHidden);
        }

        let mut seen = BTreeSet::new();
        for (full_key, &enabled) in snapshot {
            let key = self.aliases.display_key(full_key).to_string();
            seen.insert(key.clone());

            match self.rendered.get_mut(&key) {
                Some(flag) => {
                    flag.full_key.clone_from(full_key);
                    if flag.enabled != enabled {
                        flag.enabled = enabled;
                        events.push(FlagEvent::Updated { key, enabled });
                    }
                }
                None => {
                    self.rendered.insert(
                        key.clone(),
                        RenderedFlag {
                            full_key: full_key.clone(),
                            display_key: key.clone(),
                            enabled,
                        },
                    );
                    events.push(FlagEvent::Added {
                        key,
                        full_key: full_key.clone(),
                        enabled,
                    });
                }
            }
        }

        let stale: Vec<String> = self
            .rendered
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            self.rendered.remove(&key);
            events.push(FlagEvent::Removed { key });
        }

        events
    }

    fn clear_for_stopped(&mut self) -> Vec<FlagEvent> {
        let mut events: Vec<FlagEvent> = std::mem::take(&mut self.rendered)
            .into_keys()
            .map(|key| FlagEvent::Removed { key })
            .collect();
        if !self.placeholder {
            self.placeholder = true;
            events.push(FlagEvent::PlaceholderShown);
        }
        events
    }

    /// Flip a flag's displayed value ahead of the server round-trip.
    ///
    /// `key` may be either the display key or the full key.
    pub fn begin_toggle(&mut self, key: &str) -> Result<PendingToggle> {
        let display_key = if self.rendered.contains_key(key) {
            key.to_string()
        } else {
            self.aliases.display_key(key).to_string()
        };

        let Some(flag) = self.rendered.get_mut(&display_key) else {
            anyhow::bail!("unknown feature flag: {key}");
        };

        let pending = PendingToggle {
            display_key,
            full_key: flag.full_key.clone(),
            previous: flag.enabled,
        };
        flag.enabled = pending.optimistic();
        Ok(pending)
    }

    /// Settle a toggle. On rejection the pre-toggle value is restored and
    /// the resulting event is returned.
    pub fn finish_toggle(&mut self, pending: &PendingToggle, accepted: bool) -> Option<FlagEvent> {
        if accepted {
            return None;
        }
        let flag = self.rendered.get_mut(&pending.display_key)?;
        flag.enabled = pending.previous;
        Some(FlagEvent::Updated {
            key: pending.display_key.clone(),
            enabled: pending.previous,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
