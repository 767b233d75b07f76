//! Dashboard session: one instance of every reconciliation engine.
//!
//! Owns the log tail, the flag set, the last fetched configuration and its
//! edit form, and the notification queue. Each `refresh_*` method performs
//! one fetch followed by one reconciliation pass that runs to completion;
//! mutations (`toggle_flag`, `save_config`, `service`) call the API and then
//! re-fetch status so the view is reconciled against the server's answer.
//!
//! Failures are reported through the [`Notifier`] and returned to the
//! caller; the view is left at its last good state.
//!
//! Fetches take a sequencing ticket (`begin_*`) and are applied with
//! `apply_*`, so a caller that overlaps requests has stale responses
//! dropped instead of reconciled.

pub mod schedule;

use anyhow::Result;
use chrono::Utc;

use crate::client::{self, ControlApi, ServiceAction, StatusSnapshot, User};
use crate::config::DashConfig;
use crate::events::{EventLevel, EventLog};
use crate::flags::{FlagAliases, FlagEvent, FlagListener, FlagSet};
use crate::logs::{LogBuffer, LogDelta, LogTail, split_snapshot};
use crate::notify::{Level, Notice, Notifier};
use crate::settings::{ConfigSnapshot, FormModel, FormOptions, extract, render};
use crate::users::{UserDraft, check_passwords};
use crate::utils::sequence::{Sequencer, Ticket};

pub struct Dashboard<A: ControlApi> {
    api: A,
    logs: LogTail,
    log_limit: usize,
    flags: FlagSet,
    status_seq: Sequencer,
    status: Option<StatusSnapshot>,
    config_seq: Sequencer,
    current_config: Option<ConfigSnapshot>,
    form: Option<FormModel>,
    form_options: FormOptions,
    notifier: Notifier,
    events: EventLog,
    listeners: Vec<Box<dyn FlagListener>>,
}

impl<A: ControlApi> Dashboard<A> {
    pub fn new(api: A, config: &DashConfig, events: EventLog) -> Self {
        Self {
            api,
            logs: LogTail::with_capacity(config.polling.log_capacity),
            log_limit: config.polling.log_limit,
            flags: FlagSet::new(FlagAliases::with_overrides(&config.flags.aliases)),
            status_seq: Sequencer::new(),
            status: None,
            config_seq: Sequencer::new(),
            current_config: None,
            form: None,
            form_options: config.settings.form_options(),
            notifier: Notifier::new(config.notify.ttl_secs),
            events,
            listeners: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Register a view adapter for flag events.
    pub fn subscribe(&mut self, listener: Box<dyn FlagListener>) {
        self.listeners.push(listener);
    }

    pub fn log_buffer(&self) -> &LogBuffer {
        self.logs.buffer()
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.as_ref()
    }

    pub fn current_config(&self) -> Option<&ConfigSnapshot> {
        self.current_config.as_ref()
    }

    pub fn form(&self) -> Option<&FormModel> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut FormModel> {
        self.form.as_mut()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Notices raised since the last call. Expired ones already shown are
    /// dropped.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let fresh = self.notifier.take_unseen();
        self.notifier.prune(Utc::now());
        fresh
    }

    fn dispatch(&mut self, events: &[FlagEvent]) {
        for listener in &mut self.listeners {
            for event in events {
                listener.on_flag_event(event);
            }
        }
    }

    fn report(&mut self, context: &str, err: &client::Error) {
        self.notifier.danger(format!("{context}: {err}"));
    }

    // -- Status / flags --

    pub fn begin_status(&mut self) -> Ticket {
        self.status_seq.issue()
    }

    /// Fetch `/status` and reconcile the flag set.
    pub fn refresh_status(&mut self) -> client::Result<Vec<FlagEvent>> {
        let ticket = self.begin_status();
        let fetched = self.api.status();
        self.apply_status(ticket, fetched)
    }

    pub fn apply_status(
        &mut self,
        ticket: Ticket,
        fetched: client::Result<StatusSnapshot>,
    ) -> client::Result<Vec<FlagEvent>> {
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.report("Error loading status", &err);
                return Err(err);
            }
        };

        if !self.status_seq.accept(ticket) {
            self.events
                .record(EventLevel::Debug, "stale_response", "dropped stale /status");
            return Ok(Vec::new());
        }

        if let Some(error) = &snapshot.error {
            self.events
                .record(EventLevel::Warn, "status_error", error.clone());
        }

        let events = self
            .flags
            .reconcile(snapshot.running, snapshot.features.as_ref());
        self.dispatch(&events);
        self.status = Some(snapshot);
        Ok(events)
    }

    /// Toggle a flag optimistically.
    ///
    /// On success the status is re-fetched and the flag's reconciled value
    /// returned. On failure the displayed value is restored before the
    /// error is returned.
    pub fn toggle_flag(&mut self, key: &str) -> Result<bool> {
        let pending = self.flags.begin_toggle(key)?;
        self.dispatch(&[FlagEvent::Updated {
            key: pending.display_key.clone(),
            enabled: pending.optimistic(),
        }]);

        match self.api.toggle_feature(&pending.display_key) {
            Ok(message) => {
                self.flags.finish_toggle(&pending, true);
                self.notifier.success(message);
                let _ = self.refresh_status();
                Ok(self
                    .flags
                    .get(&pending.display_key)
                    .map_or(pending.optimistic(), |flag| flag.enabled))
            }
            Err(err) => {
                if let Some(event) = self.flags.finish_toggle(&pending, false) {
                    self.dispatch(&[event]);
                }
                self.events.record(
                    EventLevel::Warn,
                    "toggle_reverted",
                    format!("{}: {err}", pending.full_key),
                );
                self.report("Error toggling feature", &err);
                Err(err.into())
            }
        }
    }

    /// Start, stop or restart the service, then refresh status whatever the
    /// outcome.
    pub fn service(&mut self, action: ServiceAction) -> client::Result<String> {
        let result = self.api.service(action);
        match &result {
            Ok(message) => self.notifier.success(message.clone()),
            Err(err) if err.is_rejection() => self.notifier.danger(err.to_string()),
            Err(err) => self.report(&format!("Error calling {}", action.path()), err),
        }
        let _ = self.refresh_status();
        result
    }

    // -- Logs --

    pub fn begin_logs(&mut self) -> Ticket {
        self.logs.begin()
    }

    /// Fetch the recent log window and append what is new.
    pub fn refresh_logs(&mut self) -> client::Result<LogDelta> {
        let ticket = self.begin_logs();
        let fetched = self.api.logs(self.log_limit);
        self.apply_logs(ticket, fetched)
    }

    pub fn apply_logs(
        &mut self,
        ticket: Ticket,
        fetched: client::Result<String>,
    ) -> client::Result<LogDelta> {
        let text = match fetched {
            Ok(text) => text,
            Err(err) => {
                self.report("Error loading logs", &err);
                return Err(err);
            }
        };

        let Some(delta) = self.logs.apply(ticket, split_snapshot(&text)) else {
            self.events
                .record(EventLevel::Debug, "stale_response", "dropped stale /logs");
            return Ok(LogDelta::Unchanged);
        };

        if let LogDelta::Replaced { lines } = &delta {
            self.events.record(
                EventLevel::Info,
                "log_desync",
                format!("anchor not found, buffer replaced with {} lines", lines.len()),
            );
        }
        Ok(delta)
    }

    // -- Configuration --

    pub fn begin_config(&mut self) -> Ticket {
        self.config_seq.issue()
    }

    /// Fetch `/config`, replace the current snapshot and re-render the
    /// form. Unsaved edits in the previous form are discarded.
    pub fn refresh_config(&mut self) -> client::Result<()> {
        let ticket = self.begin_config();
        let fetched = self.api.config();
        self.apply_config(ticket, fetched)
    }

    pub fn apply_config(
        &mut self,
        ticket: Ticket,
        fetched: client::Result<ConfigSnapshot>,
    ) -> client::Result<()> {
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.report("Error loading configuration", &err);
                return Err(err);
            }
        };

        if !self.config_seq.accept(ticket) {
            self.events
                .record(EventLevel::Debug, "stale_response", "dropped stale /config");
            return Ok(());
        }

        self.form = Some(render(&snapshot, &self.form_options));
        self.current_config = Some(snapshot);
        Ok(())
    }

    /// Send the edited form back to the server.
    pub fn save_config(&mut self) -> Result<String> {
        let (Some(form), Some(original)) = (&self.form, &self.current_config) else {
            anyhow::bail!("configuration has not been loaded");
        };
        let snapshot = extract(form, original);

        match self.api.save_config(&snapshot) {
            Ok(message) => {
                self.notifier.success(message.clone());
                self.current_config = Some(snapshot);
                let _ = self.refresh_status();
                Ok(message)
            }
            Err(err) => {
                self.report("Error saving configuration", &err);
                Err(err.into())
            }
        }
    }

    // -- Users --

    pub fn users(&mut self) -> client::Result<Vec<User>> {
        self.api.users().inspect_err(|err| {
            self.notifier.danger(format!("Error loading users: {err}"));
        })
    }

    pub fn add_user(&mut self, draft: &UserDraft) -> Result<String> {
        let user = match draft.validate() {
            Ok(user) => user,
            Err(err) => {
                self.notifier.danger(err.to_string());
                return Err(err);
            }
        };
        let result = self.api.add_user(&user);
        self.mutation_result(result)
    }

    pub fn delete_user(&mut self, id: u64) -> Result<String> {
        let result = self.api.delete_user(id);
        self.mutation_result(result)
    }

    pub fn change_password(&mut self, id: u64, password: &str, confirm: &str) -> Result<String> {
        if let Err(err) = check_passwords(password, confirm) {
            self.notifier.danger(err.to_string());
            return Err(err);
        }
        let result = self.api.change_password(id, password);
        self.mutation_result(result)
    }

    fn mutation_result(&mut self, result: client::Result<String>) -> Result<String> {
        let message = match &result {
            Ok(message) => message.clone(),
            Err(err) => err.to_string(),
        };
        self.notifier.push(Level::for_status(result.is_ok()), message);
        result.map_err(Into::into)
    }
}
