//! Timer triggers declared in `AGENTS.md`
//!
//! Startup parses the front matter, turns usable `functions` entries into
//! [`TimerSpec`]s and registers each one through
//! [`TimerScheduler::register_timer`]. Invalid entries are skipped with a
//! warning; they never stop the process from starting.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use tokio::task::JoinHandle;

use crate::agents::{RunRequest, SessionRunner};
use crate::config::FunctionDefinition;

/// A validated timer trigger
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSpec {
    pub name: String,
    /// Six-field cron expression (seconds first)
    pub schedule: String,
    pub prompt: String,
    /// Whether the agent's answer is written to the log
    pub log_response: bool,
}

impl TimerSpec {
    /// Build from the front matter entry at 1-based `position`
    pub fn from_definition(position: usize, def: &FunctionDefinition) -> Result<Self, String> {
        let trigger = def.trigger.as_deref().unwrap_or_default();
        if !trigger.eq_ignore_ascii_case("timer") {
            return Err(format!("unsupported trigger '{}'", trigger));
        }

        let prompt = def
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "missing prompt".to_string())?;

        let schedule = def
            .schedule
            .as_deref()
            .ok_or_else(|| "missing schedule".to_string())?;

        Ok(Self {
            name: def
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("timer_{}", position)),
            schedule: normalize_schedule(schedule)?,
            prompt: prompt.to_string(),
            log_response: def.logger.unwrap_or(true),
        })
    }
}

/// Prepend a seconds field to 5-field cron, shift day-of-week numbers from
/// the usual 0-7 (0 and 7 are Sunday) to the `cron` crate's 1-7 (1 is
/// Sunday), and check the result parses
pub fn normalize_schedule(raw: &str) -> Result<String, String> {
    let mut fields: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if fields.len() == 5 {
        fields.insert(0, "0".to_string());
    }
    if let Some(day_of_week) = fields.get_mut(5) {
        *day_of_week = shift_day_of_week(day_of_week);
    }
    let normalized = fields.join(" ");

    Schedule::from_str(&normalized)
        .map_err(|e| format!("invalid schedule '{}': {}", raw, e))?;
    Ok(normalized)
}

fn shift_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|item| {
            let (base, step) = match item.split_once('/') {
                Some((base, step)) => (base, Some(step)),
                None => (item, None),
            };
            let shifted = match base.split_once('-') {
                Some((start, end)) => match (shift_day(start), end, shift_day(end)) {
                    (Some(_), "7", _) if start == "0" => "1-7".to_string(),
                    // 5-7 is Friday through Sunday, which wraps past the crate's last day
                    (Some(start), "7", _) if step.is_none() => format!("{}-7,1", start),
                    (Some(start), "7", _) => format!("{}-7", start),
                    (Some(start), _, Some(end)) => format!("{}-{}", start, end),
                    _ => base.to_string(),
                },
                None => shift_day(base).map_or_else(|| base.to_string(), |d| d.to_string()),
            };
            match step {
                Some(step) => format!("{}/{}", shifted, step),
                None => shifted,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Numeric day 0-7 to 1-7; names and wildcards are left alone
fn shift_day(day: &str) -> Option<u8> {
    match day.parse::<u8>().ok()? {
        0 | 7 => Some(1),
        d @ 1..=6 => Some(d + 1),
        _ => None,
    }
}

/// Usable timers from the front matter, in declaration order
pub fn timer_specs(functions: &[FunctionDefinition]) -> Vec<TimerSpec> {
    functions
        .iter()
        .enumerate()
        .filter_map(|(i, def)| match TimerSpec::from_definition(i + 1, def) {
            Ok(spec) => Some(spec),
            Err(reason) => {
                tracing::warn!(position = i + 1, name = ?def.name, %reason, "Skipping function entry");
                None
            }
        })
        .collect()
}

/// Runs registered timers on the tokio runtime
pub struct TimerScheduler {
    runner: Arc<SessionRunner>,
    timers: Vec<(TimerSpec, Schedule)>,
    handles: Vec<JoinHandle<()>>,
}

impl TimerScheduler {
    pub fn new(runner: Arc<SessionRunner>) -> Self {
        Self {
            runner,
            timers: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Register a timer; rejected when its schedule does not parse or the
    /// name is already taken
    pub fn register_timer(&mut self, spec: TimerSpec) -> Result<(), String> {
        if self.timers.iter().any(|(t, _)| t.name == spec.name) {
            return Err(format!("timer '{}' already registered", spec.name));
        }
        let schedule = Schedule::from_str(&spec.schedule)
            .map_err(|e| format!("invalid schedule '{}': {}", spec.schedule, e))?;

        tracing::info!(timer = %spec.name, schedule = %spec.schedule, "Registered timer");
        self.timers.push((spec, schedule));
        Ok(())
    }

    pub fn timers(&self) -> impl Iterator<Item = &TimerSpec> {
        self.timers.iter().map(|(spec, _)| spec)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Spawn one task per registered timer
    pub fn start(&mut self) {
        for (spec, schedule) in &self.timers {
            let runner = self.runner.clone();
            let spec = spec.clone();
            let schedule = schedule.clone();
            self.handles.push(tokio::spawn(async move {
                timer_loop(runner, spec, schedule).await;
            }));
        }
        tracing::info!(timers = self.handles.len(), "Timer scheduler started");
    }

    /// Abort every timer task
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn timer_loop(runner: Arc<SessionRunner>, spec: TimerSpec, schedule: Schedule) {
    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            tracing::info!(timer = %spec.name, "Schedule has no further fire times");
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        fire(&runner, &spec).await;
    }
}

/// Run the timer's prompt once; failures are logged and never propagate
pub async fn fire(runner: &SessionRunner, spec: &TimerSpec) {
    tracing::info!(timer = %spec.name, "Timer fired");
    match runner.run(RunRequest::new(spec.prompt.clone())).await {
        Ok(result) if spec.log_response => {
            tracing::info!(
                timer = %spec.name,
                session_id = %result.session_id,
                response = %result.content,
                "Timer run completed"
            );
        }
        Ok(result) => {
            tracing::info!(timer = %spec.name, session_id = %result.session_id, "Timer run completed");
        }
        Err(e) => {
            tracing::error!(timer = %spec.name, error = %e, "Timer run failed");
        }
    }
}
