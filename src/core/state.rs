/// Dashboard state container
///
/// All mutation goes through `DashboardState::apply`. Selecting an instance
/// clears every window and bumps the generation; poll results carry the
/// generation they were dispatched under and are dropped when it is stale.

use crate::core::snapshot::{MetricSample, SystemSnapshot};
use crate::core::window::RollingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
}

impl MetricKind {
    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "CPU Usage",
            MetricKind::Memory => "Memory Usage",
            MetricKind::Disk => "Disk Usage",
        }
    }

    /// Caption under the gauge
    pub fn gauge_caption(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "Average",
            _ => "Current",
        }
    }

    pub fn all() -> &'static [MetricKind] {
        &[MetricKind::Cpu, MetricKind::Memory, MetricKind::Disk]
    }
}

/// Result of one poll, tagged at dispatch time
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub generation: u64,
    pub result: Result<SystemSnapshot, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    InstancesLoaded(Vec<String>),
    InstancesFailed(String),
    Select(String),
    SelectNext,
    SelectPrev,
    Polled(PollOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the instance list
    Loading,
    Ready,
}

#[derive(Debug)]
pub struct DashboardState {
    global: bool,
    phase: Phase,
    instances: Vec<String>,
    selected: Option<String>,
    generation: u64,
    cpu: RollingWindow<MetricSample>,
    memory: RollingWindow<MetricSample>,
    disk: RollingWindow<MetricSample>,
    last_error: Option<String>,
    last_update: Option<String>,
}

impl DashboardState {
    /// Instance-selecting dashboard; starts in `Phase::Loading`
    pub fn new(history: usize) -> Self {
        Self {
            global: false,
            phase: Phase::Loading,
            instances: Vec::new(),
            selected: None,
            generation: 0,
            cpu: RollingWindow::new(history),
            memory: RollingWindow::new(history),
            disk: RollingWindow::new(history),
            last_error: None,
            last_update: None,
        }
    }

    /// Unscoped dashboard: no instance list, polls immediately
    pub fn global(history: usize) -> Self {
        Self {
            global: true,
            phase: Phase::Ready,
            ..Self::new(history)
        }
    }

    /// Apply an action. Returns true when the selection changed and polling
    /// has to restart under the new generation.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::InstancesLoaded(instances) => {
                self.phase = Phase::Ready;
                self.instances = instances;

                let keep = self
                    .selected
                    .as_ref()
                    .map_or(false, |s| self.instances.contains(s));
                if keep {
                    return false;
                }
                match self.instances.first().cloned() {
                    Some(first) => self.select(first),
                    None => {
                        let had_selection = self.selected.take().is_some();
                        if had_selection {
                            self.reset_windows();
                        }
                        had_selection
                    }
                }
            }
            Action::InstancesFailed(error) => {
                self.phase = Phase::Ready;
                self.last_error = Some(error);
                false
            }
            Action::Select(instance) => {
                if !self.instances.contains(&instance) || self.selected.as_ref() == Some(&instance) {
                    return false;
                }
                self.select(instance)
            }
            Action::SelectNext => self.step(1),
            Action::SelectPrev => self.step(-1),
            Action::Polled(outcome) => {
                if outcome.generation != self.generation {
                    tracing::debug!(
                        stale = outcome.generation,
                        current = self.generation,
                        "discarding poll result"
                    );
                    return false;
                }
                match outcome.result {
                    Ok(snapshot) => {
                        self.last_update = snapshot.cpu.last().map(|s| s.t.clone());
                        self.cpu.extend(snapshot.cpu);
                        self.memory.extend(snapshot.memory);
                        self.disk.extend(snapshot.disk);
                        self.last_error = None;
                    }
                    Err(error) => self.last_error = Some(error),
                }
                false
            }
        }
    }

    fn select(&mut self, instance: String) -> bool {
        self.selected = Some(instance);
        self.reset_windows();
        true
    }

    fn reset_windows(&mut self) {
        self.generation += 1;
        self.cpu.clear();
        self.memory.clear();
        self.disk.clear();
        self.last_error = None;
        self.last_update = None;
    }

    fn step(&mut self, delta: isize) -> bool {
        if self.instances.len() < 2 {
            return false;
        }
        let len = self.instances.len() as isize;
        let current = self.selected_index().map_or(0, |i| i as isize);
        let next = (current + delta).rem_euclid(len) as usize;
        let instance = self.instances[next].clone();
        self.select(instance)
    }

    /// Whether a polling task should be running
    pub fn should_poll(&self) -> bool {
        self.global || self.selected.is_some()
    }

    /// Instance parameter for the next poll; `None` means unscoped
    pub fn scope(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn instances(&self) -> &[String] {
        &self.instances
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        self.instances.iter().position(|i| i == selected)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_update(&self) -> Option<&str> {
        self.last_update.as_deref()
    }

    pub fn window(&self, kind: MetricKind) -> &RollingWindow<MetricSample> {
        match kind {
            MetricKind::Cpu => &self.cpu,
            MetricKind::Memory => &self.memory,
            MetricKind::Disk => &self.disk,
        }
    }

    /// Gauge value: mean over cores for CPU, latest `value` otherwise
    pub fn current(&self, kind: MetricKind) -> f64 {
        let Some(latest) = self.window(kind).latest() else {
            return 0.0;
        };
        match kind {
            MetricKind::Cpu => latest.core_average(),
            _ => latest.value().unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn snapshot(t: &str, cores: &[(&str, f64)], memory: f64, disk: f64) -> SystemSnapshot {
        let cpu: BTreeMap<String, f64> = cores.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        SystemSnapshot::single(t, cpu, memory, disk)
    }

    fn polled(generation: u64, snap: SystemSnapshot) -> Action {
        Action::Polled(PollOutcome {
            generation,
            result: Ok(snap),
        })
    }

    fn loaded(state: &mut DashboardState, instances: &[&str]) -> bool {
        state.apply(Action::InstancesLoaded(
            instances.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn test_first_instance_selected_on_load() {
        let mut state = DashboardState::new(120);
        assert_eq!(state.phase(), Phase::Loading);
        assert!(!state.should_poll());

        assert!(loaded(&mut state, &["a:9100", "b:9100"]));
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.selected(), Some("a:9100"));
        assert_eq!(state.scope(), Some("a:9100"));
        assert!(state.should_poll());
    }

    #[test]
    fn test_empty_instance_list_selects_nothing() {
        let mut state = DashboardState::new(120);
        assert!(!loaded(&mut state, &[]));
        assert_eq!(state.selected(), None);
        assert!(!state.should_poll());
    }

    #[test]
    fn test_reload_keeps_existing_selection() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a", "b"]);
        state.apply(Action::Select("b".to_string()));
        let generation = state.generation();

        assert!(!loaded(&mut state, &["c", "b"]));
        assert_eq!(state.selected(), Some("b"));
        assert_eq!(state.generation(), generation);
    }

    #[test]
    fn test_poll_appends_and_derives_current_values() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a"]);
        let gen = state.generation();

        state.apply(polled(gen, snapshot("10:00:00", &[("core0", 10.0), ("core1", 30.0)], 40.0, 70.5)));

        assert_eq!(state.window(MetricKind::Cpu).len(), 1);
        assert_eq!(state.current(MetricKind::Cpu), 20.0);
        assert_eq!(state.current(MetricKind::Memory), 40.0);
        assert_eq!(state.current(MetricKind::Disk), 70.5);
        assert_eq!(state.last_update(), Some("10:00:00"));
    }

    #[test]
    fn test_current_is_zero_without_samples_or_cores() {
        let mut state = DashboardState::new(120);
        for kind in MetricKind::all() {
            assert_eq!(state.current(*kind), 0.0);
        }

        loaded(&mut state, &["a"]);
        let gen = state.generation();
        state.apply(polled(gen, snapshot("t", &[], 1.0, 2.0)));
        assert_eq!(state.current(MetricKind::Cpu), 0.0);
    }

    #[test]
    fn test_windows_are_bounded() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a"]);
        let gen = state.generation();

        for i in 0..121 {
            state.apply(polled(gen, snapshot(&format!("t{}", i), &[("core0", 1.0)], 1.0, 1.0)));
        }

        for kind in MetricKind::all() {
            let window = state.window(*kind);
            assert_eq!(window.len(), 120);
            assert!(window.iter().all(|s| s.t != "t0"));
        }
    }

    #[test]
    fn test_switching_instance_resets_windows() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a", "b"]);
        let gen = state.generation();
        state.apply(polled(gen, snapshot("t", &[("core0", 1.0)], 1.0, 1.0)));

        assert!(state.apply(Action::Select("b".to_string())));
        for kind in MetricKind::all() {
            assert!(state.window(*kind).is_empty());
        }
        assert!(state.generation() > gen);
    }

    #[test]
    fn test_stale_poll_is_discarded() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a", "b"]);
        let old = state.generation();

        state.apply(Action::SelectNext);
        assert_eq!(state.selected(), Some("b"));

        // Response for "a" arrives after the switch
        state.apply(polled(old, snapshot("late", &[("core0", 99.0)], 99.0, 99.0)));
        assert!(state.window(MetricKind::Cpu).is_empty());

        state.apply(polled(state.generation(), snapshot("fresh", &[("core0", 5.0)], 5.0, 5.0)));
        assert_eq!(state.window(MetricKind::Memory).latest().map(|s| s.t.as_str()), Some("fresh"));
    }

    #[test]
    fn test_select_ignores_unknown_and_current() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a", "b"]);
        assert!(!state.apply(Action::Select("zzz".to_string())));
        assert!(!state.apply(Action::Select("a".to_string())));
        assert_eq!(state.selected(), Some("a"));
    }

    #[test]
    fn test_cycling_wraps_around() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a", "b", "c"]);

        assert!(state.apply(Action::SelectPrev));
        assert_eq!(state.selected(), Some("c"));
        assert!(state.apply(Action::SelectNext));
        assert_eq!(state.selected(), Some("a"));

        let mut single = DashboardState::new(120);
        loaded(&mut single, &["only"]);
        assert!(!single.apply(Action::SelectNext));
    }

    #[test]
    fn test_poll_failure_keeps_history_and_records_error() {
        let mut state = DashboardState::new(120);
        loaded(&mut state, &["a"]);
        let gen = state.generation();
        state.apply(polled(gen, snapshot("t", &[("core0", 1.0)], 1.0, 1.0)));

        state.apply(Action::Polled(PollOutcome {
            generation: gen,
            result: Err("HTTP 500: failed to query prometheus".to_string()),
        }));

        assert_eq!(state.window(MetricKind::Disk).len(), 1);
        assert_eq!(state.last_error(), Some("HTTP 500: failed to query prometheus"));

        state.apply(polled(gen, snapshot("t2", &[], 1.0, 1.0)));
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_global_mode_polls_unscoped() {
        let mut state = DashboardState::global(10);
        assert!(state.should_poll());
        assert_eq!(state.scope(), None);
        assert_eq!(state.phase(), Phase::Ready);

        state.apply(polled(0, snapshot("t", &[("core0", 50.0)], 1.0, 1.0)));
        assert_eq!(state.current(MetricKind::Cpu), 50.0);
    }

    #[test]
    fn test_instances_failure_is_reported() {
        let mut state = DashboardState::new(120);
        state.apply(Action::InstancesFailed("connection refused".to_string()));
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.last_error(), Some("connection refused"));
    }
}
