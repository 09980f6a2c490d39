/// Main TUI application

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::core::{Action, DashboardState, GatewayClient, PollOutcome};
use crate::screens::Dashboard;
use crate::utils::{DashboardSettings, DEFAULT_CLIENT_TIMEOUT};

/// What a key press asks the app to do
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Quit,
    ReloadInstances,
    Dispatch(Action),
    /// Number keys, zero-based
    SelectIndex(usize),
}

pub fn map_key(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char('r') => Some(Input::ReloadInstances),
        KeyCode::Left | KeyCode::Up | KeyCode::BackTab => Some(Input::Dispatch(Action::SelectPrev)),
        KeyCode::Right | KeyCode::Down | KeyCode::Tab => Some(Input::Dispatch(Action::SelectNext)),
        KeyCode::Char(c @ '1'..='9') => c.to_digit(10).map(|d| Input::SelectIndex(d as usize - 1)),
        _ => None,
    }
}

pub struct App {
    client: GatewayClient,
    state: DashboardState,
    dashboard: Dashboard,
    poll_interval: Duration,
    // Background tasks report back through this channel
    action_tx: UnboundedSender<Action>,
    action_rx: UnboundedReceiver<Action>,
    poll_task: Option<JoinHandle<()>>,
    should_quit: bool,
}

impl App {
    pub fn new(settings: &DashboardSettings) -> Result<Self> {
        let client = GatewayClient::new(&settings.api_url, DEFAULT_CLIENT_TIMEOUT)?;
        let state = if settings.global {
            DashboardState::global(settings.history)
        } else {
            DashboardState::new(settings.history)
        };
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        Ok(Self {
            dashboard: Dashboard::new(client.base_url()),
            client,
            state,
            poll_interval: settings.poll_interval,
            action_tx,
            action_rx,
            poll_task: None,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        if self.state.is_global() {
            self.restart_polling();
        } else {
            self.load_instances();
        }

        let result = self.run_loop(&mut terminal).await;

        self.stop_polling();

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            // Results from background tasks (non-blocking)
            while let Ok(action) = self.action_rx.try_recv() {
                self.dispatch(action);
            }

            terminal.draw(|f| self.dashboard.render(f, &self.state))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key_event) = event::read()? {
                    if key_event.kind == KeyEventKind::Press {
                        self.handle_key(key_event.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        match map_key(code) {
            Some(Input::Quit) => self.should_quit = true,
            Some(Input::ReloadInstances) => {
                if !self.state.is_global() {
                    self.load_instances();
                }
            }
            Some(Input::Dispatch(action)) => self.dispatch(action),
            Some(Input::SelectIndex(index)) => {
                if let Some(instance) = self.state.instances().get(index).cloned() {
                    self.dispatch(Action::Select(instance));
                }
            }
            None => {}
        }
    }

    fn dispatch(&mut self, action: Action) {
        if self.state.apply(action) {
            self.restart_polling();
        }
    }

    fn load_instances(&self) {
        let client = self.client.clone();
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let action = match client.list_instances().await {
                Ok(instances) => {
                    tracing::info!(count = instances.len(), "instances loaded");
                    Action::InstancesLoaded(instances)
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{:#}", e), "failed to load instances");
                    Action::InstancesFailed(format!("{:#}", e))
                }
            };
            let _ = tx.send(action);
        });
    }

    /// Replace the polling task with one bound to the current selection
    fn restart_polling(&mut self) {
        self.stop_polling();
        if !self.state.should_poll() {
            return;
        }

        let client = self.client.clone();
        let tx = self.action_tx.clone();
        let generation = self.state.generation();
        let instance = self.state.scope().map(str::to_string);
        let interval = self.poll_interval;

        tracing::debug!(generation, instance = ?instance, "starting poll loop");

        self.poll_task = Some(tokio::spawn(async move {
            loop {
                let result = client
                    .system(instance.as_deref())
                    .await
                    .map_err(|e| format!("{:#}", e));
                if let Err(e) = &result {
                    tracing::warn!(error = %e, instance = ?instance, "poll failed");
                }

                if tx.send(Action::Polled(PollOutcome { generation, result })).is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        }));
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.poll_task.take() {
            handle.abort();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(global: bool) -> DashboardSettings {
        DashboardSettings {
            api_url: "http://127.0.0.1:9/api".to_string(),
            poll_interval: Duration::from_secs(60),
            history: 5,
            global,
        }
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(map_key(KeyCode::Char('q')), Some(Input::Quit));
        assert_eq!(map_key(KeyCode::Esc), Some(Input::Quit));
        assert_eq!(map_key(KeyCode::Left), Some(Input::Dispatch(Action::SelectPrev)));
        assert_eq!(map_key(KeyCode::Right), Some(Input::Dispatch(Action::SelectNext)));
        assert_eq!(map_key(KeyCode::Char('1')), Some(Input::SelectIndex(0)));
        assert_eq!(map_key(KeyCode::Char('9')), Some(Input::SelectIndex(8)));
        assert_eq!(map_key(KeyCode::Char('0')), None);
        assert_eq!(map_key(KeyCode::Char('x')), None);
    }

    #[tokio::test]
    async fn test_selection_change_restarts_polling() {
        let mut app = App::new(&settings(false)).unwrap();
        assert!(app.poll_task.is_none());

        app.dispatch(Action::InstancesLoaded(vec!["a".to_string(), "b".to_string()]));
        assert!(app.poll_task.is_some());
        let generation = app.state.generation();

        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.state.selected(), Some("b"));
        assert!(app.state.generation() > generation);
        assert!(app.poll_task.is_some());

        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_poll_failure_reaches_state() {
        let mut app = App::new(&settings(true)).unwrap();
        app.restart_polling();

        // Port 9 is discard; the request fails and the error comes back tagged
        let action = tokio::time::timeout(Duration::from_secs(15), app.action_rx.recv())
            .await
            .unwrap()
            .unwrap();
        app.dispatch(action);
        assert!(app.state.last_error().is_some());
        assert!(app.state.window(crate::core::MetricKind::Cpu).is_empty());
    }
}
