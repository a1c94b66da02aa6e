use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{
    process::Command,
    spawn,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use updown_core::{
    api::ApiClient,
    config::{AppConfig, Identity},
    game::{Direction, MarketFeed, Outcome, ResolvedRound, RoundEngine, SubscriptionGate},
    models::Channel,
    sync::{Settlement, SyncEvent},
};

use crate::digits;

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    MarketTick,
    RoundTick,
}

#[derive(Clone, Copy)]
enum TickKind {
    Market,
    Round,
}

/// High-level application state for the terminal client.
pub struct UpDownApp {
    config: AppConfig,
    client: ApiClient,
    identity: Option<Identity>,
    market: MarketFeed,
    engine: RoundEngine,
    gate: SubscriptionGate,
    channel: Option<Channel>,
    balance: i64,
    wins: Option<u32>,
    loading: bool,
    status: String,
    should_quit: bool,
    sync_tx: Option<mpsc::Sender<SyncEvent>>,
    sync_rx: Option<mpsc::Receiver<SyncEvent>>,
    theme: Theme,
}

impl UpDownApp {
    pub fn new(config: AppConfig, client: ApiClient, identity: Option<Identity>) -> Self {
        let market = MarketFeed::new(&config.walk);
        let engine = RoundEngine::new(config.round.seconds);
        let loading = identity.is_some();
        let status = if loading {
            "Syncing profile…".to_string()
        } else {
            "Ready: press U or D to predict".to_string()
        };
        Self {
            config,
            client,
            identity,
            market,
            engine,
            gate: SubscriptionGate::default(),
            channel: None,
            balance: 0,
            wins: None,
            loading,
            status,
            should_quit: false,
            sync_tx: None,
            sync_rx: None,
            theme: Theme::default(),
        }
    }

    /// Wire up the channel the background sync tasks report on. The sender
    /// half is kept so round settlements can be spawned later.
    pub fn attach_sync(
        &mut self,
        sender: mpsc::Sender<SyncEvent>,
        receiver: mpsc::Receiver<SyncEvent>,
    ) {
        self.sync_tx = Some(sender);
        self.sync_rx = Some(receiver);
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        spawn_second_ticker(event_tx.clone(), TickKind::Market);
        spawn_second_ticker(event_tx.clone(), TickKind::Round);

        let mut sync_rx = self.sync_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            if sync_rx.is_some() {
                let mut sync_closed = false;
                let rx = sync_rx.as_mut().unwrap();
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_sync = rx.recv() => {
                        match maybe_sync {
                            Some(event) => self.handle_sync_event(event),
                            None => sync_closed = true,
                        }
                    }
                }
                if sync_closed {
                    sync_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                self.handle_input(event);
                true
            }
            // idle tick from the input thread; just redraw
            Some(AppEvent::Tick) => true,
            Some(AppEvent::MarketTick) => {
                self.market.tick();
                true
            }
            Some(AppEvent::RoundTick) => {
                self.handle_round_tick();
                true
            }
            None => false,
        }
    }

    fn handle_round_tick(&mut self) {
        let latest = self.market.latest();
        if let Some(resolved) = self.engine.tick(latest) {
            self.settle(resolved);
        }
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else { return };
        if self.gate.is_open() {
            self.handle_modal_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('u') | KeyCode::Up => self.press(Direction::Up),
            KeyCode::Char('d') | KeyCode::Down => self.press(Direction::Down),
            KeyCode::Char('s') => self.subscribe_action(),
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') | KeyCode::Enter => self.subscribe_action(),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.gate.dismiss();
                self.status = "Maybe later".to_string();
            }
            _ => {}
        }
    }

    fn press(&mut self, direction: Direction) {
        if self.loading {
            self.status = "Still syncing the profile…".to_string();
            return;
        }
        let start = self.market.latest();
        match self.engine.press(direction, start) {
            Some(round) => {
                info!(round = round.id, ?direction, start, "round started");
                self.status = format!(
                    "Predicting {} from {:.0}, {}s on the clock",
                    direction_label(direction),
                    start,
                    self.config.round.seconds
                );
            }
            None => {
                self.status = "A round is already running".to_string();
            }
        }
    }

    fn settle(&mut self, resolved: ResolvedRound) {
        let stake = self.config.round.stake;
        let delta = resolved.outcome.signed_stake(stake);
        // optimistic; the next bootstrap re-fetch reconciles
        self.balance += delta;
        info!(
            round = resolved.round.id,
            outcome = ?resolved.outcome,
            delta,
            end = resolved.end_value,
            "round resolved"
        );
        self.status = match resolved.outcome {
            Outcome::Win => format!("WIN  +{stake} • balance {}", self.balance),
            Outcome::Lose => format!("LOSE -{stake} • balance {}", self.balance),
        };

        let Some(identity) = self.identity.clone() else {
            return;
        };
        let Some(sender) = self.sync_tx.clone() else {
            return;
        };
        let settlement = Settlement::new(
            self.client.clone(),
            identity,
            resolved.round.id,
            resolved.outcome,
            delta,
            self.gate.is_subscribed(),
        );
        spawn(async move {
            settlement.run(sender).await;
        });
    }

    fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Channel(channel) => {
                info!(title = %channel.channel_title, "channel metadata loaded");
                self.channel = Some(channel);
            }
            SyncEvent::Subscription(subscribed) => {
                info!(subscribed, "subscription state loaded");
                self.gate.set_subscribed(subscribed);
            }
            SyncEvent::Balance(balance) => {
                self.balance = balance;
                self.loading = false;
                self.status = format!("Balance synced: {balance}");
            }
            SyncEvent::Wins(wins) => {
                self.wins = Some(wins);
                self.gate.record_wins(wins);
            }
            SyncEvent::RoundWins { round_id, wins } => {
                if self.engine.latest_round_id() != Some(round_id) {
                    debug!(round = round_id, "discarding stale wins response");
                    return;
                }
                self.wins = Some(wins);
                self.gate.record_wins(wins);
            }
            SyncEvent::Failed { context, error } => {
                warn!(context, %error, "background call failed");
                self.status = format!("{context} failed: {error}");
                if context == "balance fetch" {
                    self.loading = false;
                }
            }
        }
    }

    fn subscribe_action(&mut self) {
        let Some(link) = self
            .channel
            .as_ref()
            .and_then(|channel| channel.invite_link.clone())
        else {
            self.status = "No invite link available yet".to_string();
            return;
        };
        self.gate.subscribe_clicked();
        info!(%link, "opening invite link");
        self.status = format!("Opening {link}");
        open_external(link);
    }

    fn draw(&mut self, frame: &mut Frame) {
        if self.loading {
            self.draw_loading(frame);
            return;
        }
        self.draw_game(frame);
        if self.gate.is_open() {
            self.render_subscribe_modal(frame);
        }
    }

    fn draw_loading(&self, frame: &mut Frame) {
        let area = centered_rect(36, 5, frame.size());
        let paragraph = Paragraph::new(vec![
            Line::from("Syncing profile…"),
            Line::from(Span::styled(
                "waiting for the balance service",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("updown"))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn draw_game(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(digits::height() + 2),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, rows[0]);
        self.render_chart(frame, rows[1]);

        let bottom = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(20)])
            .split(rows[2]);
        self.render_countdown(frame, bottom[0]);
        self.render_buttons(frame, bottom[1]);

        self.render_status(frame, rows[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let wins = self
            .wins
            .map(|wins| wins.to_string())
            .unwrap_or_else(|| "-".to_string());
        let subscribed = if self.gate.is_subscribed() {
            "subscribed"
        } else {
            "unsubscribed"
        };
        let line = Line::from(vec![
            Span::styled(
                "UPDOWN",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("balance {:>6}", self.balance),
                Style::default().fg(self.theme.primary_fg),
            ),
            Span::raw("   "),
            Span::styled(
                format!("wins {wins}"),
                Style::default().fg(self.theme.primary_fg),
            ),
            Span::raw("   "),
            Span::styled(subscribed, Style::default().fg(self.theme.muted)),
        ]);
        let paragraph = Paragraph::new(vec![line]).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_chart(&self, frame: &mut Frame, area: Rect) {
        let (min, max) = self.market.band();
        let window = self.market.series().capacity().saturating_sub(1) as f64;
        let series_points = self.market.series().points();
        let start_points = self
            .engine
            .start_value()
            .map(|value| [(0.0, value), (window, value)]);
        let outcome = self.engine.last_resolved().map(|resolved| resolved.outcome);
        let end_points = self
            .engine
            .last_resolved()
            .map(|resolved| [(0.0, resolved.end_value), (window, resolved.end_value)]);

        let mut datasets = vec![Dataset::default()
            .name("price")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.theme.accent))
            .data(&series_points)];
        if let Some(points) = start_points.as_ref() {
            datasets.push(
                Dataset::default()
                    .name("open")
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.muted))
                    .data(points),
            );
        }
        if let (Some(points), Some(outcome)) = (end_points.as_ref(), outcome) {
            let color = match outcome {
                Outcome::Win => self.theme.success,
                Outcome::Lose => self.theme.danger,
            };
            datasets.push(
                Dataset::default()
                    .name("close")
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(color))
                    .data(points),
            );
        }

        // outcome tint lands on the border
        let border_style = match outcome {
            Some(Outcome::Win) => Style::default().fg(self.theme.success),
            Some(Outcome::Lose) => Style::default().fg(self.theme.danger),
            None => Style::default().fg(self.theme.muted),
        };

        let mid = (min + max) / 2.0;
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Market")
                    .border_style(border_style),
            )
            .x_axis(Axis::default().bounds([0.0, window]))
            .y_axis(Axis::default().bounds([min, max]).labels(vec![
                Span::styled(format!("{min:.0}"), Style::default().fg(self.theme.muted)),
                Span::styled(format!("{mid:.0}"), Style::default().fg(self.theme.muted)),
                Span::styled(format!("{max:.0}"), Style::default().fg(self.theme.muted)),
            ]));
        frame.render_widget(chart, area);
    }

    fn render_countdown(&self, frame: &mut Frame, area: Rect) {
        let remaining = self.engine.remaining().max(0);
        let color = if self.engine.is_running() {
            self.theme.warning
        } else {
            self.theme.muted
        };
        let content: Vec<Line> = digits::render(&remaining.to_string())
            .into_iter()
            .map(|row| {
                Line::from(Span::styled(
                    row,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        let paragraph = Paragraph::new(content)
            .block(Block::default().borders(Borders::ALL).title("Next close"))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect) {
        let stake = self.config.round.stake;
        let running = self.engine.is_running();
        let up_style = if running {
            Style::default()
                .fg(self.theme.muted)
                .add_modifier(Modifier::DIM)
        } else {
            Style::default()
                .fg(self.theme.success)
                .add_modifier(Modifier::BOLD)
        };
        let down_style = if running {
            Style::default()
                .fg(self.theme.muted)
                .add_modifier(Modifier::DIM)
        } else {
            Style::default()
                .fg(self.theme.danger)
                .add_modifier(Modifier::BOLD)
        };

        let mut lines = vec![
            Line::from(Span::styled(format!("[U] ▲ UP    ±{stake}"), up_style)),
            Line::from(Span::styled(format!("[D] ▼ DOWN  ±{stake}"), down_style)),
            Line::from(""),
        ];
        if running {
            lines.push(Line::from(Span::styled(
                "Round running, buttons locked",
                Style::default().fg(self.theme.muted),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "[S] subscribe   [Q] quit",
                Style::default().fg(self.theme.primary_fg),
            )));
        }
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Predict"));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let secondary = match (&self.identity, &self.channel) {
            (None, _) => "Demo mode: no remote sync configured".to_string(),
            (Some(identity), Some(channel)) => {
                format!("user {} • {}", identity.user_id, channel.channel_title)
            }
            (Some(identity), None) => format!("user {}", identity.user_id),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(
                secondary,
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_subscribe_modal(&self, frame: &mut Frame) {
        let frame_area = frame.size();
        let width = cmp::max(24, cmp::min(52, frame_area.width.saturating_sub(4)));
        let height = cmp::max(7, cmp::min(9, frame_area.height.saturating_sub(2)));
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let title = self
            .channel
            .as_ref()
            .map(|channel| channel.channel_title.clone())
            .unwrap_or_else(|| "Channel".to_string());
        let mut lines = vec![Line::from(Span::styled(
            title,
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        ))];
        if let Some(geo) = self.channel.as_ref().and_then(|channel| channel.geo.clone()) {
            lines.push(Line::from(Span::styled(
                geo,
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(
            "You are on a winning streak. Join the channel to keep playing.",
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("S", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" subscribe   "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" not now"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Subscribe")
                    .border_style(Style::default().fg(self.theme.accent_alt)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "UP",
        Direction::Down => "DOWN",
    }
}

fn open_external(link: String) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    spawn(async move {
        match Command::new(opener).arg(&link).status().await {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%link, %status, "link opener exited unhappily"),
            Err(err) => warn!(%link, %err, "failed to launch link opener"),
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn spawn_second_ticker(sender: mpsc::Sender<AppEvent>, kind: TickKind) {
    spawn(async move {
        let mut interval = time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let event = match kind {
                TickKind::Market => AppEvent::MarketTick,
                TickKind::Round => AppEvent::RoundTick,
            };
            if sender.send(event).await.is_err() {
                break;
            }
        }
    });
}
