//! Screen state
//!
//! `KdsApp` owns everything the screen shows and reacts to four inputs:
//! key presses, feed events, write outcomes and timer ticks. It never
//! touches the terminal, so the whole flow is testable without one.

use std::sync::Arc;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kds_client::{FeedEvent, LiveFeed};
use shared::KitchenOrder;
use shared::feed::FeedQuery;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tui_logger::{TuiWidgetEvent, TuiWidgetState};

use super::render::{self, BoardViewport};
use super::{Notifier, StartGate};
use crate::core::Config;
use crate::kitchen::{
    AlertDecider, CardView, ConnectionState, OrderBoard, StatusActuator, WriteOutcome,
};

/// How long a write-failure notice stays up
pub const NOTICE_TTL_MS: i64 = 30_000;

/// Non-blocking operator notice shown in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub raised_at_ms: i64,
}

/// Receivers the runner selects on
pub struct AppChannels {
    /// Feed events tagged with the subscription generation they came from
    pub feed_rx: mpsc::UnboundedReceiver<(u64, FeedEvent)>,
    pub outcomes: mpsc::UnboundedReceiver<WriteOutcome>,
}

/// Running subscription; dropping it unsubscribes
struct FeedPump {
    generation: u64,
    cancel: CancellationToken,
}

impl Drop for FeedPump {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct KdsApp {
    station_name: String,
    collection: String,
    late_after_minutes: u64,
    feed: Arc<dyn LiveFeed>,
    feed_tx: mpsc::UnboundedSender<(u64, FeedEvent)>,
    pump: Option<FeedPump>,
    generation: u64,
    board: OrderBoard,
    gate: StartGate,
    actuator: StatusActuator,
    notifier: Box<dyn Notifier>,
    selected: usize,
    selected_id: Option<String>,
    grid_columns: usize,
    board_height: u16,
    notice: Option<Notice>,
    show_logs: bool,
    clock: DateTime<Local>,
    elapsed_at_ms: i64,
    should_quit: bool,
    /// 日志面板状态
    logger_state: TuiWidgetState,
}

impl KdsApp {
    pub fn new(
        config: &Config,
        feed: Arc<dyn LiveFeed>,
        notifier: Box<dyn Notifier>,
        now: DateTime<Local>,
    ) -> (Self, AppChannels) {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let (actuator, outcomes) = StatusActuator::new(Arc::clone(&feed), config.status_field);

        let app = Self {
            station_name: config.station_name.clone(),
            collection: config.feed_collection.clone(),
            late_after_minutes: config.late_after_minutes,
            feed,
            feed_tx,
            pump: None,
            generation: 0,
            board: OrderBoard::new(AlertDecider::new(config.freshness_window())),
            gate: StartGate::default(),
            actuator,
            notifier,
            selected: 0,
            selected_id: None,
            grid_columns: 1,
            board_height: u16::MAX,
            notice: None,
            show_logs: false,
            clock: now,
            elapsed_at_ms: now.timestamp_millis(),
            should_quit: false,
            logger_state: TuiWidgetState::new(),
        };

        (app, AppChannels { feed_rx, outcomes })
    }

    // ========== Input ==========

    pub fn handle_key(&mut self, key: KeyEvent, now: DateTime<Local>) {
        let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c || key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        if !self.gate.is_unlocked() {
            self.unlock(now);
            return;
        }

        match key.code {
            KeyCode::Esc => self.lock(),
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-(self.grid_columns as isize)),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(self.grid_columns as isize),
            KeyCode::Enter | KeyCode::Char(' ') => self.advance_selected(),
            KeyCode::Char(c @ '1'..='9') => {
                // 快捷键按屏幕上可见的卡片编号
                let slot = c as usize - '1' as usize;
                if let Some(index) = self.viewport().card_at(slot) {
                    self.advance_nth(index);
                }
            }
            KeyCode::Char('L') => self.show_logs = !self.show_logs,
            KeyCode::PageUp if self.show_logs => {
                self.logger_state.transition(TuiWidgetEvent::PrevPageKey)
            }
            KeyCode::PageDown if self.show_logs => {
                self.logger_state.transition(TuiWidgetEvent::NextPageKey)
            }
            _ => {}
        }
    }

    /// First interaction: unlock audio and start the live feed
    pub fn unlock(&mut self, now: DateTime<Local>) {
        if self.gate.unlock() {
            tracing::info!(station = %self.station_name, "Screen unlocked");
            self.notifier.play();
            self.start_feed(now);
        }
    }

    /// Back to the welcome screen; the subscription is torn down
    pub fn lock(&mut self) {
        if self.gate.lock() {
            tracing::info!("Screen locked");
            self.stop_feed();
        }
    }

    fn start_feed(&mut self, now: DateTime<Local>) {
        self.stop_feed();
        self.generation += 1;
        let generation = self.generation;

        let query = FeedQuery::today(self.collection.clone(), now);
        tracing::info!(
            collection = %query.collection,
            since = query.created_since,
            generation,
            "Subscribing to orders"
        );

        let mut subscription = self.feed.subscribe(query);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tx = self.feed_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = subscription.recv() => match event {
                        Some(event) => {
                            if tx.send((generation, event)).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!(generation, "Feed pump stopped");
        });

        self.pump = Some(FeedPump { generation, cancel });
    }

    fn stop_feed(&mut self) {
        if self.pump.take().is_some() {
            self.board.mark_disconnected();
        }
    }

    /// Tear everything down before exit
    pub fn shutdown(&mut self) {
        self.stop_feed();
    }

    // ========== Feed and writes ==========

    pub fn on_feed_event(&mut self, generation: u64, event: FeedEvent, now_ms: i64) {
        if self.pump.as_ref().map(|p| p.generation) != Some(generation) {
            tracing::debug!(generation, "Dropping event from a closed subscription");
            return;
        }

        let outcome = self.board.apply(&event, now_ms);
        if matches!(event, FeedEvent::Snapshot(_)) {
            self.refresh_elapsed(now_ms);
        }
        for _ in &outcome.alerts {
            self.notifier.play();
        }
        self.sync_selection();
    }

    pub fn on_write_outcome(&mut self, outcome: WriteOutcome, now_ms: i64) {
        match outcome {
            WriteOutcome::Applied { .. } => self.notice = None,
            WriteOutcome::Failed(failure) => {
                self.notice = Some(Notice {
                    text: format!("Update failed for {}", failure.order_number),
                    raised_at_ms: now_ms,
                });
            }
        }
    }

    // ========== Timers ==========

    /// Wall clock tick (every second)
    pub fn tick_clock(&mut self, now: DateTime<Local>) {
        self.clock = now;
        let now_ms = now.timestamp_millis();
        if self
            .notice
            .as_ref()
            .is_some_and(|n| now_ms - n.raised_at_ms >= NOTICE_TTL_MS)
        {
            self.notice = None;
        }
    }

    /// Elapsed-minutes tick; never moves backwards
    pub fn refresh_elapsed(&mut self, now_ms: i64) {
        self.elapsed_at_ms = self.elapsed_at_ms.max(now_ms);
    }

    // ========== Actions ==========

    fn advance_selected(&mut self) {
        self.advance_nth(self.selected);
    }

    fn advance_nth(&mut self, index: usize) {
        let Some(order) = self.board.orders().get(index) else {
            return;
        };
        self.selected = index;
        self.selected_id = Some(order.order_id.clone());
        // Fire and forget; the card moves when the feed says so
        let _ = self.actuator.advance(order);
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.board.orders().len();
        if len == 0 {
            return;
        }
        let target = (self.selected as isize + delta).clamp(0, len as isize - 1) as usize;
        self.selected = target;
        self.selected_id = self.board.orders().get(target).map(|o| o.order_id.clone());
    }

    /// Keep the selection on the same order across snapshots
    fn sync_selection(&mut self) {
        let orders = self.board.orders();
        if let Some(index) = self
            .selected_id
            .as_ref()
            .and_then(|id| orders.iter().position(|o| &o.order_id == id))
        {
            self.selected = index;
        } else {
            self.selected = self.selected.min(orders.len().saturating_sub(1));
        }
        self.selected_id = orders.get(self.selected).map(|o| o.order_id.clone());
    }

    // ========== View ==========

    pub fn cards(&self) -> Vec<CardView> {
        self.board
            .orders()
            .iter()
            .map(|o| CardView::build(o, self.elapsed_at_ms, self.late_after_minutes))
            .collect()
    }

    pub fn orders(&self) -> &[KitchenOrder] {
        self.board.orders()
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.board.orders().is_empty()).then_some(self.selected)
    }

    pub fn station_name(&self) -> &str {
        &self.station_name
    }

    pub fn clock_label(&self) -> String {
        self.clock.format("%H:%M").to_string()
    }

    pub fn connection(&self) -> ConnectionState {
        self.board.connection()
    }

    pub fn is_unlocked(&self) -> bool {
        self.gate.is_unlocked()
    }

    pub fn is_subscribed(&self) -> bool {
        self.pump.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn last_feed_error(&self) -> Option<&str> {
        self.board.last_error()
    }

    pub fn show_logs(&self) -> bool {
        self.show_logs
    }

    pub fn logger_state(&self) -> &TuiWidgetState {
        &self.logger_state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn grid_columns(&self) -> usize {
        self.grid_columns
    }

    /// Size of the card area, from the last terminal resize
    pub fn set_board_size(&mut self, width: u16, height: u16) {
        self.grid_columns = render::grid_columns(width);
        self.board_height = height;
    }

    /// Cards currently on screen
    pub fn viewport(&self) -> BoardViewport {
        render::board_viewport(
            &self.cards(),
            self.grid_columns,
            self.selected_index(),
            self.board_height,
        )
    }
}

impl Drop for KdsApp {
    fn drop(&mut self) {
        self.stop_feed();
    }
}
