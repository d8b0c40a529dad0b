//! Conversational dispatcher: turns Telegram updates into engine calls.
//!
//! The configuration flow walks the user through trade type, amount and
//! bank with inline keyboards, then either a user pick (counterparty
//! monitoring) or a price prompt (price monitoring). Free-text replies
//! are routed by per-chat pending-input state; invalid numbers are
//! rejected here with a re-prompt and never reach the engine.

use common::ExponentialBackoff;
use model::{SessionId, TradeSide};
use monitor_engine::{MonitorEngine, MonitorStatus};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, TelegramClient, Update,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::BotError;

/// Preset amounts offered before the Custom option.
const AMOUNT_PRESETS: &[u32] = &[
    5000, 5500, 6000, 6500, 7000, 7100, 7200, 7300, 7400, 7500, 7600, 8000,
];

const GREETING_TEXT: &str = "Hello! Use /bynick to monitor orders by user nickname or /byprice \
     to monitor orders by price. Choose one of them to start.";

/// Which monitor a configuration flow is heading towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupGoal {
    Counterparty,
    Price,
}

/// What the next free-text message from a chat means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingInput {
    CustomAmount,
    CustomBank,
    TargetPrice,
}

/// Per-chat conversation state, local to the dispatcher.
#[derive(Debug, Default, Clone, Copy)]
struct Conversation {
    goal: Option<SetupGoal>,
    awaiting: Option<PendingInput>,
}

pub struct Dispatcher {
    telegram: Arc<TelegramClient>,
    engine: Arc<MonitorEngine>,
    conversations: Mutex<HashMap<SessionId, Conversation>>,
}

impl Dispatcher {
    pub fn new(telegram: Arc<TelegramClient>, engine: Arc<MonitorEngine>) -> Self {
        Self {
            telegram,
            engine,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Long-poll for updates until shutdown. Transport errors back off
    /// exponentially and reset on the first successful poll.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), BotError> {
        let mut offset = 0i64;
        let mut backoff = ExponentialBackoff::default();

        info!("dispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }

                result = self.telegram.get_updates(offset) => match result {
                    Ok(updates) => {
                        backoff.reset();
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            self.handle_update(update).await;
                        }
                    }
                    Err(error) => {
                        let delay = backoff.next_delay();
                        warn!(
                            %error,
                            failures = backoff.failures(),
                            delay_secs = delay.as_secs_f64(),
                            "update poll failed"
                        );

                        // Wait with shutdown check
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown_rx.changed() => {
                                if *shutdown_rx.borrow() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }

        info!("dispatcher stopped");
        Ok(())
    }

    async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let id = SessionId(message.chat.id);
        let Some(text) = message.text else {
            return;
        };
        let text = text.trim();

        debug!(session = %id, text = %text, "message received");

        match text {
            "/start" => self.cmd_start(id).await,
            "/bynick" => self.begin_setup(id, SetupGoal::Counterparty).await,
            "/byprice" => self.begin_setup(id, SetupGoal::Price).await,
            "/stop" => self.cmd_stop(id).await,
            "/list" => self.cmd_list(id).await,
            "/status" => self.cmd_status(id).await,
            _ => self.handle_free_text(id, text).await,
        }
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        let Some(message) = &callback.message else {
            return;
        };
        let id = SessionId(message.chat.id);

        if let Err(error) = self.telegram.answer_callback_query(&callback.id).await {
            debug!(session = %id, %error, "failed to answer callback query");
        }

        let Some(data) = callback.data else {
            return;
        };
        let Some((kind, value)) = data.split_once(':') else {
            return;
        };

        debug!(session = %id, kind = %kind, value = %value, "callback received");

        match kind {
            "trade_type" => self.on_trade_type(id, value).await,
            "amount" => self.on_amount(id, value).await,
            "bank" => self.on_bank(id, value).await,
            "user" => self.on_user(id, value).await,
            _ => {}
        }
    }

    // --- Commands ---

    async fn cmd_start(&self, id: SessionId) {
        // Creates the session on first contact.
        self.engine.store().snapshot(id);
        self.send(id, GREETING_TEXT, None).await;
    }

    async fn cmd_stop(&self, id: SessionId) {
        self.conversations.lock().remove(&id);
        if self.engine.stop_monitor(id) {
            self.send(id, "Monitoring has been stopped.", None).await;
        } else {
            self.send(id, "No active monitoring found.", None).await;
        }
    }

    async fn cmd_list(&self, id: SessionId) {
        let filter = self.engine.store().snapshot(id).filter;
        match self.engine.current_orders(&filter).await {
            Ok(orders) if !orders.is_empty() => {
                let lines = orders
                    .iter()
                    .map(|o| format!("{} - {}", o.price, o.advertiser))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.send(id, &lines, None).await;
            }
            Ok(_) => {
                self.send(id, "No orders found.", None).await;
            }
            Err(error) => {
                warn!(session = %id, %error, "order listing failed");
                self.send(id, "Error fetching orders from Binance.", None)
                    .await;
            }
        }
    }

    async fn cmd_status(&self, id: SessionId) {
        let text = match self.engine.status(id) {
            MonitorStatus::Idle => "No active monitoring.".to_string(),
            MonitorStatus::Counterparty(nick) => format!("Monitoring orders from user {}.", nick),
            MonitorStatus::Price(limit) => format!("Monitoring for price {}.", limit),
        };
        self.send(id, &text, None).await;
    }

    // --- Configuration flow ---

    async fn begin_setup(&self, id: SessionId, goal: SetupGoal) {
        if self.engine.stop_monitor(id) {
            self.send(id, "Previous monitoring stopped.", None).await;
        }

        self.conversations.lock().insert(
            id,
            Conversation {
                goal: Some(goal),
                awaiting: None,
            },
        );

        self.send(id, "Select trade type:", Some(&trade_type_keyboard()))
            .await;
    }

    async fn on_trade_type(&self, id: SessionId, value: &str) {
        let Ok(side) = value.parse::<TradeSide>() else {
            return;
        };

        self.engine.store().mutate(id, |s| s.filter.side = side);
        self.send(id, &format!("Trade type set to: {}", side), None)
            .await;

        self.send(id, "Select amount:", Some(&amount_keyboard()))
            .await;
    }

    async fn on_amount(&self, id: SessionId, value: &str) {
        if value == "Custom" {
            self.set_awaiting(id, PendingInput::CustomAmount);
            self.send(id, "Please enter the custom amount:", None).await;
            return;
        }

        let Ok(amount) = value.parse::<Decimal>() else {
            return;
        };

        self.engine
            .store()
            .mutate(id, |s| s.filter.trans_amount = Some(amount));
        self.send(id, &format!("Amount set to: {}", amount), None)
            .await;
        self.show_banks(id).await;
    }

    async fn show_banks(&self, id: SessionId) {
        let banks = match self.engine.list_pay_methods(id).await {
            Ok(banks) => banks,
            Err(error) => {
                // Degrade to the Custom option alone; the flow continues.
                warn!(session = %id, %error, "bank listing failed");
                Vec::new()
            }
        };

        self.send(id, "Select bank:", Some(&bank_keyboard(&banks)))
            .await;
    }

    async fn on_bank(&self, id: SessionId, value: &str) {
        if value == "Custom" {
            self.set_awaiting(id, PendingInput::CustomBank);
            self.send(id, "Please enter the custom bank identifier:", None)
                .await;
            return;
        }

        self.engine
            .store()
            .mutate(id, |s| s.filter.pay_method = Some(value.to_string()));
        self.send(id, &format!("Bank set to: {}", value), None).await;
        self.advance_setup(id).await;
    }

    /// The bank step is the fork: counterparty flows pick a user next,
    /// price flows prompt for the target.
    async fn advance_setup(&self, id: SessionId) {
        let goal = self.conversations.lock().get(&id).and_then(|c| c.goal);

        match goal {
            Some(SetupGoal::Counterparty) => self.show_users(id).await,
            Some(SetupGoal::Price) => {
                self.cmd_list(id).await;
                self.set_awaiting(id, PendingInput::TargetPrice);
                self.send(id, "Please enter the target price (e.g., 41.23):", None)
                    .await;
            }
            None => {}
        }
    }

    async fn show_users(&self, id: SessionId) {
        match self.engine.list_advertisers(id, None).await {
            Ok(users) if !users.is_empty() => {
                self.send(id, "Select user:", Some(&user_keyboard(&users)))
                    .await;
            }
            Ok(_) => {
                self.send(id, "No orders found.", None).await;
            }
            Err(error) => {
                warn!(session = %id, %error, "user listing failed");
                self.send(id, "Error fetching orders from Binance.", None)
                    .await;
            }
        }
    }

    async fn on_user(&self, id: SessionId, nick: &str) {
        self.conversations.lock().remove(&id);
        self.send(id, &format!("User set to: {}", nick), None).await;

        self.engine.start_counterparty_monitor(id, nick);
        self.send(id, &format!("Monitoring started for user: {}", nick), None)
            .await;
    }

    // --- Free-text replies ---

    async fn handle_free_text(&self, id: SessionId, text: &str) {
        let awaiting = self.conversations.lock().get(&id).and_then(|c| c.awaiting);

        match awaiting {
            Some(PendingInput::CustomAmount) => match parse_decimal_input(text) {
                Some(amount) => {
                    self.clear_awaiting(id);
                    self.engine
                        .store()
                        .mutate(id, |s| s.filter.trans_amount = Some(amount));
                    self.send(id, &format!("Custom amount set to: {}", amount), None)
                        .await;
                    self.show_banks(id).await;
                }
                None => {
                    self.send(id, "Invalid amount. Please enter a number.", None)
                        .await;
                }
            },
            Some(PendingInput::CustomBank) => {
                self.clear_awaiting(id);
                self.engine
                    .store()
                    .mutate(id, |s| s.filter.pay_method = Some(text.to_string()));
                self.send(
                    id,
                    &format!("Custom bank identifier set to: {}", text),
                    None,
                )
                .await;
                self.advance_setup(id).await;
            }
            Some(PendingInput::TargetPrice) => match parse_decimal_input(text) {
                Some(price) => {
                    self.conversations.lock().remove(&id);
                    self.send(id, &format!("Price set to: {}", price), None)
                        .await;

                    self.engine.start_price_monitor(id, price);
                    self.send(
                        id,
                        &format!("Monitoring started for price: {}", price),
                        None,
                    )
                    .await;
                }
                None => {
                    self.send(id, "Invalid price. Please enter a number.", None)
                        .await;
                }
            },
            // Unprompted text outside any flow is ignored.
            None => {}
        }
    }

    // --- Helpers ---

    fn set_awaiting(&self, id: SessionId, input: PendingInput) {
        self.conversations.lock().entry(id).or_default().awaiting = Some(input);
    }

    fn clear_awaiting(&self, id: SessionId) {
        if let Some(conversation) = self.conversations.lock().get_mut(&id) {
            conversation.awaiting = None;
        }
    }

    /// Dispatcher replies are best-effort; only monitor notifications go
    /// through the retrying notifier.
    async fn send(&self, id: SessionId, text: &str, keyboard: Option<&InlineKeyboardMarkup>) {
        if let Err(error) = self.telegram.send_message(id, text, keyboard).await {
            warn!(session = %id, %error, "failed to send reply");
        }
    }
}

/// Parse a user-typed number, tolerating surrounding whitespace. `None`
/// means re-prompt; invalid input never reaches the engine.
fn parse_decimal_input(text: &str) -> Option<Decimal> {
    text.trim().parse::<Decimal>().ok()
}

fn trade_type_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column(vec![
        InlineKeyboardButton::new("BUY", "trade_type:BUY"),
        InlineKeyboardButton::new("SELL", "trade_type:SELL"),
    ])
}

fn amount_keyboard() -> InlineKeyboardMarkup {
    let mut buttons: Vec<InlineKeyboardButton> = AMOUNT_PRESETS
        .iter()
        .map(|a| InlineKeyboardButton::new(a.to_string(), format!("amount:{}", a)))
        .collect();
    buttons.push(InlineKeyboardButton::new("Custom", "amount:Custom"));
    InlineKeyboardMarkup::column(buttons)
}

fn bank_keyboard(banks: &[String]) -> InlineKeyboardMarkup {
    let mut buttons: Vec<InlineKeyboardButton> = banks
        .iter()
        .map(|b| InlineKeyboardButton::new(b.clone(), format!("bank:{}", b)))
        .collect();
    buttons.push(InlineKeyboardButton::new("Custom", "bank:Custom"));
    InlineKeyboardMarkup::column(buttons)
}

fn user_keyboard(users: &[(String, Decimal)]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column(
        users
            .iter()
            .map(|(nick, price)| {
                InlineKeyboardButton::new(format!("{} ({})", nick, price), format!("user:{}", nick))
            })
            .collect(),
    )
}
