use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use tokenchat_types::api::SendMessageRequest;
use tokenchat_types::models::{Message, Role, pair_conversation_id};

use crate::models::NewMessage;
use crate::{MessageStore, Result, StoreError, UserStore};

/// Outcome of a successful send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: Message,
    /// Sender balance after the debit. `None` for model senders, who hold no
    /// spendable balance.
    pub remaining_tokens: Option<u64>,
}

/// Token-metered send path: validates, charges client senders and records
/// the message.
#[derive(Clone)]
pub struct Ledger {
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    default_cost: u64,
}

impl Ledger {
    pub fn new(users: Arc<dyn UserStore>, messages: Arc<dyn MessageStore>, default_cost: u64) -> Self {
        Self {
            users,
            messages,
            default_cost,
        }
    }

    pub fn default_cost(&self) -> u64 {
        self.default_cost
    }

    pub fn send_message(&self, req: &SendMessageRequest) -> Result<SentMessage> {
        let (from_id, to_id, role, text) = match (
            req.from_user_id.filter(|id| *id != 0),
            req.to_user_id.filter(|id| *id != 0),
            req.sender_role.as_deref().map(str::trim).filter(|r| !r.is_empty()),
            req.text.as_deref().filter(|t| !t.trim().is_empty()),
        ) {
            (Some(from), Some(to), Some(role), Some(text)) => (from, to, role, text),
            _ => {
                return Err(StoreError::validation(
                    "fromUserId, toUserId, senderRole and text are required",
                ));
            }
        };

        let sender_role = role
            .parse::<Role>()
            .map_err(|e| StoreError::validation(e.to_string()))?;

        let sender = self.users.find_by_id(from_id)?;
        self.users.find_by_id(to_id)?;

        if sender.role != sender_role {
            return Err(StoreError::validation(format!(
                "senderRole '{}' does not match the sender's account role '{}'",
                sender_role, sender.role
            )));
        }

        let cost = self.effective_cost(req.cost.as_ref())?;

        let remaining_tokens = match sender_role {
            Role::Client if cost > 0 => {
                let remaining = self
                    .users
                    .debit_if_sufficient(from_id, cost)
                    .inspect_err(|e| {
                        if let StoreError::InsufficientTokens { balance, .. } = e {
                            warn!(user_id = from_id, balance, cost, "Send rejected: insufficient tokens");
                        }
                    })?;
                Some(remaining)
            }
            Role::Client => Some(sender.tokens),
            Role::Model => None,
        };

        let conversation_id = req
            .conversation_key()
            .unwrap_or_else(|| pair_conversation_id(from_id, to_id));

        let message = match self.messages.append(NewMessage {
            conversation_id,
            from_user_id: from_id,
            to_user_id: to_id,
            sender_role,
            text: text.to_string(),
            cost,
        }) {
            Ok(message) => message,
            Err(e) => {
                // Nothing was stored, so nothing may stay charged.
                if sender_role == Role::Client && cost > 0 {
                    match self.users.credit(from_id, cost) {
                        Ok(balance) => {
                            warn!(user_id = from_id, cost, balance, "Append failed, debit refunded")
                        }
                        Err(refund) => {
                            error!(user_id = from_id, cost, "Append failed, refund failed: {}", refund)
                        }
                    }
                }
                return Err(e);
            }
        };

        info!(
            message_id = message.id,
            from = from_id,
            to = to_id,
            cost,
            remaining = ?remaining_tokens,
            "Message sent"
        );

        Ok(SentMessage {
            message,
            remaining_tokens,
        })
    }

    /// Explicit numeric cost if one was sent, the default otherwise.
    fn effective_cost(&self, cost: Option<&Value>) -> Result<u64> {
        match cost {
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| StoreError::validation("cost must be a non-negative integer")),
            _ => Ok(self.default_cost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryMessageStore, MemoryUserStore};
    use serde_json::json;

    struct Fixture {
        users: Arc<MemoryUserStore>,
        messages: Arc<MemoryMessageStore>,
        ledger: Ledger,
        client: u64,
        model: u64,
    }

    fn fixture(start_tokens: u64) -> Fixture {
        let users = Arc::new(MemoryUserStore::new(start_tokens));
        let messages = Arc::new(MemoryMessageStore::new());
        let ledger = Ledger::new(users.clone(), messages.clone(), 1);
        let client = users.register("c1@example.com", "pw", "client").unwrap().id;
        let model = users.register("m1@example.com", "pw", "model").unwrap().id;
        Fixture {
            users,
            messages,
            ledger,
            client,
            model,
        }
    }

    fn request(from: u64, to: u64, role: &str, cost: Option<Value>) -> SendMessageRequest {
        SendMessageRequest {
            conversation_id: None,
            from_user_id: Some(from),
            to_user_id: Some(to),
            sender_role: Some(role.to_string()),
            text: Some("hi".to_string()),
            cost,
        }
    }

    fn balance(f: &Fixture, id: u64) -> u64 {
        f.users.find_by_id(id).unwrap().tokens
    }

    #[test]
    fn client_send_debits_cost() {
        let f = fixture(10);
        let sent = f
            .ledger
            .send_message(&request(f.client, f.model, "client", Some(json!(4))))
            .unwrap();

        assert_eq!(sent.remaining_tokens, Some(6));
        assert_eq!(sent.message.cost, 4);
        assert_eq!(sent.message.conversation_id, "1-2");
        assert_eq!(balance(&f, f.client), 6);
    }

    #[test]
    fn insufficient_balance_leaves_everything_unchanged() {
        let f = fixture(3);
        let err = f
            .ledger
            .send_message(&request(f.client, f.model, "client", Some(json!(5))))
            .unwrap_err();

        assert!(matches!(err, StoreError::InsufficientTokens { balance: 3, cost: 5 }));
        assert_eq!(balance(&f, f.client), 3);
        assert_eq!(f.messages.count().unwrap(), 0);
    }

    #[test]
    fn model_sends_are_free() {
        let f = fixture(10);
        let sent = f
            .ledger
            .send_message(&request(f.model, f.client, "model", Some(json!(50))))
            .unwrap();

        assert_eq!(sent.remaining_tokens, None);
        assert_eq!(sent.message.cost, 50);
        assert_eq!(balance(&f, f.model), 0);
        assert_eq!(balance(&f, f.client), 10);
    }

    #[test]
    fn missing_or_non_numeric_cost_uses_default() {
        let f = fixture(10);
        assert_eq!(f.ledger.default_cost(), 1);
        let sent = f
            .ledger
            .send_message(&request(f.client, f.model, "client", None))
            .unwrap();
        assert_eq!(sent.message.cost, 1);

        let sent = f
            .ledger
            .send_message(&request(f.client, f.model, "client", Some(json!("lots"))))
            .unwrap();
        assert_eq!(sent.message.cost, 1);
        assert_eq!(balance(&f, f.client), 8);
    }

    #[test]
    fn zero_cost_client_send_reports_balance() {
        let f = fixture(10);
        let sent = f
            .ledger
            .send_message(&request(f.client, f.model, "client", Some(json!(0))))
            .unwrap();
        assert_eq!(sent.remaining_tokens, Some(10));
    }

    #[test]
    fn negative_or_fractional_cost_is_rejected() {
        let f = fixture(10);
        for cost in [json!(-1), json!(1.5)] {
            let err = f
                .ledger
                .send_message(&request(f.client, f.model, "client", Some(cost)))
                .unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
        assert_eq!(balance(&f, f.client), 10);
    }

    #[test]
    fn validation_and_lookup_failures() {
        let f = fixture(10);

        let mut missing_text = request(f.client, f.model, "client", None);
        missing_text.text = Some(String::new());
        assert!(matches!(
            f.ledger.send_message(&missing_text),
            Err(StoreError::Validation(_))
        ));

        let mut blank_text = request(f.client, f.model, "client", None);
        blank_text.text = Some("  \n ".to_string());
        assert!(matches!(
            f.ledger.send_message(&blank_text),
            Err(StoreError::Validation(_))
        ));

        assert!(matches!(
            f.ledger.send_message(&request(f.client, f.model, "admin", None)),
            Err(StoreError::Validation(_))
        ));

        assert!(matches!(
            f.ledger.send_message(&request(f.client, 42, "client", None)),
            Err(StoreError::NotFound(_))
        ));

        // A client cannot dodge the charge by claiming to be a model.
        assert!(matches!(
            f.ledger.send_message(&request(f.client, f.model, "model", None)),
            Err(StoreError::Validation(_))
        ));

        assert_eq!(balance(&f, f.client), 10);
        assert_eq!(f.messages.count().unwrap(), 0);
    }

    #[test]
    fn explicit_conversation_id_is_kept() {
        let f = fixture(10);
        let mut req = request(f.client, f.model, "client", None);
        req.conversation_id = Some(json!("room-7"));
        let sent = f.ledger.send_message(&req).unwrap();
        assert_eq!(sent.message.conversation_id, "room-7");
        assert_eq!(f.messages.query_by_conversation("room-7").unwrap().len(), 1);
    }

    #[test]
    fn balance_drains_to_zero_then_rejects() {
        let f = fixture(100);
        for expected in (0..100).rev() {
            let sent = f
                .ledger
                .send_message(&request(f.client, f.model, "client", Some(json!(1))))
                .unwrap();
            assert_eq!(sent.remaining_tokens, Some(expected));
        }

        let err = f
            .ledger
            .send_message(&request(f.client, f.model, "client", Some(json!(1))))
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientTokens { balance: 0, .. }));
        assert_eq!(balance(&f, f.client), 0);
        assert_eq!(f.messages.count().unwrap(), 100);
    }

    /// Message store that refuses every write.
    struct BrokenMessageStore;

    impl MessageStore for BrokenMessageStore {
        fn append(&self, _new: NewMessage) -> Result<Message> {
            Err(StoreError::Poisoned("message log unavailable".into()))
        }

        fn query_by_conversation(&self, _conversation_id: &str) -> Result<Vec<Message>> {
            Ok(vec![])
        }

        fn query_by_participants(&self, _a: u64, _b: u64) -> Result<Vec<Message>> {
            Ok(vec![])
        }

        fn query_for_user(&self, _user_id: u64) -> Result<Vec<Message>> {
            Ok(vec![])
        }

        fn count(&self) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn failed_append_refunds_the_debit() {
        let users = Arc::new(MemoryUserStore::new(10));
        let ledger = Ledger::new(users.clone(), Arc::new(BrokenMessageStore), 1);
        let client = users.register("c1@example.com", "pw", "client").unwrap().id;
        let model = users.register("m1@example.com", "pw", "model").unwrap().id;

        let err = ledger
            .send_message(&request(client, model, "client", Some(json!(4))))
            .unwrap_err();

        assert!(matches!(err, StoreError::Poisoned(_)));
        assert_eq!(users.find_by_id(client).unwrap().tokens, 10);
    }

    #[test]
    fn concurrent_sends_never_overdraw() {
        let f = fixture(50);
        let successes: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..20)
                            .filter(|_| {
                                f.ledger
                                    .send_message(&request(f.client, f.model, "client", None))
                                    .is_ok()
                            })
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(successes, 50);
        assert_eq!(balance(&f, f.client), 0);
        assert_eq!(f.messages.count().unwrap(), 50);
    }
}
