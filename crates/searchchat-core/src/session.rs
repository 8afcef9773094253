use crate::config::AppConfig;
use crate::error::AgentError;
use crate::types::Message;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Per-session conversation state, held in memory for the lifetime of the
/// process. Two append-only histories are kept in step: `display` is what
/// the shell shows (greeting included), `context` is what the model sees.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: String,
    pub name: String,
    display: Vec<Message>,
    context: Vec<Message>,
    greeting_in_context: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionContext {
    /// Create a session seeded with the greeting. The greeting always shows
    /// in the display history; whether it also enters the model context is
    /// an explicit choice.
    pub fn new(name: impl Into<String>, greeting: &str, greeting_in_context: bool) -> Self {
        let now = Utc::now();
        let greeting_msg = Message::assistant(greeting);
        let context = if greeting_in_context {
            vec![greeting_msg.clone()]
        } else {
            Vec::new()
        };
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            display: vec![greeting_msg],
            context,
            greeting_in_context,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a user message to both histories.
    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::user(content))
    }

    /// Append an assistant message to both histories.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::assistant(content))
    }

    fn push(&mut self, message: Message) -> &Message {
        self.updated_at = Utc::now();
        self.context.push(message.clone());
        self.display.push(message);
        self.display.last().unwrap()
    }

    /// Everything the shell should render, greeting first.
    pub fn display(&self) -> &[Message] {
        &self.display
    }

    /// The trailing window of model context fed to the agent.
    pub fn recent_context(&self, max: usize) -> &[Message] {
        let start = self.context.len().saturating_sub(max);
        &self.context[start..]
    }

    /// Drop all history except the greeting.
    pub fn clear(&mut self) {
        self.display.truncate(1);
        self.context.clear();
        if self.greeting_in_context {
            self.context.push(self.display[0].clone());
        }
        self.updated_at = Utc::now();
    }
}

/// In-memory session registry. A default session always exists; shells may
/// create and switch between further ones.
pub struct SessionManager {
    sessions: HashMap<String, SessionContext>,
    active_id: String,
    greeting: String,
    greeting_in_context: bool,
    max_history: usize,
}

impl SessionManager {
    pub fn new(config: &AppConfig) -> Self {
        let default = SessionContext::new(
            "default",
            &config.greeting,
            config.agent.greeting_in_context,
        );
        let active_id = default.id.clone();
        let mut sessions = HashMap::new();
        sessions.insert(active_id.clone(), default);
        Self {
            sessions,
            active_id,
            greeting: config.greeting.clone(),
            greeting_in_context: config.agent.greeting_in_context,
            max_history: config.session.max_history,
        }
    }

    /// Create a new session and make it active. Returns its id.
    pub fn create(&mut self, name: impl Into<String>) -> String {
        let session = SessionContext::new(name, &self.greeting, self.greeting_in_context);
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        self.active_id = id.clone();
        id
    }

    pub fn get(&self, id: &str) -> Option<&SessionContext> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SessionContext> {
        self.sessions.get_mut(id)
    }

    pub fn active(&self) -> &SessionContext {
        // The active session is re-created on removal, so this always holds.
        &self.sessions[&self.active_id]
    }

    pub fn active_mut(&mut self) -> &mut SessionContext {
        self.sessions.get_mut(&self.active_id).unwrap()
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// Switch to an existing session by id.
    pub fn switch(&mut self, id: &str) -> Result<(), AgentError> {
        if self.sessions.contains_key(id) {
            self.active_id = id.to_string();
            Ok(())
        } else {
            Err(AgentError::Session(format!("Session not found: {}", id)))
        }
    }

    /// Remove a session. Removing the last one re-creates a default.
    pub fn remove(&mut self, id: &str) {
        self.sessions.remove(id);
        if self.active_id == id {
            match self.sessions.keys().next().cloned() {
                Some(next) => self.active_id = next,
                None => {
                    self.create("default");
                }
            }
        }
    }

    /// List sessions as (id, name, updated_at, display length), most recent
    /// first.
    pub fn list(&self) -> Vec<(&str, &str, DateTime<Utc>, usize)> {
        let mut list: Vec<_> = self
            .sessions
            .values()
            .map(|s| (s.id.as_str(), s.name.as_str(), s.updated_at, s.display().len()))
            .collect();
        list.sort_by(|a, b| b.2.cmp(&a.2));
        list
    }

    /// The model context window of the active session.
    pub fn recent_context(&self) -> Vec<Message> {
        self.active().recent_context(self.max_history).to_vec()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}
