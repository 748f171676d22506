//! Opaque pagination cursors.
//!
//! A cursor is a stack of [`PageState`] frames, one per resource kind being
//! walked. The top frame is the one the current call works on. An empty
//! cursor string means "start of the caller's kind"; an empty next-cursor
//! means the walk is finished.

use crate::error::{ConnectorError, Result};
use crate::resources::ResourceKind;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub kind: ResourceKind,
    #[serde(default)]
    pub marker: String,
}

impl PageState {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            marker: String::new(),
        }
    }

    /// The page marker, or `None` at the start of the kind.
    pub fn marker(&self) -> Option<&str> {
        if self.marker.is_empty() {
            None
        } else {
            Some(&self.marker)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStack {
    states: Vec<PageState>,
}

impl PageStack {
    pub fn new(states: Vec<PageState>) -> Self {
        Self { states }
    }

    /// Decode a cursor handed back by the orchestrator.
    ///
    /// `""` decodes to a single fresh frame for `seed`.
    pub fn decode(cursor: &str, seed: ResourceKind) -> Result<Self> {
        if cursor.is_empty() {
            return Ok(Self::new(vec![PageState::new(seed)]));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(cursor.trim())
            .map_err(|e| ConnectorError::Decode(format!("cursor is not valid base64: {e}")))?;
        let stack: PageStack = serde_json::from_slice(&bytes)
            .map_err(|e| ConnectorError::Decode(format!("cursor payload is invalid: {e}")))?;

        if stack.states.is_empty() {
            return Err(ConnectorError::Decode(
                "non-empty cursor carries no page state".to_string(),
            ));
        }
        Ok(stack)
    }

    /// Encode for the orchestrator. A fully drained stack encodes to `""`.
    pub fn encode(&self) -> Result<String> {
        if self.states.is_empty() {
            return Ok(String::new());
        }
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn current(&self) -> Option<&PageState> {
        self.states.last()
    }

    pub fn push(&mut self, state: PageState) {
        self.states.push(state);
    }

    pub fn pop(&mut self) -> Option<PageState> {
        self.states.pop()
    }

    /// Make sure the top frame belongs to `kind`, pushing a fresh one if not.
    pub fn ensure_current(&mut self, kind: ResourceKind) {
        if self.current().map(|s| s.kind) != Some(kind) {
            self.push(PageState::new(kind));
        }
    }

    /// Move the top frame forward. An absent or empty marker means the kind
    /// is exhausted and its frame is popped.
    pub fn advance(&mut self, next_marker: Option<String>) {
        match next_marker.filter(|m| !m.is_empty()) {
            Some(marker) => {
                if let Some(state) = self.states.last_mut() {
                    state.marker = marker;
                }
            }
            None => {
                self.states.pop();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_cursor_seeds_the_caller_kind() {
        let stack = PageStack::decode("", ResourceKind::Policy).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current(), Some(&PageState::new(ResourceKind::Policy)));
        assert_eq!(stack.current().unwrap().marker(), None);
    }

    #[test]
    fn empty_stack_encodes_to_empty_string() {
        assert_eq!(PageStack::default().encode().unwrap(), "");
    }

    #[test]
    fn encode_then_decode_preserves_stack() {
        let stack = PageStack::new(vec![
            PageState {
                kind: ResourceKind::Policy,
                marker: String::new(),
            },
            PageState {
                kind: ResourceKind::User,
                marker: "50".into(),
            },
        ]);
        let cursor = stack.encode().unwrap();
        assert!(!cursor.is_empty());
        assert_eq!(PageStack::decode(&cursor, ResourceKind::Role).unwrap(), stack);
    }

    #[test]
    fn advance_overwrites_or_pops() {
        let mut stack = PageStack::decode("", ResourceKind::User).unwrap();
        stack.advance(Some("10".into()));
        assert_eq!(stack.current().unwrap().marker(), Some("10"));
        stack.advance(Some(String::new()));
        assert!(stack.is_empty());
        assert_eq!(stack.encode().unwrap(), "");
    }

    #[test]
    fn ensure_current_pushes_only_on_mismatch() {
        let mut stack = PageStack::decode("", ResourceKind::Policy).unwrap();
        stack.ensure_current(ResourceKind::Policy);
        assert_eq!(stack.len(), 1);
        stack.ensure_current(ResourceKind::User);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current().unwrap().kind, ResourceKind::User);
        stack.advance(None);
        assert_eq!(stack.current().unwrap().kind, ResourceKind::Policy);
    }

    #[test]
    fn malformed_cursors_fail_to_decode() {
        for bad in ["%%%", "bm90IGpzb24", "e30"] {
            let err = PageStack::decode(bad, ResourceKind::User).unwrap_err();
            assert!(matches!(err, ConnectorError::Decode(_)), "{bad}: {err}");
        }
        // {"states":[]}
        let empty = URL_SAFE_NO_PAD.encode(br#"{"states":[]}"#);
        assert!(matches!(
            PageStack::decode(&empty, ResourceKind::User),
            Err(ConnectorError::Decode(_))
        ));
    }
}
