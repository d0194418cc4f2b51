//! Ranked Token Index
//!
//! Owns every token of one chain, ordered by `(score, id)` with O(1) lookup
//! by id. The ordered set and the lookup map always hold exactly the same ids.

use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;
use thiserror::Error;

use super::token::Token;

type RankKey = (OrderedFloat<f64>, String);

/// Structural errors: these indicate a caller bug, never a market condition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Token already indexed: {0}")]
    DuplicateId(String),

    #[error("Token not indexed: {0}")]
    NotFound(String),
}

/// Tokens of one chain ranked ascending by score, ties broken by id
#[derive(Debug, Default)]
pub struct RankedTokenIndex {
    ranking: BTreeSet<RankKey>,
    tokens: HashMap<String, Token>,
}

impl RankedTokenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(token: &Token) -> RankKey {
        (OrderedFloat(token.score), token.id().to_string())
    }

    /// Insert a new token. O(log n).
    pub fn insert(&mut self, token: Token) -> Result<(), IndexError> {
        if self.tokens.contains_key(token.id()) {
            return Err(IndexError::DuplicateId(token.id().to_string()));
        }
        self.ranking.insert(Self::key(&token));
        self.tokens.insert(token.id().to_string(), token);
        Ok(())
    }

    /// Look up a token by id. O(1).
    pub fn find(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tokens.contains_key(id)
    }

    /// Apply a price observation and reposition the token.
    ///
    /// The old rank key is removed and the new one inserted within this call,
    /// so the ordering is never observable in a half-updated state.
    pub fn update(
        &mut self,
        id: &str,
        new_score: f64,
        new_price: u128,
        new_strikes: u32,
    ) -> Result<&Token, IndexError> {
        let token = self
            .tokens
            .get_mut(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;

        self.ranking.remove(&Self::key(token));
        token.score = new_score;
        token.last_price = Some(new_price);
        token.strikes = new_strikes;
        self.ranking.insert(Self::key(token));

        Ok(&*token)
    }

    /// Record the outcome of the one-shot liquidity probe
    pub fn record_vetting(&mut self, id: &str, whitelisted: bool) -> Result<(), IndexError> {
        let token = self
            .tokens
            .get_mut(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        token.tested = true;
        token.whitelisted = whitelisted;
        Ok(())
    }

    /// Remove a token from both the ranking and the lookup
    pub fn remove(&mut self, id: &str) -> Result<Token, IndexError> {
        let token = self
            .tokens
            .remove(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        self.ranking.remove(&Self::key(&token));
        Ok(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Ids in ascending `(score, id)` order
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.ranking.iter().map(|(_, id)| id.as_str())
    }

    /// Tokens in ascending `(score, id)` order
    pub fn iter(&self) -> impl Iterator<Item = &Token> + '_ {
        self.ranking.iter().filter_map(|(_, id)| self.tokens.get(id))
    }

    /// Owned copy of the ranking, for diagnostics and tests
    pub fn sorted_snapshot(&self) -> Vec<Token> {
        self.iter().cloned().collect()
    }

    /// Dump the ranking at debug level
    pub fn log_ranking(&self) {
        let ranking: Vec<(&str, f64)> = self.iter().map(|t| (t.id(), t.score())).collect();
        tracing::debug!("Current ranking (id, score): {:?}", ranking);
    }
}
