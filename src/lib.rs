//! Token Rotator Library
//!
//! Multi-chain momentum token rotation over the 1inch aggregator.
//!
//! # Modules
//!
//! - `domain`: Core data structures (Token, RankedTokenIndex, RunState)
//! - `ports`: Trait abstractions (PriceOracle, ChainCatalog, SwapExecutor, TokenVetter)
//! - `strategy`: Momentum scoring and trading-set rules
//! - `adapters`: External implementations (1inch, paper wallet, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Chain workers and their supervisor

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
