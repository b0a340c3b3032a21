//! # Teacher Marks Bot
//!
//! A Telegram bot that lets a teacher record student marks through a short
//! conversation and export every recorded mark to a spreadsheet.
//!
//! ## Features
//! - `/add_marks` walks through student name, subject, test type, practical
//!   and theoretical marks
//! - Students are registered on their first mark, keyed by name
//! - `/view_report` sends all marks as an `.xlsx` workbook
//! - Persistent storage with SQLite

/// Bot command handlers and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// The data-entry conversation state machine
pub mod dialogue;
/// Report export and the health check server
pub mod services;
/// Utility functions for validation, logging, and reply formatting
pub mod utils;
