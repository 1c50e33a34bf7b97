//! Namaa library
//!
//! Local record store and services behind the Namaa tracker: tasks, daily
//! prayers, Quran reading goals, lesson ratings, reminders, quotes, user
//! settings, backups and the focus timer.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
