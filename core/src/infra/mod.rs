//! Infrastructure layer - persistence, events, messages and actions

pub mod action;
pub mod db;
pub mod event;
pub mod i18n;
pub mod query;
