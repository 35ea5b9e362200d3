//! gitcredentials lifecycle commands

pub mod commands;
