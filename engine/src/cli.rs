//! CLI interface for Quorum
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for driving the agent pipeline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::code::DEFAULT_LANGUAGE;
use crate::config::AgentRole;

/// Quorum multi-agent orchestrator
///
/// Routes a task through router, developer, verifier and executor agents,
/// each backed by its own language-model endpoint.
#[derive(Parser, Debug)]
#[command(name = "quorum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Route a task through the agent pipeline
    Run {
        /// The task to route
        task: String,

        /// Code fence language to extract from the approved code
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        lang: String,

        /// Write the first extracted block of the approved code to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Talk to a single agent; prompts are sent in order on one conversation
    Ask {
        /// Agent to talk to
        #[arg(value_enum)]
        role: AgentRole,

        /// One or more prompts
        #[arg(required = true)]
        prompts: Vec<String>,

        /// Code fence language to extract from the last reply
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        lang: String,

        /// Write the first extracted code block to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check configuration and agent construction
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file location
    Path,

    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,
}
