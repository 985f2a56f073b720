//! # opensync
//!
//! A command-line frontend for the OpenSync backend, synchronizing AI tooling artifacts
//! across the tools that consume them.
//!
//! ## Overview
//!
//! `opensync` manages five kinds of artifacts: MCP servers, skills, workflows, agents,
//! and LLM providers. Artifacts live in two pools on the backend: a discovered pool
//! (found by scanning tool config files on disk) and a registered pool (explicitly
//! added to the OpenSync registry). The CLI merges both pools into a single view,
//! lets you pick artifacts and sync targets, and dispatches sync requests so the
//! backend can write the artifacts into each target tool's configuration.
//!
//! ## Key Features
//!
//! - **Unified view**: Discovered and registered artifacts merged by name, with
//!   registered data taking precedence and sources combined
//! - **Five artifact kinds**: MCP servers, skills, workflows, agents, and LLM providers
//! - **Grouped targets**: Sync targets organized by category or native support per kind
//! - **Scoped operation**: Global scope or per-project scope with its own registry
//! - **Registry search**: Browse the public MCP registry and import servers directly
//! - **Sync reports and history**: Persistent record of what was synced and what failed
//! - **Cross-platform**: Supports Linux, macOS, and Windows with platform-specific config directories
//!
//! ## Architecture
//!
//! The library is organized into modules that handle different aspects of the sync process:
//!
//! - Backend HTTP client ([`api`])
//! - Artifact and target data model ([`model`])
//! - Pool merging and target grouping ([`reconcile`], [`catalog`])
//! - Selection tracking ([`selection`])
//! - Dispatch strategies and session orchestration ([`strategy`], [`session`])
//! - Public registry browsing ([`browse`])
//! - Configuration and persistence ([`config`], [`history`])
//! - User interface and reporting ([`report`], [`logger`])

/// HTTP client for the OpenSync backend.
///
/// Defines the [`api::Backend`] trait covering every backend operation the CLI
/// needs (fetching pools, listing targets, registry CRUD, dispatching syncs,
/// project management, registry search and import) and an [`api::HttpBackend`]
/// implementation built on a blocking reqwest client.
pub mod api;

/// Public MCP registry browsing and import.
///
/// Parses registry search responses into a uniform shape and tracks paginated
/// search sessions with monotonic tickets so stale responses are discarded.
pub mod browse;

/// Sync target grouping and availability.
///
/// Groups the targets reported by the backend for display, either by fixed
/// category (code editors, desktop apps, CLI tools) or by native support,
/// and decides which targets are selectable in the current scope.
pub mod catalog;

/// Platform-agnostic configuration directory management for opensync.
///
/// Provides utilities for locating and managing configuration files and directories
/// following platform conventions (XDG on Linux, Application Support on macOS,
/// AppData on Windows), plus the persisted CLI settings (backend URL, default
/// scope, active project).
pub mod config;

/// Command handlers backing the CLI subcommands.
pub mod handlers;

/// Dispatch history tracking and persistence.
///
/// Records every sync dispatch with metadata about the artifact kind, scope,
/// and per-target outcome counts. Maintains a rolling history of recent
/// dispatches with automatic rotation.
pub mod history;

/// Logging configuration and utilities.
///
/// Sets up dual logging to both console (configurable via `RUST_LOG` environment
/// variable) and a persistent log file in the config directory. Includes automatic
/// log rotation when files exceed size limits.
pub mod logger;

/// Core data model shared across the crate.
///
/// Artifacts, sync targets, target categories, scopes, artifact kinds, projects,
/// and per-target sync outcomes, together with their wire representations.
pub mod model;

/// Merging of discovered and registered artifact pools.
///
/// Combines the two pools into a single name-keyed list: registered entries win
/// over discovered ones, sources are unioned, and first-appearance order is
/// preserved so the merged list is stable across refreshes.
pub mod reconcile;

/// Sync report generation and formatting.
///
/// Generates reports of sync dispatches in multiple formats (JSON, Markdown,
/// console). Reports include per-target outcomes with failure details and
/// a summary of the batch, and the most recent report is persisted for the
/// `report` subcommand.
pub mod report;

/// Selection tracking for artifacts and targets.
///
/// Keeps the chosen artifact names and target keys per browsing context and
/// invalidates both sets whenever the artifact kind, scope, or active project
/// changes, so a selection never silently applies to a different context.
pub mod selection;

/// Session orchestration for the sync workflow.
///
/// Owns the current browsing context, fetches and merges the artifact pools,
/// tracks selections, and runs dispatches through the appropriate strategy.
/// Guards against re-entrant dispatches and reloads data after each one.
pub mod session;

/// Sync dispatch strategies.
///
/// The [`strategy::SyncStrategy`] trait abstracts over the two dispatch shapes:
/// a single bulk request for MCP servers (the backend fans out to the selected
/// targets) and a sequential materialize-then-push loop for item kinds (skills,
/// workflows, agents, LLM providers).
pub mod strategy;
