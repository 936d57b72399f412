// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Utogsykle: workplace activity challenges.
//!
//! This crate provides the backend API where colleagues log activities,
//! earn points, keep daily streaks and compete on company leaderboards.

pub mod authz;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use authz::Authorizer;
use clock::Clock;
use config::Config;
use db::Store;
use services::{
    ActivityService, CompanyService, CompetitionService, InvitationSender, InvitationService,
    KudosService, LeaderboardService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub activities: ActivityService,
    pub leaderboards: LeaderboardService,
    pub competitions: CompetitionService,
    pub kudos: KudosService,
    pub invitations: InvitationService,
    pub companies: CompanyService,
}

impl AppState {
    /// Wire the services over one store, clock and policy.
    pub fn new(
        config: Config,
        db: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        authorizer: Arc<dyn Authorizer>,
        sender: Arc<dyn InvitationSender>,
    ) -> Self {
        let activities = ActivityService::new(db.clone(), clock.clone(), authorizer.clone());
        let leaderboards =
            LeaderboardService::new(db.clone(), clock.clone(), config.leaderboard_limit);
        let competitions = CompetitionService::new(db.clone(), clock.clone(), authorizer.clone());
        let kudos = KudosService::new(db.clone(), clock.clone());
        let invitations = InvitationService::new(
            db.clone(),
            clock.clone(),
            authorizer.clone(),
            sender,
            chrono::Duration::days(config.invitation_ttl_days),
        );
        let companies = CompanyService::new(db.clone(), clock.clone(), authorizer);

        Self {
            config,
            db,
            clock,
            activities,
            leaderboards,
            competitions,
            kudos,
            invitations,
            companies,
        }
    }
}
